//! Optimistic project creation

mod common;

use boardsync_core::{NewProject, SyncEngine};
use boardsync_model::{ModuleStatus, ProjectStatus, SyncState};
use boardsync_remote::{ColumnKind, TransportError};
use boardsync_test_utils::{sample_templates, GatewayOp};
use common::{wait_until, Harness};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn acme() -> NewProject {
    NewProject::new("Acme-123")
        .with_external_ref("Acme-123")
        .with_modules(["Infrastructure"])
}

#[tokio::test]
async fn project_is_visible_as_syncing_before_confirmation() {
    let h = Harness::new(Vec::new());
    h.engine.load(true).await.unwrap();
    h.gateway.hold(GatewayOp::CreateBoard);

    let engine = h.engine.clone();
    let create = tokio::spawn(async move { engine.create_project(acme()).await });
    wait_until(|| !h.engine.projects().is_empty()).await;

    let pending = h.engine.projects()[0].clone();
    assert_eq!(pending.sync, SyncState::Syncing);
    assert_eq!(pending.remote_id, None);
    assert_eq!(pending.name, "Acme-123");
    let cached = h.engine.snapshot().unwrap().projects();
    assert_eq!(cached[0].id, pending.id);

    h.gateway.release(GatewayOp::CreateBoard);
    let created = create.await.unwrap().unwrap();

    assert_eq!(created.id, pending.id);
    assert_eq!(created.sync, SyncState::Synced);
    assert!(created.remote_id.is_some());
    assert_eq!(h.engine.project(&pending.id).unwrap(), created);
}

#[tokio::test]
async fn board_failure_keeps_the_project_with_an_error() {
    let h = Harness::new(Vec::new());
    h.gateway
        .fail(GatewayOp::CreateBoard, TransportError::auth("token expired"));

    let project = h.engine.create_project(acme()).await.unwrap();

    let message = project.sync.error_message().unwrap();
    assert!(message.contains("token expired"), "{message}");
    assert_eq!(project.remote_id, None);
    assert_eq!(h.engine.projects().len(), 1);
    assert_eq!(h.engine.projects()[0], project);
    assert!(h.engine.error().is_none());
    assert_eq!(h.gateway.calls(GatewayOp::CreateGroup), 0);
}

#[tokio::test]
async fn missing_credentials_mark_the_project_failed() {
    let h = Harness::with_config(Vec::new(), boardsync_core::SyncConfig::new());

    let project = h.engine.create_project(acme()).await.unwrap();

    assert!(project.sync.is_error());
    assert_eq!(h.gateway.calls(GatewayOp::CreateBoard), 0);
}

#[tokio::test]
async fn acme_end_to_end() {
    let h = Harness::new(Vec::new());

    let project = h.engine.create_project(acme()).await.unwrap();

    assert_eq!(project.modules.len(), 1);
    let module = &project.modules[0];
    assert_eq!(module.name, "Infrastructure");
    assert_eq!(module.team, "Platform");
    assert_eq!(module.tasks.len(), 3);
    assert_eq!(module.status, ModuleStatus::NotStarted);
    assert_eq!(project.sync, SyncState::Synced);
    assert_eq!(project.progress, 0);
    assert_eq!(project.status, ProjectStatus::NotStarted);
    assert_eq!(project.external_ref.as_deref(), Some("Acme-123"));

    let board = h
        .gateway
        .board(project.remote_id.as_ref().unwrap().as_str())
        .unwrap();
    assert_eq!(board.groups.len(), 1);
    assert_eq!(board.items.len(), 3);
    assert!(module.tasks.iter().all(|t| t.remote_id.is_some()));

    let columns = h.gateway.columns(project.remote_id.as_ref().unwrap().as_str());
    assert!(columns.contains(&("External reference".to_string(), ColumnKind::Text)));
}

#[tokio::test]
async fn refresh_during_creation_keeps_the_pending_project() {
    let h = Harness::new(Vec::new());
    h.engine.load(true).await.unwrap();
    h.gateway.hold(GatewayOp::CreateGroup);

    let engine = h.engine.clone();
    let create = tokio::spawn(async move { engine.create_project(acme()).await });
    wait_until(|| h.gateway.calls(GatewayOp::CreateGroup) == 1).await;

    let pending = h.engine.projects()[0].clone();
    assert!(pending.remote_id.is_some());
    h.engine.force_sync().await.unwrap();
    assert_eq!(h.engine.projects()[0], pending);

    h.gateway.release(GatewayOp::CreateGroup);
    let created = create.await.unwrap().unwrap();
    assert_eq!(created.sync, SyncState::Synced);

    let projects = h.engine.force_sync().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, created.id);
    assert_eq!(projects[0].modules[0].id, created.modules[0].id);
    assert_eq!(
        projects[0].modules[0].tasks[2].id,
        created.modules[0].tasks[2].id
    );
    assert_eq!(projects[0].external_ref.as_deref(), Some("Acme-123"));
}

#[tokio::test]
async fn modules_without_templates_use_fallbacks() {
    let h = Harness::new(Vec::new());

    let project = h
        .engine
        .create_project(NewProject::new("Globex").with_modules(["Custom work"]))
        .await
        .unwrap();

    let module = &project.modules[0];
    assert_eq!(module.kind, boardsync_model::FALLBACK_KIND);
    assert_eq!(module.color, boardsync_model::FALLBACK_COLOR);
    assert!(module.tasks.is_empty());
    assert!(module.remote_id.is_some());
}

#[tokio::test]
async fn external_reference_is_read_back_from_the_board() {
    let h = Harness::new(Vec::new());
    let created = h
        .engine
        .create_project(NewProject::new("Initech").with_external_ref("SF-42"))
        .await
        .unwrap();
    let board = created.remote_id.clone().unwrap();
    assert_eq!(
        h.gateway.board(board.as_str()).unwrap().external_ref.as_deref(),
        Some("SF-42")
    );

    let other = SyncEngine::builder(
        common::config(),
        h.gateway.clone(),
        Arc::new(sample_templates()),
    )
    .build()
    .unwrap();
    let projects = other.load(true).await.unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].remote_id, Some(board));
    assert_eq!(projects[0].external_ref.as_deref(), Some("SF-42"));
}
