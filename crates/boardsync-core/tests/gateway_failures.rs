//! Failure paths driven by a mocked gateway

use boardsync_core::{SyncConfig, SyncEngine, SyncError};
use boardsync_model::{ProjectStatus, StaticTemplates};
use boardsync_remote::{MockRemoteGateway, ParseError, RawBoard, TransportError};
use boardsync_test_utils::{init_tracing, BoardBuilder};
use mockall::Sequence;
use std::sync::Arc;

fn engine(gateway: MockRemoteGateway) -> SyncEngine {
    init_tracing();
    SyncEngine::builder(
        SyncConfig::new().with_credentials("ws-1", "token"),
        Arc::new(gateway),
        Arc::new(StaticTemplates::default()),
    )
    .build()
    .unwrap()
}

fn board() -> RawBoard {
    BoardBuilder::new("100", "Acme-123")
        .group("g1", "Infrastructure")
        .item("i1", "g1", "Provision servers", "Done")
        .build()
}

#[tokio::test]
async fn auth_failure_on_load_is_surfaced() {
    let mut gateway = MockRemoteGateway::new();
    gateway
        .expect_list_boards()
        .times(1)
        .returning(|| Err(TransportError::auth("denied")));
    let engine = engine(gateway);

    let err = engine.load(true).await.unwrap_err();

    assert!(matches!(err, SyncError::Transport(_)));
    assert!(!err.is_retryable());
    assert_eq!(
        engine.error().as_deref(),
        Some("Could not reach the workspace: denied")
    );
    assert!(engine.projects().is_empty());
    assert!(engine.snapshot().is_none());
}

#[tokio::test]
async fn malformed_payload_is_rejected_whole() {
    let mut broken = board();
    broken.state = None;
    let mut gateway = MockRemoteGateway::new();
    gateway
        .expect_list_boards()
        .times(1)
        .returning(move || Ok(vec![board(), broken.clone()]));
    let engine = engine(gateway);

    let err = engine.load(false).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Parse(ParseError::MissingField { field: "state", .. })
    ));
    assert!(engine.projects().is_empty());
}

#[tokio::test]
async fn archive_failure_changes_nothing_locally() {
    let mut gateway = MockRemoteGateway::new();
    gateway
        .expect_list_boards()
        .times(1)
        .returning(|| Ok(vec![board()]));
    gateway
        .expect_archive_board()
        .withf(|b| b.as_str() == "100")
        .times(1)
        .returning(|_| Err(TransportError::remote("insufficient permissions")));
    let engine = engine(gateway);
    let projects = engine.load(false).await.unwrap();

    let err = engine.archive_project(&projects[0].id).await.unwrap_err();

    assert!(matches!(err, SyncError::Transport(_)));
    assert!(engine.error().unwrap().contains("insufficient permissions"));
    assert_eq!(engine.projects().len(), 1);
    assert!(engine.archived_projects().is_empty());
    assert!(engine.snapshot().is_some());
}

#[tokio::test]
async fn archive_success_reloads_without_the_board() {
    let mut seq = Sequence::new();
    let mut gateway = MockRemoteGateway::new();
    gateway
        .expect_list_boards()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(vec![board()]));
    gateway
        .expect_archive_board()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    gateway
        .expect_list_boards()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| {
            let mut archived = board();
            archived.state = Some("archived".into());
            Ok(vec![archived])
        });
    let engine = engine(gateway);
    let projects = engine.load(false).await.unwrap();

    engine.archive_project(&projects[0].id).await.unwrap();

    assert!(engine.projects().is_empty());
    let archived = engine.archived_projects();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, projects[0].id);
    assert_eq!(archived[0].status, ProjectStatus::Archived);
}

#[tokio::test]
async fn failed_group_creation_leaves_the_module_local_only() {
    let mut gateway = MockRemoteGateway::new();
    gateway
        .expect_create_board()
        .times(1)
        .returning(|_| Ok(boardsync_model::RemoteId::new("900")));
    gateway.expect_create_column().times(4).returning(|_, request| {
        Ok(boardsync_model::RemoteId::new(format!("col-{}", request.title)))
    });
    gateway
        .expect_create_group()
        .times(1)
        .returning(|_, _| Err(TransportError::network("reset")));
    gateway.expect_create_item().never();
    let engine = engine(gateway);

    let project = engine
        .create_project(boardsync_core::NewProject::new("Acme").with_modules(["Infrastructure"]))
        .await
        .unwrap();

    assert_eq!(project.remote_id.as_ref().map(|r| r.as_str()), Some("900"));
    assert_eq!(project.modules[0].remote_id, None);
    assert!(!project.sync.is_error());
}
