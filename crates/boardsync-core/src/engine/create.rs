//! Optimistic project creation and the remote push helpers it shares with
//! the mutations

use super::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::reconcile::IdAssignments;
use crate::requests::NewProject;
use boardsync_model::{Module, Project, RemoteId, SubTask, SyncState, Task};
use boardsync_remote::{
    ColumnKind, CreateBoard, CreateColumn, CreateGroup, CreateItem, CreateSubitem, TransportError,
};

/// Columns added to every new board
const AUXILIARY_COLUMNS: [(&str, ColumnKind); 4] = [
    ("Status", ColumnKind::Status),
    ("Owner", ColumnKind::People),
    ("Due date", ColumnKind::Date),
    ("External reference", ColumnKind::Text),
];

impl SyncEngine {
    /// Create a project optimistically
    ///
    /// The project (with template-seeded modules, tasks and sub-tasks) is
    /// visible as `Syncing` before the first remote call. The board is then
    /// created, followed by its auxiliary columns, groups, items and
    /// sub-items, in that order. A failed nested call is logged and leaves
    /// that entity local-only; a failed board creation leaves the whole
    /// project local-only in `Error` state.
    ///
    /// # Errors
    /// `InvalidInput` for a blank name. Remote failures are reported through
    /// the project's sync state instead.
    pub async fn create_project(&self, request: NewProject) -> SyncResult<Project> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SyncError::InvalidInput("project name must not be empty".into()));
        }

        let modules = request
            .modules
            .iter()
            .map(|m| self.module_from_template(m))
            .collect();
        let mut project = Project::new(name, self.now())
            .with_description(request.description.clone())
            .with_external_ref(request.external_ref.clone())
            .with_modules(modules);
        project.sync = SyncState::Syncing;
        let id = project.id.clone();

        self.inner.store.update(|projects| {
            projects.push(project.clone());
            Ok(())
        })?;
        tracing::info!(
            project = %id,
            name = %project.name,
            modules = project.modules.len(),
            "project created locally"
        );

        let workspace_id = match self.inner.config.require_credentials() {
            Ok(credentials) => credentials.workspace_id.to_string(),
            Err(e) => return Ok(self.fail_creation(project, &SyncError::from(e)).await),
        };
        let board_request = CreateBoard {
            workspace_id,
            name: project.name.clone(),
            description: project.description.clone(),
            external_ref: project.external_ref.clone(),
        };
        let board = match self.inner.gateway.create_board(&board_request).await {
            Ok(board) => board,
            Err(e) => return Ok(self.fail_creation(project, &SyncError::from(e)).await),
        };

        // Attach the board right away so refreshes match the pending project
        let mut ids = IdAssignments::new();
        ids.record(&id, board.clone());
        let attached = self.inner.store.update_project(&id, self.now(), |p| {
            ids.apply(p);
            Ok(())
        });
        if attached.is_err() {
            tracing::warn!(project = %id, board = %board, "project removed during creation");
        }

        self.create_auxiliary_columns(&board).await;
        for module in &project.modules {
            if let Err(e) = self.push_module(&board, module, &mut ids).await {
                tracing::warn!(
                    project = %id,
                    module = %module.id,
                    error = %e,
                    "group creation failed; module kept local-only"
                );
            }
        }

        self.settle(&id, &ids, Ok(()), "create project");
        tracing::info!(project = %id, board = %board, confirmed = ids.len(), "project synced");
        self.persist_quietly().await;

        Ok(self.project(&id).unwrap_or_else(|| {
            ids.apply(&mut project);
            project.sync = SyncState::Synced;
            project
        }))
    }

    async fn fail_creation(&self, mut project: Project, err: &SyncError) -> Project {
        tracing::warn!(
            project = %project.id,
            error = %err,
            "board creation failed; project kept local-only"
        );
        let state = SyncState::error(err.to_string());
        let id = project.id.clone();
        let marked = self.inner.store.update_project(&id, self.now(), |p| {
            p.sync = state.clone();
            Ok(())
        });
        if marked.is_err() {
            tracing::debug!(project = %id, "project removed before creation failed");
        }
        self.persist_quietly().await;

        self.project(&id).unwrap_or_else(|| {
            project.sync = state;
            project
        })
    }

    async fn create_auxiliary_columns(&self, board: &RemoteId) {
        for (title, kind) in AUXILIARY_COLUMNS {
            let request = CreateColumn {
                title: title.to_string(),
                kind,
            };
            if let Err(e) = self.inner.gateway.create_column(board, &request).await {
                tracing::warn!(board = %board, column = title, error = %e, "column creation failed");
            }
        }
    }

    pub(super) fn module_from_template(&self, name: &str) -> Module {
        let template = self.inner.templates.find_by_name(name);
        if template.is_none() {
            tracing::debug!(module = name, "no template; using fallbacks");
        }
        Module::from_template(name, template.as_ref())
    }

    /// Create a group for `module`, then its items and sub-items
    ///
    /// Only the group creation failure is returned; nested failures are
    /// logged and leave those entities local-only.
    pub(super) async fn push_module(
        &self,
        board: &RemoteId,
        module: &Module,
        ids: &mut IdAssignments,
    ) -> Result<RemoteId, TransportError> {
        let request = CreateGroup {
            title: module.name.clone(),
            color: Some(module.color.clone()),
        };
        let group = self.inner.gateway.create_group(board, &request).await?;
        ids.record(&module.id, group.clone());

        for task in &module.tasks {
            if let Err(e) = self.push_task(board, &group, task, ids).await {
                tracing::warn!(task = %task.id, error = %e, "item creation failed; task kept local-only");
            }
        }
        Ok(group)
    }

    /// Create an item for `task`, then its sub-items
    pub(super) async fn push_task(
        &self,
        board: &RemoteId,
        group: &RemoteId,
        task: &Task,
        ids: &mut IdAssignments,
    ) -> Result<RemoteId, TransportError> {
        let request = CreateItem {
            name: task.name.clone(),
            status_label: task.status.remote_label().to_string(),
            due_date: task.due_date,
        };
        let item = self.inner.gateway.create_item(board, group, &request).await?;
        ids.record(&task.id, item.clone());

        for subtask in &task.subtasks {
            if let Err(e) = self.push_subtask(&item, subtask, ids).await {
                tracing::warn!(
                    subtask = %subtask.id,
                    error = %e,
                    "sub-item creation failed; sub-task kept local-only"
                );
            }
        }
        Ok(item)
    }

    /// Create a sub-item for `subtask`
    pub(super) async fn push_subtask(
        &self,
        item: &RemoteId,
        subtask: &SubTask,
        ids: &mut IdAssignments,
    ) -> Result<RemoteId, TransportError> {
        let request = CreateSubitem {
            name: subtask.name.clone(),
            status_label: subtask.status.remote_label().to_string(),
            person: subtask.assigned_person.clone(),
            due_date: subtask.due_date,
        };
        let subitem = self.inner.gateway.create_subitem(item, &request).await?;
        ids.record(&subtask.id, subitem.clone());
        Ok(subitem)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::engine_with;
    use super::*;
    use boardsync_test_utils::{FakeGateway, GatewayOp};
    use boardsync_model::LocalId;
    use std::sync::Arc;

    /// Local id of every entity in `project`, in tree order
    fn local_ids(project: &Project) -> Vec<LocalId> {
        let mut ids = vec![project.id.clone()];
        for module in &project.modules {
            ids.push(module.id.clone());
            for task in &module.tasks {
                ids.push(task.id.clone());
                ids.extend(task.subtasks.iter().map(|s| s.id.clone()));
            }
        }
        ids
    }

    #[tokio::test]
    async fn creates_columns_groups_items_and_subitems() {
        let gateway = Arc::new(FakeGateway::new());
        let engine = engine_with(gateway.clone());

        let project = engine
            .create_project(NewProject::new("Acme").with_modules(["Infrastructure", "Training"]))
            .await
            .unwrap();

        assert_eq!(project.sync, SyncState::Synced);
        assert_eq!(gateway.calls(GatewayOp::CreateBoard), 1);
        assert_eq!(gateway.calls(GatewayOp::CreateColumn), 4);
        assert_eq!(gateway.calls(GatewayOp::CreateGroup), 2);
        assert_eq!(gateway.calls(GatewayOp::CreateItem), 4);
        assert_eq!(gateway.calls(GatewayOp::CreateSubitem), 2);

        let board = project.remote_id.clone().unwrap();
        let kinds: Vec<_> = gateway
            .columns(board.as_str())
            .into_iter()
            .map(|(_, kind)| kind)
            .collect();
        assert_eq!(
            kinds,
            vec![ColumnKind::Status, ColumnKind::People, ColumnKind::Date, ColumnKind::Text]
        );

        let confirmed = project.modules[1].tasks[0].subtasks[0].remote_id.is_some();
        assert!(confirmed);
    }

    #[tokio::test]
    async fn local_ids_survive_confirmation() {
        let gateway = Arc::new(FakeGateway::new());
        let engine = engine_with(gateway.clone());
        gateway.hold(GatewayOp::CreateBoard);

        let task = tokio::spawn({
            let engine = engine.clone();
            async move {
                engine
                    .create_project(NewProject::new("Acme").with_modules(["Training"]))
                    .await
            }
        });
        while engine.projects().is_empty() {
            tokio::task::yield_now().await;
        }
        let before = local_ids(&engine.projects()[0]);

        gateway.release(GatewayOp::CreateBoard);
        let project = task.await.unwrap().unwrap();

        assert_eq!(local_ids(&project), before);
    }

    #[tokio::test]
    async fn nested_failure_leaves_entity_local_only() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.fail(GatewayOp::CreateSubitem, TransportError::network("reset"));
        let engine = engine_with(gateway.clone());

        let project = engine
            .create_project(NewProject::new("Acme").with_modules(["Training"]))
            .await
            .unwrap();

        assert_eq!(project.sync, SyncState::Synced);
        let task = &project.modules[0].tasks[0];
        assert!(task.remote_id.is_some());
        assert!(task.subtasks.iter().all(|s| s.remote_id.is_none()));
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_any_change() {
        let gateway = Arc::new(FakeGateway::new());
        let engine = engine_with(gateway.clone());

        let result = engine.create_project(NewProject::new("   ")).await;

        assert!(matches!(result, Err(SyncError::InvalidInput(_))));
        assert!(engine.projects().is_empty());
        assert_eq!(gateway.calls(GatewayOp::CreateBoard), 0);
    }
}
