//! Project archival

use super::SyncEngine;
use crate::error::{EntityKind, SyncError, SyncResult};
use boardsync_model::LocalId;

impl SyncEngine {
    /// Archive a project
    ///
    /// Remote-first: the board is archived before anything changes locally.
    /// On success the project moves to the archived set, the cache is
    /// invalidated and projects are reloaded. A local-only project is
    /// archived locally without a remote call.
    ///
    /// # Errors
    /// - `NotFound` for an unknown project
    /// - Configuration and transport errors of the archive call (nothing
    ///   changes locally) or of the reload; both are recorded as the global
    ///   error
    pub async fn archive_project(&self, id: &LocalId) -> SyncResult<()> {
        let project = self
            .project(id)
            .ok_or_else(|| SyncError::not_found(EntityKind::Project, id))?;

        let Some(board) = project.remote_id else {
            self.inner.store.archive(id, self.now())?;
            tracing::info!(project = %id, "local-only project archived");
            self.persist_quietly().await;
            return Ok(());
        };

        self.inner
            .config
            .require_credentials()
            .map_err(|e| self.surface(e.into()))?;
        self.inner
            .gateway
            .archive_board(&board)
            .await
            .map_err(|e| self.surface(e.into()))?;

        self.inner.store.archive(id, self.now())?;
        tracing::info!(project = %id, board = %board, "project archived");
        self.invalidate();
        self.load(false).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::engine_with;
    use super::*;
    use crate::requests::NewProject;
    use boardsync_model::ProjectStatus;
    use boardsync_test_utils::{FakeGateway, GatewayOp};
    use std::sync::Arc;

    #[tokio::test]
    async fn local_only_project_is_archived_locally() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.fail(
            GatewayOp::CreateBoard,
            boardsync_remote::TransportError::network("offline"),
        );
        let engine = engine_with(gateway.clone());
        let project = engine.create_project(NewProject::new("Draft")).await.unwrap();

        engine.archive_project(&project.id).await.unwrap();

        assert!(engine.projects().is_empty());
        let archived = engine.archived_projects();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].status, ProjectStatus::Archived);
        assert_eq!(gateway.calls(GatewayOp::ArchiveBoard), 0);
    }
}
