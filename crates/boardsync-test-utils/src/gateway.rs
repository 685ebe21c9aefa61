//! Scripted in-memory gateway
//!
//! Behaves like a tiny remote workspace: boards, groups, items and sub-items
//! live in memory and are mutated by the gateway calls. Tests can count calls,
//! inject failures per operation and hold calls at a gate until released.
//! A held read still returns the data as it was when the call was made.

use boardsync_model::RemoteId;
use boardsync_remote::{
    ColumnKind, CreateBoard, CreateColumn, CreateGroup, CreateItem, CreateSubitem, GroupChanges,
    ItemChanges, RawBoard, RawColumnValue, RawGroup, RawGroupRef, RawItem, RawSubitem,
    RemoteGateway, SubitemChanges, TransportError,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Gateway operation, used to key counters, failures and gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ListBoards,
    GetBoard,
    CreateBoard,
    CreateColumn,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    CreateItem,
    UpdateItem,
    DeleteItem,
    CreateSubitem,
    UpdateSubitem,
    DeleteSubitem,
    ArchiveBoard,
}

/// In-memory [`RemoteGateway`] with call counting, failure injection and gates
#[derive(Debug)]
pub struct FakeGateway {
    boards: Mutex<Vec<RawBoard>>,
    columns: Mutex<Vec<(RemoteId, String, ColumnKind)>>,
    calls: DashMap<GatewayOp, usize>,
    failures: DashMap<GatewayOp, TransportError>,
    gates: DashMap<GatewayOp, Arc<Semaphore>>,
    next_id: AtomicU64,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    /// Empty workspace
    #[must_use]
    pub fn new() -> Self {
        Self {
            boards: Mutex::new(Vec::new()),
            columns: Mutex::new(Vec::new()),
            calls: DashMap::new(),
            failures: DashMap::new(),
            gates: DashMap::new(),
            next_id: AtomicU64::new(1000),
        }
    }

    /// Workspace seeded with boards
    #[must_use]
    pub fn with_boards(boards: Vec<RawBoard>) -> Self {
        let gateway = Self::new();
        *gateway.boards.lock() = boards;
        gateway
    }

    /// Add or replace a board (matched by id)
    pub fn put_board(&self, board: RawBoard) {
        let mut boards = self.boards.lock();
        match boards.iter_mut().find(|b| b.id == board.id) {
            Some(existing) => *existing = board,
            None => boards.push(board),
        }
    }

    /// Current state of a board
    #[must_use]
    pub fn board(&self, id: &str) -> Option<RawBoard> {
        self.boards
            .lock()
            .iter()
            .find(|b| b.id.as_deref() == Some(id))
            .cloned()
    }

    /// All boards
    #[must_use]
    pub fn boards(&self) -> Vec<RawBoard> {
        self.boards.lock().clone()
    }

    /// Columns created on a board, as `(title, kind)`
    #[must_use]
    pub fn columns(&self, board: &str) -> Vec<(String, ColumnKind)> {
        self.columns
            .lock()
            .iter()
            .filter(|(b, _, _)| b.as_str() == board)
            .map(|(_, title, kind)| (title.clone(), *kind))
            .collect()
    }

    /// Number of calls made to an operation (counted on entry)
    #[must_use]
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.calls.get(&op).map_or(0, |c| *c.value())
    }

    /// Make every call to `op` fail with `error` until cleared
    pub fn fail(&self, op: GatewayOp, error: TransportError) {
        self.failures.insert(op, error);
    }

    /// Stop failing `op`
    pub fn clear_failure(&self, op: GatewayOp) {
        self.failures.remove(&op);
    }

    /// Hold calls to `op` at a gate until [`release`](Self::release)
    pub fn hold(&self, op: GatewayOp) {
        self.gates.insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Let held and future calls to `op` through
    pub fn release(&self, op: GatewayOp) {
        if let Some((_, gate)) = self.gates.remove(&op) {
            gate.close();
        }
    }

    async fn enter(&self, op: GatewayOp) -> Result<(), TransportError> {
        *self.calls.entry(op).or_insert(0) += 1;

        let gate = self.gates.get(&op).map(|g| Arc::clone(g.value()));
        if let Some(gate) = gate {
            // Closed on release; the acquire error is the release signal
            let _ = gate.acquire().await;
        }

        match self.failures.get(&op) {
            Some(err) => Err(err.value().clone()),
            None => Ok(()),
        }
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn with_board<T>(
        &self,
        board: &RemoteId,
        f: impl FnOnce(&mut RawBoard) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut boards = self.boards.lock();
        let found = boards
            .iter_mut()
            .find(|b| b.id.as_deref() == Some(board.as_str()))
            .ok_or_else(|| not_found("board", board))?;
        f(found)
    }

    fn with_item<T>(
        &self,
        item: &RemoteId,
        f: impl FnOnce(&mut RawItem) -> T,
    ) -> Result<T, TransportError> {
        let mut boards = self.boards.lock();
        boards
            .iter_mut()
            .flat_map(|b| b.items.iter_mut())
            .find(|i| i.id.as_deref() == Some(item.as_str()))
            .map(f)
            .ok_or_else(|| not_found("item", item))
    }

    fn with_subitem<T>(
        &self,
        subitem: &RemoteId,
        f: impl FnOnce(&mut RawSubitem) -> T,
    ) -> Result<T, TransportError> {
        let mut boards = self.boards.lock();
        boards
            .iter_mut()
            .flat_map(|b| b.items.iter_mut())
            .flat_map(|i| i.subitems.iter_mut())
            .find(|s| s.id.as_deref() == Some(subitem.as_str()))
            .map(f)
            .ok_or_else(|| not_found("sub-item", subitem))
    }
}

fn not_found(entity: &str, id: &RemoteId) -> TransportError {
    TransportError::remote(format!("{entity} {id} not found"))
}

fn set_column(columns: &mut Vec<RawColumnValue>, kind: &str, text: String) {
    match columns.iter_mut().find(|c| c.kind.as_deref() == Some(kind)) {
        Some(column) => column.text = Some(text),
        None => columns.push(RawColumnValue::new(kind, kind, text)),
    }
}

#[async_trait::async_trait]
impl RemoteGateway for FakeGateway {
    // Reads answer with the data as of the call; a gate only delays the reply
    async fn list_boards(&self) -> Result<Vec<RawBoard>, TransportError> {
        let boards = self.boards();
        self.enter(GatewayOp::ListBoards).await?;
        Ok(boards)
    }

    async fn get_board(&self, board: &RemoteId) -> Result<RawBoard, TransportError> {
        let found = self.board(board.as_str());
        self.enter(GatewayOp::GetBoard).await?;
        found.ok_or_else(|| not_found("board", board))
    }

    async fn create_board(&self, request: &CreateBoard) -> Result<RemoteId, TransportError> {
        self.enter(GatewayOp::CreateBoard).await?;
        let id = self.allocate_id();
        self.boards.lock().push(RawBoard {
            id: Some(id.clone()),
            name: Some(request.name.clone()),
            description: request.description.clone(),
            external_ref: request.external_ref.clone(),
            state: Some("active".into()),
            groups: Vec::new(),
            items: Vec::new(),
        });
        Ok(RemoteId::new(id))
    }

    async fn create_column(
        &self,
        board: &RemoteId,
        request: &CreateColumn,
    ) -> Result<RemoteId, TransportError> {
        self.enter(GatewayOp::CreateColumn).await?;
        self.with_board(board, |_| Ok(()))?;
        self.columns
            .lock()
            .push((board.clone(), request.title.clone(), request.kind));
        Ok(RemoteId::new(self.allocate_id()))
    }

    async fn create_group(
        &self,
        board: &RemoteId,
        request: &CreateGroup,
    ) -> Result<RemoteId, TransportError> {
        self.enter(GatewayOp::CreateGroup).await?;
        let id = self.allocate_id();
        self.with_board(board, |b| {
            b.groups.push(RawGroup {
                id: Some(id.clone()),
                title: Some(request.title.clone()),
                color: request.color.clone(),
            });
            Ok(())
        })?;
        Ok(RemoteId::new(id))
    }

    async fn update_group(
        &self,
        board: &RemoteId,
        group: &RemoteId,
        changes: &GroupChanges,
    ) -> Result<(), TransportError> {
        self.enter(GatewayOp::UpdateGroup).await?;
        self.with_board(board, |b| {
            let found = b
                .groups
                .iter_mut()
                .find(|g| g.id.as_deref() == Some(group.as_str()))
                .ok_or_else(|| not_found("group", group))?;
            if let Some(title) = &changes.title {
                found.title = Some(title.clone());
            }
            if let Some(color) = &changes.color {
                found.color = Some(color.clone());
            }
            Ok(())
        })
    }

    async fn delete_group(&self, board: &RemoteId, group: &RemoteId) -> Result<(), TransportError> {
        self.enter(GatewayOp::DeleteGroup).await?;
        self.with_board(board, |b| {
            let before = b.groups.len();
            b.groups.retain(|g| g.id.as_deref() != Some(group.as_str()));
            if b.groups.len() == before {
                return Err(not_found("group", group));
            }
            b.items.retain(|i| {
                i.group.as_ref().and_then(|g| g.id.as_deref()) != Some(group.as_str())
            });
            Ok(())
        })
    }

    async fn create_item(
        &self,
        board: &RemoteId,
        group: &RemoteId,
        request: &CreateItem,
    ) -> Result<RemoteId, TransportError> {
        self.enter(GatewayOp::CreateItem).await?;
        let id = self.allocate_id();
        self.with_board(board, |b| {
            let mut column_values = vec![RawColumnValue::new(
                "status",
                "status",
                request.status_label.clone(),
            )];
            if let Some(due) = request.due_date {
                column_values.push(RawColumnValue::new("date", "date", due.to_string()));
            }
            b.items.push(RawItem {
                id: Some(id.clone()),
                name: Some(request.name.clone()),
                group: Some(RawGroupRef {
                    id: Some(group.to_string()),
                }),
                column_values,
                subitems: Vec::new(),
            });
            Ok(())
        })?;
        Ok(RemoteId::new(id))
    }

    async fn update_item(
        &self,
        board: &RemoteId,
        item: &RemoteId,
        changes: &ItemChanges,
    ) -> Result<(), TransportError> {
        self.enter(GatewayOp::UpdateItem).await?;
        self.with_board(board, |_| Ok(()))?;
        self.with_item(item, |i| {
            if let Some(name) = &changes.name {
                i.name = Some(name.clone());
            }
            if let Some(label) = &changes.status_label {
                set_column(&mut i.column_values, "status", label.clone());
            }
            if let Some(due) = &changes.due_date {
                set_column(
                    &mut i.column_values,
                    "date",
                    due.map(|d| d.to_string()).unwrap_or_default(),
                );
            }
        })
    }

    async fn delete_item(&self, item: &RemoteId) -> Result<(), TransportError> {
        self.enter(GatewayOp::DeleteItem).await?;
        let mut boards = self.boards.lock();
        for board in boards.iter_mut() {
            let before = board.items.len();
            board.items.retain(|i| i.id.as_deref() != Some(item.as_str()));
            if board.items.len() != before {
                return Ok(());
            }
        }
        Err(not_found("item", item))
    }

    async fn create_subitem(
        &self,
        parent: &RemoteId,
        request: &CreateSubitem,
    ) -> Result<RemoteId, TransportError> {
        self.enter(GatewayOp::CreateSubitem).await?;
        let id = self.allocate_id();
        self.with_item(parent, |i| {
            let mut column_values = vec![RawColumnValue::new(
                "status",
                "status",
                request.status_label.clone(),
            )];
            if let Some(person) = &request.person {
                column_values.push(RawColumnValue::new("person", "people", person.clone()));
            }
            i.subitems.push(RawSubitem {
                id: Some(id.clone()),
                name: Some(request.name.clone()),
                column_values,
            });
        })?;
        Ok(RemoteId::new(id))
    }

    async fn update_subitem(
        &self,
        subitem: &RemoteId,
        changes: &SubitemChanges,
    ) -> Result<(), TransportError> {
        self.enter(GatewayOp::UpdateSubitem).await?;
        self.with_subitem(subitem, |s| {
            if let Some(name) = &changes.name {
                s.name = Some(name.clone());
            }
            if let Some(label) = &changes.status_label {
                set_column(&mut s.column_values, "status", label.clone());
            }
            if let Some(person) = &changes.person {
                set_column(&mut s.column_values, "people", person.clone().unwrap_or_default());
            }
        })
    }

    async fn delete_subitem(&self, subitem: &RemoteId) -> Result<(), TransportError> {
        self.enter(GatewayOp::DeleteSubitem).await?;
        let mut boards = self.boards.lock();
        for item in boards.iter_mut().flat_map(|b| b.items.iter_mut()) {
            let before = item.subitems.len();
            item.subitems
                .retain(|s| s.id.as_deref() != Some(subitem.as_str()));
            if item.subitems.len() != before {
                return Ok(());
            }
        }
        Err(not_found("sub-item", subitem))
    }

    async fn archive_board(&self, board: &RemoteId) -> Result<(), TransportError> {
        self.enter(GatewayOp::ArchiveBoard).await?;
        self.with_board(board, |b| {
            b.state = Some("archived".into());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_request(name: &str) -> CreateBoard {
        CreateBoard {
            workspace_id: "ws".into(),
            name: name.into(),
            description: None,
            external_ref: None,
        }
    }

    #[tokio::test]
    async fn creates_nested_entities() {
        let gateway = FakeGateway::new();
        let board = gateway.create_board(&create_request("Acme")).await.unwrap();
        let group = gateway
            .create_group(
                &board,
                &CreateGroup {
                    title: "Infra".into(),
                    color: None,
                },
            )
            .await
            .unwrap();
        let item = gateway
            .create_item(
                &board,
                &group,
                &CreateItem {
                    name: "Provision".into(),
                    status_label: "Done".into(),
                    due_date: None,
                },
            )
            .await
            .unwrap();
        gateway
            .create_subitem(
                &item,
                &CreateSubitem {
                    name: "Racks".into(),
                    status_label: "Not Started".into(),
                    person: None,
                    due_date: None,
                },
            )
            .await
            .unwrap();

        let raw = gateway.board(board.as_str()).unwrap();
        assert_eq!(raw.groups.len(), 1);
        assert_eq!(raw.items[0].subitems.len(), 1);
        assert_eq!(gateway.calls(GatewayOp::CreateBoard), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let gateway = FakeGateway::new();
        gateway.fail(GatewayOp::ListBoards, TransportError::network("offline"));
        assert!(gateway.list_boards().await.is_err());

        gateway.clear_failure(GatewayOp::ListBoards);
        assert!(gateway.list_boards().await.is_ok());
        assert_eq!(gateway.calls(GatewayOp::ListBoards), 2);
    }

    #[tokio::test]
    async fn gate_holds_until_released() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.hold(GatewayOp::ListBoards);

        let task = tokio::spawn({
            let gateway = Arc::clone(&gateway);
            async move { gateway.list_boards().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        assert_eq!(gateway.calls(GatewayOp::ListBoards), 1);

        gateway.release(GatewayOp::ListBoards);
        assert!(task.await.unwrap().is_ok());
    }
}
