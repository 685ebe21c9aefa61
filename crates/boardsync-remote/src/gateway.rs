//! Remote gateway contract
//!
//! The transport (HTTP/GraphQL client, auth) lives outside this workspace.
//! [`RemoteGateway`] is the seam: the synchronization core holds an
//! `Arc<dyn RemoteGateway>` and never talks to the network directly.

use crate::error::TransportError;
use crate::payload::RawBoard;
use boardsync_model::RemoteId;
use chrono::NaiveDate;

/// Request to create a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBoard {
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Stored on the board and returned with it in listings
    pub external_ref: Option<String>,
}

/// Column type for auxiliary board columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Status,
    People,
    Date,
    Text,
}

/// Request to create a board column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateColumn {
    pub title: String,
    pub kind: ColumnKind,
}

/// Request to create a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroup {
    pub title: String,
    pub color: Option<String>,
}

/// Changes to a group; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupChanges {
    pub title: Option<String>,
    pub color: Option<String>,
}

impl GroupChanges {
    /// Whether nothing would change
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.color.is_none()
    }
}

/// Request to create an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItem {
    pub name: String,
    pub status_label: String,
    pub due_date: Option<NaiveDate>,
}

/// Changes to an item; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub status_label: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Request to create a sub-item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubitem {
    pub name: String,
    pub status_label: String,
    pub person: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Changes to a sub-item; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubitemChanges {
    pub name: Option<String>,
    pub status_label: Option<String>,
    pub person: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Remote create/read/update/delete operations on boards, groups, items and
/// sub-items
///
/// Every call either returns its payload or fails with a [`TransportError`].
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteGateway: Send + Sync {
    /// List all boards with groups, items, column values and sub-items
    async fn list_boards(&self) -> Result<Vec<RawBoard>, TransportError>;

    /// Fetch one board
    async fn get_board(&self, board: &RemoteId) -> Result<RawBoard, TransportError>;

    /// Create a board, returning its id
    async fn create_board(&self, request: &CreateBoard) -> Result<RemoteId, TransportError>;

    /// Add a column to a board, returning its id
    async fn create_column(
        &self,
        board: &RemoteId,
        request: &CreateColumn,
    ) -> Result<RemoteId, TransportError>;

    /// Create a group, returning its id
    async fn create_group(
        &self,
        board: &RemoteId,
        request: &CreateGroup,
    ) -> Result<RemoteId, TransportError>;

    /// Update a group's title or color
    async fn update_group(
        &self,
        board: &RemoteId,
        group: &RemoteId,
        changes: &GroupChanges,
    ) -> Result<(), TransportError>;

    /// Delete a group and its items
    async fn delete_group(&self, board: &RemoteId, group: &RemoteId) -> Result<(), TransportError>;

    /// Create an item in a group, returning its id
    async fn create_item(
        &self,
        board: &RemoteId,
        group: &RemoteId,
        request: &CreateItem,
    ) -> Result<RemoteId, TransportError>;

    /// Update an item
    async fn update_item(
        &self,
        board: &RemoteId,
        item: &RemoteId,
        changes: &ItemChanges,
    ) -> Result<(), TransportError>;

    /// Delete an item
    async fn delete_item(&self, item: &RemoteId) -> Result<(), TransportError>;

    /// Create a sub-item under an item, returning its id
    async fn create_subitem(
        &self,
        parent: &RemoteId,
        request: &CreateSubitem,
    ) -> Result<RemoteId, TransportError>;

    /// Update a sub-item
    async fn update_subitem(
        &self,
        subitem: &RemoteId,
        changes: &SubitemChanges,
    ) -> Result<(), TransportError>;

    /// Delete a sub-item
    async fn delete_subitem(&self, subitem: &RemoteId) -> Result<(), TransportError>;

    /// Archive a board
    async fn archive_board(&self, board: &RemoteId) -> Result<(), TransportError>;
}
