//! boardsync remote boundary
//!
//! - [`RemoteGateway`]: async contract implemented by the platform transport
//! - [`payload`]: raw, loosely-typed response shapes
//! - [`parse`]: strict validation into [`BoardRecord`] and friends
//! - [`TransportError`] / [`ParseError`]: what can go wrong at the boundary

#![warn(unreachable_pub)]

pub mod error;
#[allow(missing_docs)]
pub mod gateway;
#[allow(missing_docs)]
pub mod parse;
#[allow(missing_docs)]
pub mod payload;

pub use error::{ParseError, TransportError, TransportErrorKind};
pub use gateway::{
    ColumnKind, CreateBoard, CreateColumn, CreateGroup, CreateItem, CreateSubitem, GroupChanges,
    ItemChanges, RemoteGateway, SubitemChanges,
};
#[cfg(any(test, feature = "mock"))]
pub use gateway::MockRemoteGateway;
pub use parse::{
    parse_board, parse_boards, BoardRecord, BoardState, GroupRecord, ItemRecord, SubitemRecord,
    SUBITEM_BOARD_PREFIX,
};
pub use payload::{RawBoard, RawColumnValue, RawGroup, RawGroupRef, RawItem, RawSubitem};
