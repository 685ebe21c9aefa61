//! boardsync domain model
//!
//! Entities mirrored from a board-based work-management platform:
//! - [`Project`] ↔ board, [`Module`] ↔ group, [`Task`] ↔ item,
//!   [`SubTask`] ↔ sub-item
//! - Dual identifiers ([`LocalId`] always, [`RemoteId`] once confirmed)
//! - Status mapping from raw remote text ([`map_status`])
//! - Progress aggregation ([`aggregate_progress`])
//! - Read-only module templates ([`TemplateLookup`])

#![warn(unreachable_pub)]

pub mod entities;
pub mod error;
pub mod ids;
pub mod progress;
pub mod status;
pub mod templates;

pub use entities::{Module, ModuleStatus, Project, ProjectStatus, SubTask, SyncState, Task};
pub use error::TemplateError;
pub use ids::{LocalId, RemoteId};
pub use progress::{aggregate_progress, aggregate_statuses, derive_module_status};
pub use status::{map_status, TaskStatus};
pub use templates::{
    ModuleTemplate, StaticTemplates, TaskDefinition, TemplateLookup, FALLBACK_COLOR,
    FALLBACK_KIND, FALLBACK_TEAM,
};
