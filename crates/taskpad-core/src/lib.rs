//! Domain types for taskpad: tasks, their identifiers, and the ordered task list.

/// Identifier types.
pub mod id;
/// Ordered in-memory task list.
pub mod store;
/// Task entity, edit patches, and authoring rules.
pub mod task;

pub use id::{DocumentId, TaskId};
pub use store::{StoreError, TaskStore};
pub use task::{
    DATE_INPUT_MAX_CHARS, DatePatch, Task, TaskDocument, TaskUpdate, ValidationError, clip_date_input,
    normalize_date, validate_title,
};
