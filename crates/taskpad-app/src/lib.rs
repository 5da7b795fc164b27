//! Application layer for taskpad.
//!
//! This crate ties the task list to the authoring form, carries payloads
//! between the two screens, and saves new tasks to a document collection.

pub mod bridge;
pub mod config;
pub mod form;
pub mod persistence;
pub mod session;

// Re-exports for convenience
pub use bridge::{Screen, ScreenBridge, ScreenParams};
pub use config::{DEFAULT_COLLECTION, PersistenceConfig, ProjectConfig};
pub use form::{CREATE_HEADING, EDIT_HEADING, FormMode, FormOutcome, FormState, TaskFormController};
pub use persistence::{
    DocumentCollection, FailureFeed, MemoryCollection, PersistenceError, PersistenceFailure, PersistenceGateway,
};
pub use session::{SessionError, Submission, TodoSession};
