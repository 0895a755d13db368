//! Backup and restore orchestration
//!
//! A [`Session`] proves the page preconditions hold. An [`Orchestrator`]
//! built on it runs the four flows against pluggable collaborators
//! ([`WorkflowApi`], [`VersionStore`], [`FileTransfer`]) and reports every
//! step through the [`crate::presenter`] traits.

mod collaborators;
mod locks;
mod naming;
mod orchestrator;
mod session;
mod state;

pub use collaborators::{FileTransfer, VersionStore, WorkflowApi};
pub use locks::DocumentLocks;
pub use naming::{backup_filename, default_commit_message, store_path, store_prefix};
pub use orchestrator::{DEFAULT_REVISION_LIMIT, Orchestrator};
pub use session::Session;
pub use state::{FlowKind, FlowOutcome, FlowReport, FlowState};
