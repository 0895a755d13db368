//! Logic App Backup
//!
//! Back up Azure Logic App workflow definitions to local files or a GitHub
//! repository, and restore them, straight from an Azure Portal session.

pub mod cli;
pub mod client;
pub mod error;
pub mod flow;
pub mod page;
pub mod presenter;
pub mod storage;

// Re-exports for convenience
pub use client::{Auth, GitHubClient, ManagementClient};
pub use error::{Error, ErrorKind};
pub use flow::{FlowOutcome, Orchestrator, Session};
pub use page::{PageContext, SessionToken, WorkflowRef};
pub use storage::{LocalFiles, RemoteStoreConfig, SessionStore};
