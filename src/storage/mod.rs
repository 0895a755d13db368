//! Local persistence
//!
//! This module handles everything that touches the local machine:
//! - Backup files saved to and loaded from disk
//! - The GitHub settings and their validation
//! - Session-scoped persistence of those settings

mod config;
mod files;
mod session;

pub use config::{RemoteStoreConfig, Repository};
pub use files::LocalFiles;
pub use session::SessionStore;
