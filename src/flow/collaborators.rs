//! Seams between the orchestrator and the outside world

use crate::client::{GitHubClient, ManagementClient, Revision, WriteReceipt};
use crate::error::Result;
use crate::page::WorkflowRef;
use crate::storage::LocalFiles;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;

/// Reads and replaces workflow definitions
pub trait WorkflowApi: Send + Sync {
    /// Fetch the full definition, connections and parameters included
    fn fetch(&self, workflow: &WorkflowRef) -> impl Future<Output = Result<Value>> + Send;

    /// Replace the remote definition with `document`
    fn replace(
        &self,
        workflow: &WorkflowRef,
        document: &Value,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Versioned storage for backups
pub trait VersionStore: Send + Sync {
    /// Revision id of the file at `path`, `None` when no file exists there
    fn current_revision_id(&self, path: &str)
    -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write `document` to `path`; `prior` must be the current revision id when one exists
    fn write(
        &self,
        path: &str,
        document: &Value,
        prior: Option<&str>,
        message: &str,
    ) -> impl Future<Output = Result<WriteReceipt>> + Send;

    /// Revisions touching `prefix`, newest first, at most `limit`
    fn list_revisions(
        &self,
        prefix: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Revision>>> + Send;

    /// The JSON document stored under `prefix` as of `revision`
    fn read_at_revision(
        &self,
        revision: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// User-driven file save and load
pub trait FileTransfer: Send + Sync {
    fn save(&self, content: &str, filename: &str) -> impl Future<Output = Result<PathBuf>> + Send;

    /// Raw text of the chosen file, `None` if the user chose nothing
    fn load(&self) -> impl Future<Output = Result<Option<String>>> + Send;
}

impl WorkflowApi for ManagementClient {
    fn fetch(&self, workflow: &WorkflowRef) -> impl Future<Output = Result<Value>> + Send {
        ManagementClient::fetch(self, workflow)
    }

    fn replace(
        &self,
        workflow: &WorkflowRef,
        document: &Value,
    ) -> impl Future<Output = Result<()>> + Send {
        ManagementClient::replace(self, workflow, document)
    }
}

impl VersionStore for GitHubClient {
    fn current_revision_id(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        GitHubClient::current_revision_id(self, path)
    }

    fn write(
        &self,
        path: &str,
        document: &Value,
        prior: Option<&str>,
        message: &str,
    ) -> impl Future<Output = Result<WriteReceipt>> + Send {
        GitHubClient::write(self, path, document, prior, message)
    }

    fn list_revisions(
        &self,
        prefix: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Revision>>> + Send {
        GitHubClient::list_revisions(self, prefix, limit)
    }

    fn read_at_revision(
        &self,
        revision: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Value>> + Send {
        GitHubClient::read_at_revision(self, revision, prefix)
    }
}

impl FileTransfer for LocalFiles {
    async fn save(&self, content: &str, filename: &str) -> Result<PathBuf> {
        LocalFiles::save(self, content, filename)
    }

    async fn load(&self) -> Result<Option<String>> {
        LocalFiles::load(self)
    }
}
