//! The four backup/restore flows

use super::naming::{backup_filename, default_commit_message, store_path, store_prefix};
use super::{
    DocumentLocks, FileTransfer, FlowKind, FlowOutcome, FlowReport, FlowState, Session,
    VersionStore, WorkflowApi,
};
use crate::error::{Error, Result};
use crate::presenter::{NoticeKind, Presenter, Prompter, StatusKind};
use chrono::{Local, NaiveDateTime};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::future::Future;

/// Revisions offered by restore-from-store unless overridden
pub const DEFAULT_REVISION_LIMIT: usize = 20;

/// How a flow body ended, before it is reported
enum Completion {
    Done(FlowReport),
    Cancelled,
    NeedsConfiguration,
}

/// Drives backup and restore flows for one workflow.
///
/// Every flow returns a [`FlowOutcome`]; failures are reported through the
/// presenter and never escape as `Err`. Flows on the same workflow are
/// serialized through [`DocumentLocks`].
///
/// # Example
/// ```no_run
/// use logic_app_backup::client::{GitHubClient, ManagementClient};
/// use logic_app_backup::flow::{Orchestrator, Session};
/// # use logic_app_backup::page::PageContext;
/// # use logic_app_backup::storage::LocalFiles;
/// # async fn example<U>(page: PageContext, ui: U, github: Option<GitHubClient>) -> eyre::Result<()>
/// # where U: logic_app_backup::presenter::Presenter + logic_app_backup::presenter::Prompter {
/// let session = Session::initialize(&page)?;
/// let api = ManagementClient::try_new(
///     url::Url::parse("https://management.azure.com")?,
///     session.token(),
/// )?;
/// let orchestrator = Orchestrator::new(session, api, LocalFiles::new("."), ui);
///
/// let outcome = orchestrator.backup_to_store(github.as_ref()).await;
/// assert!(!outcome.is_failure());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<A, F, U> {
    session: Session,
    api: A,
    files: F,
    ui: U,
    locks: DocumentLocks,
    clock: fn() -> NaiveDateTime,
    revision_limit: usize,
}

impl<A, F, U> Orchestrator<A, F, U>
where
    A: WorkflowApi,
    F: FileTransfer,
    U: Presenter + Prompter,
{
    pub fn new(session: Session, api: A, files: F, ui: U) -> Self {
        Self {
            session,
            api,
            files,
            ui,
            locks: DocumentLocks::new(),
            clock: || Local::now().naive_local(),
            revision_limit: DEFAULT_REVISION_LIMIT,
        }
    }

    /// Share a lock table with other orchestrators
    pub fn with_locks(mut self, locks: DocumentLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Time source for file names, paths and default messages
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// How many revisions restore-from-store offers
    pub fn with_revision_limit(mut self, limit: usize) -> Self {
        self.revision_limit = limit.max(1);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Fetch the workflow and save it as `{YYYYMMDD}-{HHMM}-{name}.json`
    pub async fn backup_to_file(&self) -> FlowOutcome {
        self.run(FlowKind::BackupToFile, self.backup_to_file_steps())
            .await
    }

    /// Fetch the workflow and commit it to `apps/{name}/{YYYY-MM-DD}-workflow.json`
    pub async fn backup_to_store<S: VersionStore>(&self, store: Option<&S>) -> FlowOutcome {
        self.run(FlowKind::BackupToStore, self.backup_to_store_steps(store))
            .await
    }

    /// Parse the user's chosen file and PUT it over the workflow
    pub async fn restore_from_file(&self) -> FlowOutcome {
        self.run(FlowKind::RestoreFromFile, self.restore_from_file_steps())
            .await
    }

    /// Let the user pick a stored revision and PUT it over the workflow
    pub async fn restore_from_store<S: VersionStore>(&self, store: Option<&S>) -> FlowOutcome {
        self.run(
            FlowKind::RestoreFromStore,
            self.restore_from_store_steps(store),
        )
        .await
    }

    /// Hold the workflow's lock for the whole flow and report how it ended
    async fn run(
        &self,
        kind: FlowKind,
        steps: impl Future<Output = Result<Completion>>,
    ) -> FlowOutcome {
        let workflow = self.session.workflow();
        if self.locks.is_locked(workflow) {
            log::info!("Waiting for another flow on {} to finish", workflow);
        }
        let _guard = self.locks.acquire(workflow).await;

        log::debug!("Starting {} for {}", kind, workflow);
        self.ui.transition(kind, FlowState::Initializing);
        self.ui.status(StatusKind::Busy, kind.busy_message());

        let outcome = match steps.await {
            Ok(Completion::Done(report)) => {
                log::debug!("{} {} finished", "✓".green(), kind);
                self.ui.status(StatusKind::Ready, kind.done_message());
                self.ui.notify(NoticeKind::Success, &report.message);
                FlowOutcome::Succeeded(report)
            }
            Ok(Completion::Cancelled) => {
                log::debug!("{} cancelled", kind);
                self.ui.status(StatusKind::Ready, "Ready to backup/restore");
                FlowOutcome::Cancelled
            }
            Ok(Completion::NeedsConfiguration) => {
                log::warn!("{} needs GitHub settings", kind);
                self.ui.status(StatusKind::Ready, "GitHub not configured");
                self.ui
                    .notify(NoticeKind::Info, &Error::StoreNotConfigured.to_string());
                FlowOutcome::NeedsConfiguration
            }
            Err(e) => {
                log::debug!("{} {} failed: {:?}", "✗".red(), kind, e);
                self.ui.status(StatusKind::Error, kind.failed_message());
                self.ui.notify(
                    NoticeKind::Error,
                    &format!("{}: {}", kind.failed_message(), e),
                );
                FlowOutcome::Failed(e)
            }
        };

        self.ui.transition(kind, outcome.state());
        outcome
    }

    async fn fetch_document(&self, kind: FlowKind) -> Result<Value> {
        self.ui.transition(kind, FlowState::Fetching);
        self.api.fetch(self.session.workflow()).await
    }

    async fn replace_document(&self, kind: FlowKind, document: &Value) -> Result<()> {
        self.ui.transition(kind, FlowState::Transferring);
        self.api.replace(self.session.workflow(), document).await
    }

    async fn backup_to_file_steps(&self) -> Result<Completion> {
        let kind = FlowKind::BackupToFile;
        let workflow = self.session.workflow();
        let now = (self.clock)();

        let document = self.fetch_document(kind).await?;

        self.ui.transition(kind, FlowState::Transferring);
        let content = serde_json::to_string_pretty(&document).map_err(Error::InvalidJson)?;
        let filename = backup_filename(workflow, now);
        let saved = self.files.save(&content, &filename).await?;

        Ok(Completion::Done(
            FlowReport::new("Logic App backed up successfully!").at(saved.display().to_string()),
        ))
    }

    async fn backup_to_store_steps<S: VersionStore>(&self, store: Option<&S>) -> Result<Completion> {
        let kind = FlowKind::BackupToStore;
        let Some(store) = store else {
            return Ok(Completion::NeedsConfiguration);
        };
        let workflow = self.session.workflow();
        let now = (self.clock)();

        let document = self.fetch_document(kind).await?;

        let default_message = default_commit_message(workflow, now);
        let Some(message) = self.ui.commit_message(&default_message).await? else {
            return Ok(Completion::Cancelled);
        };
        let message = match message.trim() {
            "" => default_message,
            m => m.to_string(),
        };

        self.ui.transition(kind, FlowState::Transferring);
        let path = store_path(workflow, now);
        let prior = store.current_revision_id(&path).await?;
        match &prior {
            Some(sha) => log::debug!("Overwriting {} (currently {})", path, sha),
            None => log::debug!("Creating {}", path),
        }
        let receipt = store
            .write(&path, &document, prior.as_deref(), &message)
            .await?;

        Ok(Completion::Done(
            FlowReport::new(format!("Logic App backed up to GitHub: {}", path))
                .at(receipt.permalink),
        ))
    }

    async fn restore_from_file_steps(&self) -> Result<Completion> {
        let kind = FlowKind::RestoreFromFile;

        let Some(text) = self.files.load().await? else {
            return Ok(Completion::Cancelled);
        };

        self.ui.transition(kind, FlowState::Parsing);
        let document: Value = serde_json::from_str(&text).map_err(Error::InvalidJson)?;

        self.replace_document(kind, &document).await?;
        Ok(Completion::Done(FlowReport::new(
            "Logic App restored! Refresh the page to see changes.",
        )))
    }

    async fn restore_from_store_steps<S: VersionStore>(
        &self,
        store: Option<&S>,
    ) -> Result<Completion> {
        let kind = FlowKind::RestoreFromStore;
        let Some(store) = store else {
            return Ok(Completion::NeedsConfiguration);
        };
        let prefix = store_prefix(self.session.workflow());

        self.ui.transition(kind, FlowState::Fetching);
        let revisions = store.list_revisions(&prefix, self.revision_limit).await?;
        if revisions.is_empty() {
            return Err(Error::NoRevisions(prefix));
        }

        let picked = self.ui.pick_revision(&revisions).await?;
        let Some(revision) = picked.and_then(|i| revisions.get(i)) else {
            return Ok(Completion::Cancelled);
        };

        self.ui.transition(kind, FlowState::Parsing);
        let document = store.read_at_revision(&revision.id, &prefix).await?;

        self.replace_document(kind, &document).await?;
        Ok(Completion::Done(
            FlowReport::new(format!(
                "Logic App restored from {}! Refresh the page to see changes.",
                revision.short_id()
            ))
            .at(revision.id.clone()),
        ))
    }
}
