//! Flow identities, states and outcomes

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    BackupToFile,
    BackupToStore,
    RestoreFromFile,
    RestoreFromStore,
}

impl FlowKind {
    pub fn is_backup(&self) -> bool {
        matches!(self, Self::BackupToFile | Self::BackupToStore)
    }

    /// Status line while the flow runs
    pub fn busy_message(&self) -> &'static str {
        match self.is_backup() {
            true => "Backing up...",
            false => "Restoring...",
        }
    }

    /// Status line after success
    pub fn done_message(&self) -> &'static str {
        match self.is_backup() {
            true => "Backup completed!",
            false => "Restore completed!",
        }
    }

    /// Status line and notification prefix after failure
    pub fn failed_message(&self) -> &'static str {
        match self.is_backup() {
            true => "Backup failed",
            false => "Restore failed",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BackupToFile => "backup-to-file",
            Self::BackupToStore => "backup-to-store",
            Self::RestoreFromFile => "restore-from-file",
            Self::RestoreFromStore => "restore-from-store",
        };
        write!(f, "{}", name)
    }
}

/// `Idle → Initializing → {Fetching | Parsing} → Transferring → {Succeeded | Failed}`,
/// with `Cancelled` reachable from any user prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Initializing,
    Fetching,
    Parsing,
    Transferring,
    Succeeded,
    Failed,
    Cancelled,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// What a successful flow produced
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport {
    /// Notification text
    pub message: String,
    /// Saved file path or commit permalink, when there is one
    pub location: Option<String>,
}

impl FlowReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Terminal result of one flow invocation
#[derive(Debug)]
pub enum FlowOutcome {
    Succeeded(FlowReport),
    /// The user dismissed a prompt or picked no file; nothing was changed
    Cancelled,
    /// A store flow ran without GitHub settings
    NeedsConfiguration,
    Failed(Error),
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn state(&self) -> FlowState {
        match self {
            Self::Succeeded(_) => FlowState::Succeeded,
            Self::Failed(_) => FlowState::Failed,
            Self::Cancelled | Self::NeedsConfiguration => FlowState::Cancelled,
        }
    }
}
