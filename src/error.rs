//! Error types for backup and restore flows
//!
//! Every failure a flow can end in maps onto one [`ErrorKind`]. A dismissed
//! prompt is not an error, see [`crate::flow::FlowOutcome::Cancelled`].

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], used to pick how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong page, no workflow, no token or no store configuration
    Precondition,
    /// The remote service answered with a non-success status or was unreachable
    Transport,
    /// A file or stored document is not what it claims to be
    Parse,
    /// The store answered but holds nothing matching
    NotFound,
    /// Local I/O failed
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Preconditions
    // -------------------------------------------------------------------------
    #[error("Not on Azure Portal")]
    NotOnPortal,

    #[error("Not on a Logic App page")]
    NotAWorkflowPage,

    #[error("No auth token found. Try refreshing the page.")]
    MissingToken,

    #[error("GitHub is not configured. Run `lappbak config set <token> <owner/repo>` first.")]
    StoreNotConfigured,

    #[error("Invalid repository format '{0}'. Use: owner/repo")]
    InvalidRepository(String),

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------
    #[error("API Error: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Transport {
        status: u16,
        message: Option<String>,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // -------------------------------------------------------------------------
    // Parsing and lookup
    // -------------------------------------------------------------------------
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid content encoding: {0}")]
    InvalidEncoding(String),

    #[error("No workflow file found under '{0}' in the selected revision")]
    NoWorkflowFile(String),

    #[error("No backups found for '{0}'")]
    NoRevisions(String),

    #[error("Revision '{0}' is not among the listed backups. Try a larger --limit.")]
    UnknownRevision(String),

    // -------------------------------------------------------------------------
    // Local I/O
    // -------------------------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a transport error from a status code and an optional server message
    pub fn transport(status: u16, message: Option<String>) -> Self {
        Self::Transport { status, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOnPortal
            | Self::NotAWorkflowPage
            | Self::MissingToken
            | Self::StoreNotConfigured
            | Self::InvalidRepository(_) => ErrorKind::Precondition,
            Self::Transport { .. } | Self::Request(_) | Self::Url(_) => ErrorKind::Transport,
            Self::InvalidJson(_) | Self::InvalidEncoding(_) => ErrorKind::Parse,
            Self::NoWorkflowFile(_) | Self::NoRevisions(_) | Self::UnknownRevision(_) => {
                ErrorKind::NotFound
            }
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status carried by a transport failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
