//! User-facing surface of the flows
//!
//! The orchestrator never talks to a terminal directly. It reports through a
//! [`Presenter`] and asks questions through a [`Prompter`], so the same flows
//! can be driven by the CLI or by a test harness.

use crate::client::Revision;
use crate::error::Result;
use crate::flow::{FlowKind, FlowState};
use crate::page::is_portal_url;
use std::future::Future;

/// Persistent status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    Busy,
    Error,
}

/// Transient notification style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Toolbar icon state: active only on the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconState {
    Active,
    Inactive,
}

impl IconState {
    pub fn for_url(url: &str) -> Self {
        match is_portal_url(url) {
            true => Self::Active,
            false => Self::Inactive,
        }
    }
}

impl std::fmt::Display for IconState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// Renders status changes and notifications
pub trait Presenter: Send + Sync {
    fn status(&self, kind: StatusKind, message: &str);

    fn notify(&self, kind: NoticeKind, message: &str);

    /// Called on every flow state change
    fn transition(&self, flow: FlowKind, state: FlowState) {
        log::debug!("{}: {:?}", flow, state);
    }
}

/// Cancelable questions asked mid-flow. `None` means the user dismissed the prompt.
pub trait Prompter: Send + Sync {
    /// Ask for a commit message; an empty answer means `default`
    fn commit_message(&self, default: &str)
    -> impl Future<Output = Result<Option<String>>> + Send;

    /// Ask which revision to restore, returning its index in `revisions`
    fn pick_revision(
        &self,
        revisions: &[Revision],
    ) -> impl Future<Output = Result<Option<usize>>> + Send;
}
