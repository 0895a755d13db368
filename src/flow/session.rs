//! Page preconditions shared by every flow

use crate::error::{Error, Result};
use crate::page::{PageContext, SessionToken, WorkflowRef};

/// The workflow and token read from a portal tab.
///
/// Only obtainable through [`Session::initialize`], so holding one means all
/// page preconditions passed.
#[derive(Debug, Clone)]
pub struct Session {
    workflow: WorkflowRef,
    token: SessionToken,
}

impl Session {
    /// Check, in order: the tab is on the portal, it shows a Logic App, and
    /// a management API token is cached. The first unmet check is the error.
    pub fn initialize(page: &PageContext) -> Result<Self> {
        if !page.is_portal() {
            return Err(Error::NotOnPortal);
        }
        let workflow = page.workflow_ref().ok_or(Error::NotAWorkflowPage)?;
        let token = page.session_token().ok_or(Error::MissingToken)?;
        log::debug!("Session ready for {}", workflow);
        Ok(Self { workflow, token })
    }

    pub fn workflow(&self) -> &WorkflowRef {
        &self.workflow
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}
