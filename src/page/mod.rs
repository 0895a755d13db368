//! Azure Portal page inspection
//!
//! Reads the two pieces of state the flows need out of a portal tab: the
//! Logic App the tab is showing ([`WorkflowRef`]) and the management API
//! bearer token cached in the tab's session storage ([`SessionToken`]).
//! Both lookups return `Option`: a page without either is normal, not an error.

mod context;
mod token;
mod workflow_ref;

pub use context::{PageContext, SessionStorage, is_portal_url};
pub use token::{SessionToken, extract_session_token};
pub use workflow_ref::{WorkflowRef, extract_workflow_ref};
