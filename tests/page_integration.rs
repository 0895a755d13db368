//! Integration tests for reading a portal page and its preconditions

mod common;

use common::{PORTAL_URL, TOKEN_KEY};
use logic_app_backup::cli::{self, BackupOptions, RestoreOptions};
use logic_app_backup::error::ErrorKind;
use logic_app_backup::page::PageContext;
use logic_app_backup::presenter::IconState;
use logic_app_backup::storage::SessionStore;
use logic_app_backup::{Error, FlowOutcome, Session, WorkflowRef};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn write_dump(dir: &Path, dump: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("session.json");
    std::fs::write(&path, dump.to_string()).unwrap();
    path
}

#[test]
fn test_session_from_storage_dump() {
    let temp = TempDir::new().unwrap();
    let dump = write_dump(
        temp.path(),
        json!({
            "portal-settings": {"theme": "dark"},
            "msal.token.keys": "[\"a\",\"b\"]",
            TOKEN_KEY: json!({"credentialType": "AccessToken", "secret": "eyJhbGciOi.abc.def"}).to_string(),
        }),
    );

    let page = cli::load_page_context(PORTAL_URL, Some(&dump)).unwrap();
    assert_eq!(page.storage().len(), 3);
    assert_eq!(page.storage().key(2), Some(TOKEN_KEY));

    let session = Session::initialize(&page).unwrap();
    assert_eq!(session.workflow(), &WorkflowRef::new("abc", "rg1", "wf1"));
    assert_eq!(session.token().secret(), "eyJhbGciOi.abc.def");
    assert!(!format!("{:?}", session).contains("eyJhbGciOi"));
}

#[test]
fn test_preconditions_checked_in_order() {
    let temp = TempDir::new().unwrap();
    let empty = write_dump(temp.path(), json!({}));

    let elsewhere = cli::load_page_context("https://github.com/owner/repo", Some(&empty)).unwrap();
    assert!(matches!(
        Session::initialize(&elsewhere),
        Err(Error::NotOnPortal)
    ));

    let home = cli::load_page_context("https://portal.azure.com/#home", Some(&empty)).unwrap();
    assert!(matches!(
        Session::initialize(&home),
        Err(Error::NotAWorkflowPage)
    ));

    let no_token = cli::load_page_context(PORTAL_URL, None).unwrap();
    let error = Session::initialize(&no_token).unwrap_err();
    assert!(matches!(error, Error::MissingToken));
    assert_eq!(error.kind(), ErrorKind::Precondition);
    assert_eq!(
        error.to_string(),
        "No auth token found. Try refreshing the page."
    );
}

#[test]
fn test_malformed_dump_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.json");
    std::fs::write(&path, "[1, 2]").unwrap();

    assert!(PageContext::from_dump(PORTAL_URL, &path).is_err());
    assert!(cli::load_page_context(PORTAL_URL, Some(&temp.path().join("missing.json"))).is_err());
}

#[test]
fn test_icon_follows_page() {
    assert_eq!(IconState::for_url(PORTAL_URL), IconState::Active);
    assert_eq!(
        IconState::for_url("https://portal.azure.com.evil.example/"),
        IconState::Inactive
    );
}

#[tokio::test]
async fn test_commands_stop_at_unmet_precondition() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::at(temp.path());
    let page = cli::load_page_context("https://portal.azure.com/#home", None).unwrap();

    let backup = cli::backup(
        &page,
        BackupOptions {
            output_dir: temp.path().to_path_buf(),
            ..Default::default()
        },
        &store,
    )
    .await
    .unwrap();
    assert!(matches!(
        backup,
        FlowOutcome::Failed(Error::NotAWorkflowPage)
    ));

    let restore = cli::restore(&page, RestoreOptions::default(), &store)
        .await
        .unwrap();
    assert!(matches!(
        restore,
        FlowOutcome::Failed(Error::NotAWorkflowPage)
    ));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}
