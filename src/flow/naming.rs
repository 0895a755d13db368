//! File names and repository paths for backups

use crate::page::WorkflowRef;
use chrono::NaiveDateTime;

/// `{YYYYMMDD}-{HHMM}-{workflowName}.json`
pub fn backup_filename(workflow: &WorkflowRef, now: NaiveDateTime) -> String {
    format!("{}-{}.json", now.format("%Y%m%d-%H%M"), workflow.workflow_name)
}

/// Repository directory holding every backup of a workflow
pub fn store_prefix(workflow: &WorkflowRef) -> String {
    format!("apps/{}", workflow.workflow_name)
}

/// `apps/{workflowName}/{YYYY-MM-DD}-workflow.json`, one file per day
pub fn store_path(workflow: &WorkflowRef, now: NaiveDateTime) -> String {
    format!(
        "{}/{}-workflow.json",
        store_prefix(workflow),
        now.format("%Y-%m-%d")
    )
}

pub fn default_commit_message(workflow: &WorkflowRef, now: NaiveDateTime) -> String {
    format!(
        "Backup {} ({})",
        workflow.workflow_name,
        now.format("%Y-%m-%d %H:%M")
    )
}
