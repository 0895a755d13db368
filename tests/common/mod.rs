//! In-memory collaborators for driving flows without a network

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use logic_app_backup::client::{
    Revision, TreeEntry, WriteReceipt, decode_content, encode_content, find_workflow_path,
};
use logic_app_backup::error::{Error, Result};
use logic_app_backup::flow::{FlowKind, FlowState, Session, VersionStore, WorkflowApi};
use logic_app_backup::page::{PageContext, SessionStorage, WorkflowRef};
use logic_app_backup::presenter::{NoticeKind, Presenter, Prompter, StatusKind};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const PORTAL_URL: &str = "https://portal.azure.com/.../id/%2Fsubscriptions%2Fabc%2Fresourcegroups%2Frg1%2Fproviders%2FMicrosoft.Logic%2Fworkflows%2Fwf1";

pub const TOKEN_KEY: &str =
    "00000-msal-accesstoken-00000-https://management.core.windows.net//user_impersonation";

/// 2024-03-07 09:05
pub fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(9, 5, 0)
        .unwrap()
}

pub fn portal_storage() -> SessionStorage {
    [
        ("unrelated", "x".to_string()),
        (TOKEN_KEY, json!({"secret": "eyJ0eXAiOiJKV1QifQ"}).to_string()),
    ]
    .into_iter()
    .collect()
}

pub fn session() -> Session {
    Session::initialize(&PageContext::new(PORTAL_URL, portal_storage())).unwrap()
}

pub fn workflow_document() -> Value {
    json!({
        "id": "/subscriptions/abc/resourceGroups/rg1/providers/Microsoft.Logic/workflows/wf1",
        "name": "wf1",
        "type": "Microsoft.Logic/workflows",
        "location": "westeurope",
        "properties": {
            "state": "Enabled",
            "definition": {
                "$schema": "https://schema.management.azure.com/providers/Microsoft.Logic/schemas/2016-06-01/workflowdefinition.json#",
                "triggers": {"manual": {"type": "Request", "kind": "Http"}},
                "actions": {"Response": {"type": "Response", "inputs": {"statusCode": 200}}}
            },
            "parameters": {"$connections": {"value": {}}}
        }
    })
}

/// Management API stand-in recording every call
#[derive(Default)]
pub struct FakeApi {
    pub document: Value,
    pub fetch_status: Option<u16>,
    pub replace_status: Option<u16>,
    pub events: Mutex<Vec<String>>,
    pub replaced: Mutex<Vec<Value>>,
}

impl FakeApi {
    pub fn with_document(document: Value) -> Self {
        Self {
            document,
            ..Default::default()
        }
    }

    pub fn fetch_fails(mut self, status: u16) -> Self {
        self.fetch_status = Some(status);
        self
    }

    pub fn replace_fails(mut self, status: u16) -> Self {
        self.replace_status = Some(status);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn replaced(&self) -> Vec<Value> {
        self.replaced.lock().unwrap().clone()
    }
}

impl WorkflowApi for &FakeApi {
    async fn fetch(&self, workflow: &WorkflowRef) -> Result<Value> {
        self.events.lock().unwrap().push(format!("fetch-start {}", workflow.workflow_name));
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(format!("fetch-end {}", workflow.workflow_name));
        match self.fetch_status {
            Some(status) => Err(Error::transport(status, None)),
            None => Ok(self.document.clone()),
        }
    }

    async fn replace(&self, workflow: &WorkflowRef, document: &Value) -> Result<()> {
        self.events.lock().unwrap().push(format!("replace-start {}", workflow.workflow_name));
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(format!("replace-end {}", workflow.workflow_name));
        if let Some(status) = self.replace_status {
            return Err(Error::transport(status, Some("InvalidTemplate".to_string())));
        }
        self.replaced.lock().unwrap().push(document.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    pub path: String,
    pub prior: Option<String>,
    pub message: String,
}

struct Commit {
    id: String,
    message: String,
    /// path -> (blob sha, base64 content)
    files: BTreeMap<String, (String, String)>,
    touched: Vec<String>,
}

/// Version store kept in memory, with GitHub's overwrite rule
#[derive(Default)]
pub struct MemoryStore {
    commits: Mutex<Vec<Commit>>,
    pub writes: Mutex<Vec<WriteCall>>,
    pub lookups: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    /// Commit a raw file, bypassing `write`
    pub fn seed_raw(&self, path: &str, content: &str, message: &str) {
        let mut commits = self.commits.lock().unwrap();
        let mut files = commits.last().map(|c| c.files.clone()).unwrap_or_default();
        let n = commits.len() + 1;
        files.insert(path.to_string(), (format!("blob{n}"), content.to_string()));
        commits.push(Commit {
            id: format!("{:040x}", n),
            message: message.to_string(),
            files,
            touched: vec![path.to_string()],
        });
    }

    fn head_file(&self, path: &str) -> Option<String> {
        let commits = self.commits.lock().unwrap();
        commits
            .last()
            .and_then(|c| c.files.get(path))
            .map(|(sha, _)| sha.clone())
    }
}

impl VersionStore for MemoryStore {
    async fn current_revision_id(&self, path: &str) -> Result<Option<String>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.head_file(path))
    }

    async fn write(
        &self,
        path: &str,
        document: &Value,
        prior: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt> {
        self.writes.lock().unwrap().push(WriteCall {
            path: path.to_string(),
            prior: prior.map(str::to_string),
            message: message.to_string(),
        });

        let current = self.head_file(path);
        if current.as_deref() != prior {
            return Err(Error::transport(
                422,
                Some("\"sha\" wasn't supplied.".to_string()),
            ));
        }

        self.seed_raw(path, &encode_content(document)?, message);
        let commits = self.commits.lock().unwrap();
        let id = commits.last().unwrap().id.clone();
        Ok(WriteReceipt {
            permalink: format!("https://github.com/octo/backups/blob/{}/{}", id, path),
            revision: id,
        })
    }

    async fn list_revisions(&self, prefix: &str, limit: usize) -> Result<Vec<Revision>> {
        let commits = self.commits.lock().unwrap();
        let dir = format!("{}/", prefix);
        let mut previous: Option<&BTreeMap<String, (String, String)>> = None;
        let mut touching = Vec::new();
        for commit in commits.iter() {
            let changed = commit.files.iter().any(|(path, (sha, _))| {
                path.starts_with(&dir)
                    && previous.and_then(|p| p.get(path)).map(|(s, _)| s) != Some(sha)
            });
            if changed {
                touching.push(Revision {
                    id: commit.id.clone(),
                    message: commit.message.clone(),
                    author: "tester".to_string(),
                    timestamp: None,
                });
            }
            previous = Some(&commit.files);
        }
        touching.reverse();
        touching.truncate(limit);
        Ok(touching)
    }

    async fn read_at_revision(&self, revision: &str, prefix: &str) -> Result<Value> {
        let encoded = {
            let commits = self.commits.lock().unwrap();
            let commit = commits
                .iter()
                .find(|c| c.id == revision)
                .ok_or_else(|| Error::transport(404, Some("Not Found".to_string())))?;
            let tree: Vec<TreeEntry> = commit
                .files
                .iter()
                .map(|(path, (sha, _))| TreeEntry {
                    path: path.clone(),
                    kind: "blob".to_string(),
                    sha: sha.clone(),
                })
                .collect();
            let entry = find_workflow_path(&tree, prefix, &commit.touched)
                .ok_or_else(|| Error::NoWorkflowFile(prefix.to_string()))?;
            commit.files[&entry.path].1.clone()
        };
        decode_content(&encoded)
    }
}

/// Presenter and prompter that records everything and answers from a script
#[derive(Default)]
pub struct RecordingUi {
    /// `None` cancels the prompt
    pub commit_answer: Option<String>,
    /// `None` cancels the picker
    pub pick_answer: Option<usize>,
    /// Revision the picker was told to find, failing when it is not listed
    pub pick_id: Option<String>,
    pub statuses: Mutex<Vec<(StatusKind, String)>>,
    pub notices: Mutex<Vec<(NoticeKind, String)>>,
    pub transitions: Mutex<Vec<(FlowKind, FlowState)>>,
    pub offered: Mutex<Vec<Revision>>,
}

impl RecordingUi {
    pub fn answering(commit_answer: Option<&str>, pick_answer: Option<usize>) -> Self {
        Self {
            commit_answer: commit_answer.map(str::to_string),
            pick_answer,
            ..Default::default()
        }
    }

    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<(StatusKind, String)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<FlowState> {
        self.transitions.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    pub fn has_error_notice(&self) -> bool {
        self.notices().iter().any(|(k, _)| *k == NoticeKind::Error)
    }
}

impl Presenter for RecordingUi {
    fn status(&self, kind: StatusKind, message: &str) {
        self.statuses.lock().unwrap().push((kind, message.to_string()));
    }

    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().unwrap().push((kind, message.to_string()));
    }

    fn transition(&self, flow: FlowKind, state: FlowState) {
        self.transitions.lock().unwrap().push((flow, state));
    }
}

impl Prompter for RecordingUi {
    async fn commit_message(&self, _default: &str) -> Result<Option<String>> {
        Ok(self.commit_answer.clone())
    }

    async fn pick_revision(&self, revisions: &[Revision]) -> Result<Option<usize>> {
        self.offered.lock().unwrap().extend(revisions.iter().cloned());
        if let Some(id) = &self.pick_id {
            return revisions
                .iter()
                .position(|r| r.id.starts_with(id.as_str()))
                .map(Some)
                .ok_or_else(|| Error::UnknownRevision(id.clone()));
        }
        Ok(self.pick_answer)
    }
}
