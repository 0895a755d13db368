//! GitHub REST client used as the versioned backup store
//!
//! Backups are plain JSON files committed through the contents API. History
//! comes from the commits API filtered by path, and a past backup is read by
//! walking the commit's tree.

use super::{Auth, error_for_response, normalize_base};
use crate::error::{Error, Result};
use crate::storage::{RemoteStoreConfig, Repository};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";

/// Value of the `X-GitHub-Api-Version` header
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Branch every backup is read from and written to
pub const BRANCH: &str = "main";

/// Largest page the commits API returns
pub const MAX_PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("lappbak/", env!("CARGO_PKG_VERSION"));

/// One commit touching a backup path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Commit SHA
    pub id: String,
    pub message: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Revision {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Result of committing a backup
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    /// SHA of the commit that was created
    pub revision: String,
    /// Link to the file pinned at that commit
    pub permalink: String,
}

/// Repository details returned by the connection test
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Entry of a recursive git tree listing
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

#[derive(Deserialize)]
struct Tree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct Contents {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct Blob {
    content: String,
}

#[derive(Deserialize)]
struct PutContents {
    content: Option<PutContentsFile>,
    commit: PutContentsCommit,
}

#[derive(Deserialize)]
struct PutContentsFile {
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct PutContentsCommit {
    sha: String,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitFiles {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Deserialize)]
struct ChangedFile {
    filename: String,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    name: String,
    date: Option<DateTime<Utc>>,
}

impl From<CommitItem> for Revision {
    fn from(item: CommitItem) -> Self {
        let (author, timestamp) = match item.commit.author {
            Some(sig) => (sig.name, sig.date),
            None => ("unknown".to_string(), None),
        };
        Self {
            id: item.sha,
            message: item.commit.message,
            author,
            timestamp,
        }
    }
}

/// Serialize a document the way it is stored: 2-space pretty JSON, base64 encoded
pub fn encode_content(document: &Value) -> Result<String> {
    let text = serde_json::to_string_pretty(document).map_err(Error::InvalidJson)?;
    Ok(STANDARD.encode(text))
}

/// Decode base64 file content as returned by GitHub (wrapped at 60 columns)
pub fn decode_content(encoded: &str) -> Result<Value> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(Error::InvalidJson)
}

/// The backup file under `prefix` a revision holds.
///
/// Every day's backup lives under the same prefix, so the file the revision
/// touched wins. Without one, the newest-dated file is used.
pub fn find_workflow_path<'a>(
    tree: &'a [TreeEntry],
    prefix: &str,
    touched: &[String],
) -> Option<&'a TreeEntry> {
    let prefix = prefix.trim_end_matches('/');
    let dir = format!("{}/", prefix);
    let candidates: Vec<&TreeEntry> = tree
        .iter()
        .filter(|e| {
            e.kind == "blob"
                && (e.path == prefix || e.path.starts_with(&dir))
                && e.path.ends_with(".json")
        })
        .collect();

    candidates
        .iter()
        .find(|e| touched.contains(&e.path))
        .or_else(|| candidates.iter().max_by(|a, b| a.path.cmp(&b.path)))
        .copied()
}

/// `per_page` sent to the commits API, which caps it at 100
pub fn page_size(limit: usize) -> usize {
    limit.clamp(1, MAX_PER_PAGE)
}

/// GitHub repository client scoped to one repository and branch.
///
/// # Example
/// ```no_run
/// use logic_app_backup::client::GitHubClient;
/// use logic_app_backup::storage::RemoteStoreConfig;
/// use serde_json::json;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let config = RemoteStoreConfig::new("ghp_...", "octo/backups")?;
/// let client = GitHubClient::try_new(Url::parse("https://api.github.com")?, &config)?;
///
/// let path = "apps/my-app/2024-05-01-workflow.json";
/// let sha = client.current_revision_id(path).await?;
/// let receipt = client
///     .write(path, &json!({"definition": {}}), sha.as_deref(), "Backup my-app")
///     .await?;
/// println!("{}", receipt.permalink);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GitHubClient {
    client: Client,
    url: Url,
    repository: Repository,
    branch: String,
}

impl GitHubClient {
    pub fn try_new(url: Url, config: &RemoteStoreConfig) -> eyre::Result<Self> {
        let mut headers = Auth::bearer(config.token()).headers()?;
        headers.insert(
            reqwest::header::ACCEPT,
            "application/vnd.github+json".parse()?,
        );
        headers.insert("X-GitHub-Api-Version", GITHUB_API_VERSION.parse()?);
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: normalize_base(url),
            repository: config.repository().clone(),
            branch: BRANCH.to_string(),
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// URL under `repos/{owner}/{repo}/`
    fn repo_url(&self, tail: &str) -> Result<Url> {
        let path = format!(
            "repos/{}/{}/{}",
            self.repository.owner,
            self.repository.name,
            tail.trim_start_matches('/')
        );
        Ok(self.url.join(&path)?)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<reqwest::Response> {
        log::debug!("{} {}", method.as_str().green(), url.path());
        let request = self.client.request(method, url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        Ok(request.send().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Error::InvalidJson)
    }

    /// Check the token can see the repository
    pub async fn test_connection(&self) -> Result<RepositoryInfo> {
        let url = self.url.join(&format!(
            "repos/{}/{}",
            self.repository.owner, self.repository.name
        ))?;
        let response = self.send(Method::GET, url, None).await?;
        match response.status() {
            s if s.is_success() => {
                let body = response.bytes().await?;
                serde_json::from_slice(&body).map_err(Error::InvalidJson)
            }
            StatusCode::NOT_FOUND => Err(Error::transport(
                404,
                Some("Repository not found. Check the repository name or create it first.".into()),
            )),
            StatusCode::UNAUTHORIZED => Err(Error::transport(
                401,
                Some("Invalid token. Please check your Personal Access Token.".into()),
            )),
            _ => Err(error_for_response(response).await),
        }
    }

    /// SHA of the file currently at `path` on the branch, `None` if there is no such file
    pub async fn current_revision_id(&self, path: &str) -> Result<Option<String>> {
        let mut url = self.repo_url(&format!("contents/{}", path))?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let response = self.send(Method::GET, url, None).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                log::debug!("{} {} - no existing file", "404".yellow(), path);
                Ok(None)
            }
            s if s.is_success() => {
                let body = response.bytes().await?;
                let contents: Contents =
                    serde_json::from_slice(&body).map_err(Error::InvalidJson)?;
                log::debug!("{} {} - existing file {}", "200".green(), path, contents.sha);
                Ok(Some(contents.sha))
            }
            _ => Err(error_for_response(response).await),
        }
    }

    /// Commit `document` to `path`.
    ///
    /// `prior` must be the SHA of the file currently at `path` when one exists,
    /// GitHub refuses to overwrite otherwise.
    pub async fn write(
        &self,
        path: &str,
        document: &Value,
        prior: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt> {
        let url = self.repo_url(&format!("contents/{}", path))?;
        let mut body = json!({
            "message": message,
            "content": encode_content(document)?,
            "branch": self.branch,
        });
        if let Some(sha) = prior {
            body["sha"] = Value::String(sha.to_string());
        }

        let response = self.send(Method::PUT, url, Some(&body)).await?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }
        let bytes = response.bytes().await?;
        let created: PutContents = serde_json::from_slice(&bytes).map_err(Error::InvalidJson)?;

        let permalink = created
            .content
            .and_then(|c| c.html_url)
            .map(|html| pin_to_commit(&html, &self.branch, &created.commit.sha))
            .or(created.commit.html_url)
            .unwrap_or_default();

        log::info!(
            "Committed {} ({})",
            path.cyan(),
            created.commit.sha.get(..7).unwrap_or(&created.commit.sha)
        );

        Ok(WriteReceipt {
            revision: created.commit.sha,
            permalink,
        })
    }

    /// Commits touching `prefix` on the branch, newest first, at most `limit`
    pub async fn list_revisions(&self, prefix: &str, limit: usize) -> Result<Vec<Revision>> {
        let per_page = page_size(limit);
        if per_page < limit {
            log::warn!(
                "GitHub lists at most {} commits per request, showing the latest {}",
                MAX_PER_PAGE,
                per_page
            );
        }
        let mut url = self.repo_url("commits")?;
        url.query_pairs_mut()
            .append_pair("path", prefix)
            .append_pair("sha", &self.branch)
            .append_pair("per_page", &per_page.to_string());

        let items: Vec<CommitItem> = self.get_json(url).await?;
        let revisions: Vec<Revision> = items
            .into_iter()
            .take(per_page)
            .map(Revision::from)
            .collect();
        log::debug!("Found {} revision(s) for {}", revisions.len(), prefix);
        Ok(revisions)
    }

    /// Paths a commit added or modified
    async fn touched_paths(&self, revision: &str) -> Result<Vec<String>> {
        let url = self.repo_url(&format!("commits/{}", revision))?;
        let commit: CommitFiles = self.get_json(url).await?;
        Ok(commit
            .files
            .into_iter()
            .filter(|f| f.status != "removed")
            .map(|f| f.filename)
            .collect())
    }

    /// Read the backup stored under `prefix` as of `revision`
    pub async fn read_at_revision(&self, revision: &str, prefix: &str) -> Result<Value> {
        let touched = self.touched_paths(revision).await?;

        let mut url = self.repo_url(&format!("git/trees/{}", revision))?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let tree: Tree = self.get_json(url).await?;
        if tree.truncated {
            log::warn!("Tree listing for {} was truncated", revision);
        }

        let entry = find_workflow_path(&tree.tree, prefix, &touched)
            .ok_or_else(|| Error::NoWorkflowFile(prefix.to_string()))?;
        log::debug!("Reading {} at {}", entry.path.cyan(), revision);

        let mut url = self.repo_url(&format!("contents/{}", entry.path))?;
        url.query_pairs_mut().append_pair("ref", revision);
        let contents: Contents = self.get_json(url).await?;

        // The contents API omits bodies over 1 MB, the blob API does not
        let encoded = match (contents.encoding.as_deref(), contents.content) {
            (Some("base64"), Some(content)) if !content.is_empty() => content,
            _ => {
                let url = self.repo_url(&format!("git/blobs/{}", entry.sha))?;
                let blob: Blob = self.get_json(url).await?;
                blob.content
            }
        };

        decode_content(&encoded)
    }
}

/// Rewrite a branch `blob` link so it points at a fixed commit
fn pin_to_commit(html_url: &str, branch: &str, sha: &str) -> String {
    html_url.replacen(
        &format!("/blob/{}/", branch),
        &format!("/blob/{}/", sha),
        1,
    )
}

impl std::fmt::Display for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.repository, self.branch)
    }
}
