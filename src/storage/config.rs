//! GitHub backup store settings

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static REPOSITORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)^[\w-]+/[\w-]+$").expect("valid repository pattern"));

/// An `owner/repo` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !REPOSITORY_PATTERN.is_match(s) {
            return Err(Error::InvalidRepository(s.to_string()));
        }
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidRepository(s.to_string()))?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for Repository {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Repository> for String {
    fn from(repository: Repository) -> Self {
        repository.to_string()
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Token and repository for the GitHub backup store.
///
/// Optional: without it only the file flows are available.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    token: String,
    repository: Repository,
}

impl RemoteStoreConfig {
    pub fn new(token: impl Into<String>, repository: &str) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::StoreNotConfigured);
        }
        Ok(Self {
            token,
            repository: repository.parse()?,
        })
    }

    /// Read `GITHUB_TOKEN` and `GITHUB_REPO`; `None` unless both are set
    pub fn from_env() -> Result<Option<Self>> {
        match (std::env::var("GITHUB_TOKEN"), std::env::var("GITHUB_REPO")) {
            (Ok(token), Ok(repo)) => Self::new(token, &repo).map(Some),
            _ => Ok(None),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("token", &"***")
            .field("repository", &self.repository)
            .finish()
    }
}
