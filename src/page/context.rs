//! The inspected portal tab

use super::{SessionToken, WorkflowRef, extract_session_token, extract_workflow_ref};
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;
use url::Url;

/// Host serving the Azure Portal
pub const PORTAL_HOST: &str = "portal.azure.com";

/// Check whether a URL points at the Azure Portal
///
/// Unparsable URLs are simply not the portal.
pub fn is_portal_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(PORTAL_HOST)))
        .unwrap_or(false)
}

/// Session storage of a tab, in key index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStorage {
    entries: Vec<(String, String)>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value in place if the key already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Key at a given storage index
    pub fn key(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key index order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a storage dump: a JSON object whose member order is the key order.
    ///
    /// Non-string values are kept as their JSON text, which is what the
    /// browser would have stored.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(Error::InvalidJson)?;
        let Value::Object(map) = value else {
            return Err(Error::InvalidEncoding(
                "session storage dump must be a JSON object".to_string(),
            ));
        };

        let mut storage = Self::new();
        for (key, value) in map {
            match value {
                Value::String(s) => storage.set(key, s),
                other => storage.set(key, other.to_string()),
            }
        }
        Ok(storage)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionStorage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut storage = Self::new();
        for (k, v) in iter {
            storage.set(k, v);
        }
        storage
    }
}

/// A portal tab: its URL plus its session storage
#[derive(Debug, Clone)]
pub struct PageContext {
    url: String,
    storage: SessionStorage,
}

impl PageContext {
    pub fn new(url: impl Into<String>, storage: SessionStorage) -> Self {
        Self {
            url: url.into(),
            storage,
        }
    }

    /// Build a context from a URL and a session storage dump file
    pub fn from_dump(url: impl Into<String>, dump: impl AsRef<Path>) -> Result<Self> {
        let dump = dump.as_ref();
        log::debug!("Reading session storage dump {}", dump.display());
        let text = std::fs::read_to_string(dump)?;
        Ok(Self::new(url, SessionStorage::from_json(&text)?))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    pub fn is_portal(&self) -> bool {
        is_portal_url(&self.url)
    }

    pub fn workflow_ref(&self) -> Option<WorkflowRef> {
        extract_workflow_ref(&self.url)
    }

    pub fn session_token(&self) -> Option<SessionToken> {
        extract_session_token(&self.storage)
    }
}
