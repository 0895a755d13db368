//! Management API bearer token lookup in MSAL's session storage cache

use super::SessionStorage;
use serde::Deserialize;

/// Markers an MSAL access-token cache key must contain
const KEY_MARKERS: [&str; 3] = ["msal", "accesstoken", "management.core.windows.net"];

/// Every JWT starts with the base64 encoding of `{"`
const JWT_PREFIX: &str = "eyJ";

/// Bearer token for the Azure management API.
///
/// Lives only as long as the page inspection that produced it. `Debug` never
/// prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken(***)")
    }
}

#[derive(Deserialize)]
struct CacheEntry {
    secret: Option<String>,
}

/// Find the management API token in a tab's session storage.
///
/// Keys are scanned in ascending index order and the first entry carrying a
/// JWT wins. Entries that fail to parse are skipped.
pub fn extract_session_token(storage: &SessionStorage) -> Option<SessionToken> {
    for (key, value) in storage.iter() {
        if !KEY_MARKERS.iter().all(|marker| key.contains(marker)) {
            continue;
        }

        let entry: CacheEntry = match serde_json::from_str(value) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable token cache entry: {}", e);
                continue;
            }
        };

        if let Some(secret) = entry.secret.filter(|s| s.starts_with(JWT_PREFIX)) {
            log::debug!("Found management API token in session storage");
            return Some(SessionToken(secret));
        }
    }

    log::debug!("No management API token in session storage");
    None
}
