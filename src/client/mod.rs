//! HTTP clients for the Azure management API and the GitHub REST API.
//!
//! This module provides [`ManagementClient`] (workflow GET/PUT),
//! [`GitHubClient`] (versioned backup storage) and the shared [`Auth`] type.

mod auth;
mod github;
mod management;

pub use auth::Auth;
pub use github::{
    BRANCH, DEFAULT_GITHUB_URL, GITHUB_API_VERSION, GitHubClient, MAX_PER_PAGE, RepositoryInfo,
    Revision, TreeEntry, WriteReceipt, decode_content, encode_content, find_workflow_path,
    page_size,
};
pub use management::{API_VERSION, DEFAULT_MANAGEMENT_URL, EXPAND, ManagementClient};

use crate::error::Error;
use serde_json::Value;
use url::Url;

/// Pull a human-readable message out of an API error body.
///
/// Understands both the ARM shape (`{"error": {"message": ..}}`) and the
/// GitHub shape (`{"message": ..}`).
pub(crate) fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

/// Turn a non-success response into a transport error, keeping the server's message
pub(crate) async fn error_for_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    Error::transport(status, server_message(&body))
}

/// Make sure a base URL ends with `/` so relative joins append instead of replace
pub(crate) fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// One-shot HTTP server answering each connection with a canned response
#[cfg(test)]
pub(crate) mod stub {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use url::Url;

    /// What the client sent
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: String,
        /// Path and query
        pub target: String,
        pub body: String,
    }

    impl Recorded {
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    pub struct StubServer {
        pub url: Url,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl StubServer {
        /// Serve `responses` in order, one per connection
        pub async fn start(responses: Vec<(u16, String)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = requests.clone();
            tokio::spawn(async move {
                for (status, body) in responses {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let request = read_request(&mut socket).await;
                    recorded.lock().unwrap().push(request);
                    let reply = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self { url, requests }
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(socket: &mut TcpStream) -> Recorded {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let body_start = end + 4;
                if buf.len() >= body_start + length {
                    let mut request_line = head.lines().next().unwrap_or_default().split(' ');
                    return Recorded {
                        method: request_line.next().unwrap_or_default().to_string(),
                        target: request_line.next().unwrap_or_default().to_string(),
                        body: String::from_utf8_lossy(&buf[body_start..body_start + length])
                            .to_string(),
                    };
                }
            }
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                panic!("connection closed mid-request");
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}
