//! Azure Resource Manager client for Logic App workflow definitions
//!
//! Only two calls are needed: a GET that expands the workflow's connections
//! and parameters, and a full-replace PUT.

use super::{Auth, error_for_response, normalize_base};
use crate::error::{Error, Result};
use crate::page::{SessionToken, WorkflowRef};
use owo_colors::OwoColorize;
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

pub const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";

/// Microsoft.Logic API version used for every request
pub const API_VERSION: &str = "2016-10-01";

/// Sub-resources inlined into a fetched workflow
pub const EXPAND: &str = "connections.json,parameters.json";

/// Client for `.../providers/Microsoft.Logic/workflows/{name}`.
///
/// # Example
/// ```no_run
/// use logic_app_backup::client::ManagementClient;
/// use logic_app_backup::page::{SessionToken, WorkflowRef};
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://management.azure.com")?;
/// let client = ManagementClient::try_new(url, &SessionToken::new("eyJ..."))?;
/// let workflow = WorkflowRef::new("sub", "rg", "my-app");
/// let document = client.fetch(&workflow).await?;
/// client.replace(&workflow, &document).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ManagementClient {
    client: Client,
    url: Url,
}

impl ManagementClient {
    /// Create a client authenticated with the portal session's bearer token
    pub fn try_new(url: Url, token: &SessionToken) -> eyre::Result<Self> {
        let mut headers = Auth::bearer(token.secret()).headers()?;
        headers.insert(reqwest::header::CONTENT_TYPE, "application/json".parse()?);
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            url: normalize_base(url),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full URL of a workflow resource, with or without the expand query
    pub fn workflow_url(&self, workflow: &WorkflowRef, expand: bool) -> Result<Url> {
        let mut url = self.url.join(&workflow.resource_path())?;
        let query = match expand {
            true => format!("api-version={}&$expand={}", API_VERSION, EXPAND),
            false => format!("api-version={}", API_VERSION),
        };
        url.set_query(Some(&query));
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        log::debug!("{} {}", method.as_str().green(), url.path());
        let request = self.client.request(method, url);
        let request = match body {
            Some(body) => request.body(body),
            None => request,
        };
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }
        Ok(response)
    }

    /// GET a workflow definition, including its connections and parameters
    pub async fn fetch(&self, workflow: &WorkflowRef) -> Result<Value> {
        let url = self.workflow_url(workflow, true)?;
        let response = self.request(Method::GET, url, None).await?;
        let body = response.bytes().await?;
        let document = serde_json::from_slice(&body).map_err(Error::InvalidJson)?;
        log::info!("Fetched workflow {}", workflow.workflow_name.cyan());
        Ok(document)
    }

    /// PUT a workflow definition, replacing the remote one entirely
    pub async fn replace(&self, workflow: &WorkflowRef, document: &Value) -> Result<()> {
        let url = self.workflow_url(workflow, false)?;
        let body = serde_json::to_vec(document).map_err(Error::InvalidJson)?;
        self.request(Method::PUT, url, Some(body)).await?;
        log::info!("Replaced workflow {}", workflow.workflow_name.cyan());
        Ok(())
    }
}

impl std::fmt::Display for ManagementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
