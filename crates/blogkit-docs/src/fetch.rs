//! Client for the Google Docs `documents.get` endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::cache::is_document_id;

pub const DEFAULT_BASE_URL: &str = "https://docs.googleapis.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DocsConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for DocsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DocsConfig {
    /// Read `BLOGKIT_DOCS_TOKEN`, `BLOGKIT_DOCS_URL` and
    /// `BLOGKIT_DOCS_TIMEOUT_SECS`, keeping defaults for unset values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = std::env::var("BLOGKIT_DOCS_TOKEN") {
            config.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Ok(base_url) = std::env::var("BLOGKIT_DOCS_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = std::env::var("BLOGKIT_DOCS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no access token; set BLOGKIT_DOCS_TOKEN")]
    MissingToken,
    #[error("invalid document id '{0}'")]
    InvalidId(String),
    #[error("invalid access token header: {0}")]
    BadToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("docs api returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct DocsClient {
    client: reqwest::Client,
    base_url: String,
}

impl DocsClient {
    pub fn new(config: DocsConfig) -> Result<Self, FetchError> {
        let token = config.token.ok_or(FetchError::MissingToken)?;
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    fn endpoint(&self, document_id: &str) -> String {
        format!(
            "{}/documents/{document_id}",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Fetch the current revision of a document as raw JSON.
    pub async fn fetch(&self, document_id: &str) -> Result<Value, FetchError> {
        if !is_document_id(document_id) {
            return Err(FetchError::InvalidId(document_id.to_string()));
        }
        let url = self.endpoint(document_id);
        tracing::debug!(url = %url, "fetching document");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }
        let document = response.json::<Value>().await?;
        tracing::info!(document_id, "document fetched");
        Ok(document)
    }
}
