//! Backend connection management.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::info;

use crate::error::RemoteError;

/// Configuration for connecting to the hosted backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the backend (e.g. `http://127.0.0.1:54321`).
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".into(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Shared HTTP client for the backend's auth and data endpoints.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Build a client from the provided configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        info!(base_url = %config.base_url, "configuring backend client");

        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&config.api_key)
                .map_err(|e| RemoteError::Decode(format!("invalid api key: {e}")))?;
            headers.insert("apikey", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Map non-success statuses into [`RemoteError`], reading the body
    /// as the error message.
    pub(crate) async fn check(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(RemoteError::Unauthorized(message))
        } else {
            Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
