//! HTTP client for the Solr CoreAdmin `STATUS` endpoint.
//!
//! One GET per run, bounded by a request timeout, never retried.

use std::time::Duration;

use solrmon_core::status::StatusDocument;

/// Longest slice of an error response body kept in [`FetchError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors from the admin endpoint layer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Solr returned a non-2xx status code.
    #[error("Solr admin endpoint returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Start of the response body, for debugging.
        body: String,
    },

    /// The body was not a CoreAdmin status document.
    #[error("Malformed status document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP client bound to one admin URL.
pub struct SolrAdminClient {
    client: reqwest::Client,
    admin_url: String,
}

impl SolrAdminClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(admin_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, admin_url })
    }

    pub fn admin_url(&self) -> &str {
        &self.admin_url
    }

    /// Fetch and decode the status document.
    pub async fn fetch_status(&self) -> Result<StatusDocument, FetchError> {
        tracing::debug!(url = %self.admin_url, "Requesting Solr core status");

        let response = self.client.get(&self.admin_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body = response.text().await?;
        Ok(StatusDocument::from_json(&body)?)
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
