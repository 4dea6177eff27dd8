//! Client seam for the remote search/report service.
//!
//! [`SearchClient`] is the one operation the orchestrator needs. The real
//! implementation, [`HttpSearchClient`], posts the request as JSON and reads a
//! `{status, message, report_url}` payload back:
//!
//! | Situation                                    | Result                          |
//! |----------------------------------------------|---------------------------------|
//! | Any HTTP status, body parses as the payload  | `Ok(SearchResponse)`            |
//! | Body is not the payload (HTML error page...) | `Err(SearchError::Transport)`   |
//! | Connection refused, reset, DNS failure...    | `Err(SearchError::Transport)`   |
//!
//! Application-level failures therefore travel inside `Ok`, and only turn into
//! [`SearchError::Application`] in [`SearchResponse::into_outcome`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{SearchOutcome, SearchRequest};
use crate::errors::SearchError;

/// File name used when a report URL has no usable last path segment.
pub const DEFAULT_REPORT_FILE: &str = "procurement_report.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Payload returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,
}

impl SearchResponse {
    pub fn into_outcome(self) -> SearchOutcome {
        match (self.status, self.report_url) {
            (ResponseStatus::Success, Some(report_reference)) => {
                SearchOutcome::Success { report_reference }
            }
            (ResponseStatus::Success, None) => SearchError::Application {
                message: "The report was generated but no download location was returned"
                    .to_string(),
            }
            .into(),
            (ResponseStatus::Error, _) => SearchError::Application {
                message: self.message.unwrap_or_else(|| "Unknown error".to_string()),
            }
            .into(),
        }
    }
}

/// Abstraction over the remote search call for testability.
/// Real implementation: `HttpSearchClient`.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Issue one search. Implementations must not retry on their own.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

pub struct HttpSearchClient {
    http: reqwest::Client,
    endpoint: Url,
    search_url: Url,
}

impl HttpSearchClient {
    /// Create a client for the service at `endpoint`, posting searches to
    /// `search_path` (resolved against the endpoint).
    pub fn new(endpoint: &str, search_path: &str, connect_timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid search service endpoint: {}", endpoint))?;
        let search_url = endpoint
            .join(search_path)
            .with_context(|| format!("Invalid search path: {}", search_path))?;
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            search_url,
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Turn a report reference from the service into an absolute URL.
    ///
    /// The service usually answers with a path such as
    /// `/reports/procurement_report.html`; absolute URLs pass through.
    pub fn resolve_report_url(&self, reference: &str) -> String {
        match self.endpoint.join(reference) {
            Ok(url) => url.to_string(),
            Err(_) => reference.to_string(),
        }
    }

    /// Fetch a generated report and save it under `dir`.
    ///
    /// Returns the path of the written file.
    pub async fn download_report(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let url = Url::parse(url).with_context(|| format!("Invalid report URL: {}", url))?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_REPORT_FILE)
            .to_string();

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to request report from {}", url))?
            .error_for_status()
            .context("Search service refused the report download")?;
        let body = response
            .bytes()
            .await
            .context("Failed to read report body")?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("Failed to write report to: {}", path.display()))?;

        info!(path = %path.display(), bytes = body.len(), "Saved report");
        Ok(path)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        debug!(url = %self.search_url, "Posting search request");
        let response = self
            .http
            .post(self.search_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let mut parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            SearchError::Transport(format!(
                "unexpected response from search service (HTTP {}): {}",
                status, e
            ))
        })?;
        debug!(http_status = %status, status = ?parsed.status, "Search service answered");

        if let Some(reference) = parsed.report_url.take() {
            parsed.report_url = Some(self.resolve_report_url(&reference));
        }
        Ok(parsed)
    }
}
