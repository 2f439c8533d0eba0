//! Default (non-browser) fetch path
//!
//! Requests without the browser flag are delegated here unchanged. The
//! trait seam lets tests substitute a recording fake for the real client.

use async_trait::async_trait;
use tracing::debug;

use super::{FetchRequest, FetchResponse, ResponseKind};
use crate::error::{FetchError, Result};

/// The default network fetch path
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform a plain network fetch for `request`
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Plain HTTP GET via `reqwest`
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with a fresh client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher from an existing client (shared connection pool)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(url = %request.url, "default path fetch");

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let encoding = charset_of(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let kind = ResponseKind::classify(&request.url, &body);
        Ok(FetchResponse {
            url: request.url.clone(),
            body,
            encoding,
            kind,
            flags: Vec::new(),
        })
    }
}

fn charset_of(headers: &reqwest::header::HeaderMap) -> String {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| {
            ct.split(';')
                .map(str::trim)
                .find_map(|p| p.strip_prefix("charset="))
                .map(|c| c.trim_matches('"').to_ascii_lowercase())
        })
        .unwrap_or_else(|| "utf-8".to_string())
}
