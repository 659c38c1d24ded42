//! Network boundary
//!
//! Fetching is abstracted behind the [`Fetcher`] trait so the worker can be
//! exercised against a scripted double in tests while the CLI talks real
//! HTTP through [`HttpFetcher`].
//!
//! An HTTP response with a non-ok status is still a response: only transport
//! faults (DNS, connect, TLS, truncated body) surface as errors. Callers that
//! require an ok status check [`CachedResponse::ok`] themselves.

use crate::error::{PrecacheError, PrecacheResult};
use crate::store::CachedResponse;
use async_trait::async_trait;
use ureq::Agent;

/// Upper bound on a fetched body
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

impl Method {
    pub fn is_get(&self) -> bool {
        matches!(self, Self::Get)
    }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }
}

/// Cache interaction mode for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Ordinary conditional fetch
    Normal,
    /// Bypass intermediary caches; used when staging the shell set
    Reload,
}

impl FetchMode {
    /// Request headers implied by this mode
    pub fn headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Normal => &[],
            Self::Reload => &[("Cache-Control", "no-cache"), ("Pragma", "no-cache")],
        }
    }
}

/// Abstract resource fetcher
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a GET for `url`, returning the response whatever its status
    async fn fetch(&self, url: &str, mode: FetchMode) -> PrecacheResult<CachedResponse>;
}

/// Fetcher backed by a shared blocking HTTP agent
///
/// `ureq` is synchronous, so each fetch runs on the blocking thread pool.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        // Non-2xx statuses are data here, not errors.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.new_agent(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> PrecacheResult<CachedResponse> {
        let agent = self.agent.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            for (name, value) in mode.headers() {
                request = request.header(*name, *value);
            }

            let response = request
                .call()
                .map_err(|e| PrecacheError::fetch(&url, e.to_string()))?;

            let (parts, mut body) = response.into_parts();
            let status = parts.status.as_u16();
            let headers = parts
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let bytes = body
                .with_config()
                .limit(MAX_BODY_BYTES)
                .read_to_vec()
                .map_err(|e| PrecacheError::fetch(&url, e.to_string()))?;

            Ok(CachedResponse::new(status, headers, bytes))
        })
        .await
        .map_err(|e| PrecacheError::Internal(format!("fetch task panicked: {e}")))?
    }
}
