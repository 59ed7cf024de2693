//! REST client for the finance dashboard backend
//!
//! `ApiClient` owns the HTTP connection pool and the session handle. Each
//! list endpoint is exposed as an `Endpoint`, which implements the core
//! `PageSource` trait so it can drive a `PagedFetcher` directly.

pub mod error;
pub mod pages;

use async_trait::async_trait;
use finboard_config::{BackendConfig, Config};
use finboard_core::{FetchError, PageQuery, PageResponse, PageSource, SessionContext};
use reqwest::StatusCode;
use std::time::Duration;

pub use error::ClientError;
pub use pages::{fetch_all, parse_page_response};

/// Longest server error text carried into a `FetchError`
const MAX_ERROR_MESSAGE: usize = 200;

/// Shared HTTP client for one backend
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(backend: &BackendConfig, session: SessionContext) -> Result<Self, ClientError> {
        let base_url = backend.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl { url: backend.base_url.clone() });
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("finboard/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(backend.timeout_secs))
            .build()
            .map_err(|e| ClientError::Build { message: e.to_string() })?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn from_config(config: &Config, session: SessionContext) -> Result<Self, ClientError> {
        Self::new(&config.backend, session)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Paged list endpoint at `path`, relative to the base URL
    pub fn endpoint(&self, path: &str) -> Endpoint {
        Endpoint {
            client: self.clone(),
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
        }
    }
}

/// One paged list endpoint
#[derive(Clone)]
pub struct Endpoint {
    client: ApiClient,
    url: String,
}

impl Endpoint {
    pub fn url(&self) -> &str {
        &self.url
    }

    fn handle_error_status(&self, status: StatusCode, body: String) -> FetchError {
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("backend rejected the session token, logging out");
            if let Err(e) = self.client.session.logout() {
                log::error!(target: "finboard::client", "failed to clear session: {}", e);
            }
        }
        FetchError::Server {
            status: status.as_u16(),
            message: error_message(status, &body),
        }
    }
}

#[async_trait]
impl PageSource for Endpoint {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        let mut request = self.client.http.get(&self.url).query(&query.to_params());
        if let Some(token) = self.client.session.token() {
            request = request.bearer_auth(token);
        }

        log::debug!("GET {} page {}", self.url, query.page);
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(self.handle_error_status(status, body));
        }
        parse_page_response(&body)
    }
}

/// Prefer the `detail`/`message` field of a JSON error body
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
    });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE).collect()
}
