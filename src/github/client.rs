// GitHub API HTTP client.
// Builds each request from the credential currently in the auth store and
// tracks rate limit headers across responses.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use tokio::sync::watch;

use crate::error::{Result, SurgeError};
use crate::store::AuthState;

use super::types::RateLimit;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub API client with credential-aware dispatch and rate limit tracking.
///
/// The credential is read from the auth store on every request: a non-empty
/// access value is attached as a bearer header, an empty one guarantees the
/// header is absent. The client only reads the store, it never writes it.
pub struct GitHubClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    auth: watch::Receiver<AuthState>,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a client reading credentials through the given auth handle.
    pub fn new(auth: watch::Receiver<AuthState>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("surge"));

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: GITHUB_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            auth,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Point the client at a different API host (GitHub Enterprise, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the most recently observed rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        self.limits().clone()
    }

    /// Finalize request headers against the current credential: attach the
    /// bearer header when an access value is present, strip any existing
    /// one otherwise.
    pub fn prepare_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let access = self.auth.borrow().token.access.clone();
        if access.is_empty() {
            headers.remove(AUTHORIZATION);
            return Ok(());
        }
        let value = HeaderValue::from_str(&format!("Bearer {}", access))
            .map_err(|e| SurgeError::Other(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Make a GET request to the API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut headers = HeaderMap::new();
        self.prepare_headers(&mut headers)?;

        tracing::debug!(
            url = %url,
            authenticated = headers.contains_key(AUTHORIZATION),
            "dispatching request"
        );

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await?;

        self.update_rate_limit(&response);
        self.check_response(response)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &Response) {
        let mut limits = self.limits();
        read_rate_limit(response.headers(), &mut limits);
    }

    /// Check response status and convert errors.
    fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let limits = self.limits().clone();
        let err = status_error(status, &limits);
        tracing::warn!(status = %status, error = %err, "request rejected");
        Err(err)
    }

    fn limits(&self) -> MutexGuard<'_, RateLimit> {
        // Held only for header parses and copies, never across an await; a
        // poisoned guard still holds valid counters.
        self.rate_limit.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Parse `x-ratelimit-*` headers into the tracked counters, leaving fields
/// untouched when a header is missing or malformed.
fn read_rate_limit(headers: &HeaderMap, limits: &mut RateLimit) {
    if let Some(limit) = headers
        .get("x-ratelimit-limit")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        limits.limit = limit;
    }

    if let Some(remaining) = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        limits.remaining = remaining;
    }

    if let Some(reset) = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        limits.reset = reset;
    }
}

/// Map a non-2xx status to the error surfaced to callers.
fn status_error(status: StatusCode, limits: &RateLimit) -> SurgeError {
    if status == StatusCode::FORBIDDEN && limits.remaining == 0 {
        let reset_at = chrono::DateTime::from_timestamp(limits.reset as i64, 0)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return SurgeError::RateLimited { reset_at };
    }
    SurgeError::Http { status }
}
