//! Resilient fetch gateway for the public upstream APIs.
//!
//! Three layers, composed bottom-up: a single GET bounded by a per-attempt
//! timeout, a retry wrapper with linear backoff around it, and a
//! bounded-width fan-out that runs independent retried calls concurrently
//! and tolerates per-slot failure.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    #[error("upstream returned {0}")]
    Status(StatusCode),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

/// Per-call-site retry configuration. Constructed fresh for every logical
/// call; never shared between requests.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub per_attempt_timeout: Duration,
    pub backoff_base: Duration,
}

impl FetchPolicy {
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

    pub fn new(max_attempts: u32, per_attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            per_attempt_timeout,
            backoff_base: Self::DEFAULT_BACKOFF_BASE,
        }
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Pause inserted after failed attempt `attempt` (0-based):
    /// `backoff_base * (attempt + 1)`, so 1s, 2s, 3s, … with the default
    /// base.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * (attempt + 1)
    }
}

/// Run `op` up to `policy.max_attempts` times, pausing between failures,
/// but bail out immediately on errors `should_retry` rejects. `op`
/// receives the 0-based attempt index and must produce a fresh attempt on
/// every call. After the last failure the last error is returned as-is.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &FetchPolicy,
    mut op: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < max_attempts && should_retry(&err) => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Retry wrapper used by the GET gateway: every failure is eligible,
/// including non-success statuses (a permanently failing URL is retried
/// the full `max_attempts` before giving up), and exhaustion is reported
/// as a dedicated error carrying the attempt count.
pub async fn retry<T, F, Fut>(policy: &FetchPolicy, op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    retry_if(policy, op, |_| true)
        .await
        .map_err(|last| FetchError::Exhausted {
            attempts: policy.max_attempts.max(1),
            last: Box::new(last),
        })
}

/// Run up to `cap` independent retried calls concurrently and collect the
/// successes in slot order. A slot that exhausts its retries is dropped
/// with a warning; it never cancels its siblings. An all-failed batch
/// yields an empty vec, which the HTTP boundary turns into 503.
pub async fn fan_out<T, F, Fut>(count: u32, cap: u32, make: F) -> Vec<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let width = count.min(cap);
    let slots = (0..width).map(|slot| {
        let fut = make(slot);
        async move {
            match fut.await {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(slot, error = %err, "fan-out slot failed");
                    None
                }
            }
        }
    });
    futures::future::join_all(slots)
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Normalize a base URL so that `Url::join` treats its last path segment
/// as a directory instead of replacing it.
pub fn base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Debug, Clone)]
pub struct FetchGateway {
    http: Client,
}

impl FetchGateway {
    /// The client carries no global timeout; each attempt attaches the
    /// policy's per-attempt deadline to its own request.
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("pom-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// One GET, decided exactly once: response headers within `timeout`,
    /// or a timeout/transport/status failure. A non-success status is a
    /// failed attempt like any other, not a panic.
    async fn attempt(&self, url: Url, timeout: Duration) -> Result<reqwest::Response, FetchError> {
        let res = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(res),
            s => Err(FetchError::Status(s)),
        }
    }

    pub async fn get_with_retry(
        &self,
        url: &Url,
        policy: &FetchPolicy,
    ) -> Result<reqwest::Response, FetchError> {
        retry(policy, |_| self.attempt(url.clone(), policy.per_attempt_timeout)).await
    }

    /// Retried GET plus body parse. The parse happens after the retry
    /// loop: a malformed body from a 2xx response is not retried.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        policy: &FetchPolicy,
    ) -> Result<T, FetchError> {
        let res = self.get_with_retry(url, policy).await?;
        res.json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// `count` independent retried GETs against the same (randomized)
    /// endpoint, clamped to `cap`.
    pub async fn fan_out_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        policy: &FetchPolicy,
        count: u32,
        cap: u32,
    ) -> Vec<T> {
        fan_out(count, cap, |_| self.get_json::<T>(url, policy)).await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}
