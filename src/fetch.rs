//! Outbound HTTP with timeouts and exponential backoff retry.
//!
//! Every network call in the crate goes through [`Fetcher`]. It owns a single
//! `reqwest::Client` (connection reuse) and an explicit [`FetchConfig`]; no
//! other state survives between calls.
//!
//! # Retry Strategy
//!
//! - GET and POST are retried on transient statuses (429, 500, 502, 503, 504)
//!   and on connect/timeout errors
//! - At most `max_attempts` requests are sent in total
//! - Delay before retry `n` is `backoff_base * 2^(n-1)`, capped at `max_backoff`,
//!   plus random jitter (`0..=jitter_ms`)
//!
//! Terminal failures come back as a [`FetchError`] carrying the URL. Nothing
//! in this module panics or hides a failure from the caller.

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// User agent sent with every request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X) JobFeedBot/0.1 (+contact: site owner)";

/// Statuses treated as transient.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Tunables for the fetch layer.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout, including body download.
    pub timeout: Duration,
    /// Total number of requests sent before giving up (>= 1).
    pub max_attempts: u32,
    /// Initial delay between attempts (doubles with each retry).
    pub backoff_base: Duration,
    /// Cap on a single backoff delay.
    pub max_backoff: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub jitter_ms: u64,
    pub user_agent: String,
    pub retry_statuses: Vec<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(25),
            max_attempts: 3,
            backoff_base: Duration::from_millis(700),
            max_backoff: Duration::from_secs(30),
            jitter_ms: 250,
            user_agent: USER_AGENT.to_string(),
            retry_statuses: RETRY_STATUSES.to_vec(),
        }
    }
}

/// A terminal fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A successful (2xx) response with its body read to text.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client with retry and backoff.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: Arc<FetchConfig>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch(url, Method::GET, None).await
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<FetchedPage, FetchError> {
        self.fetch(url, Method::POST, Some(body)).await
    }

    /// Send a request, retrying transient failures.
    ///
    /// Only GET and POST are retried; any other method gets a single attempt.
    #[instrument(level = "debug", skip_all, fields(%url, %method))]
    pub async fn fetch(
        &self,
        url: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<FetchedPage, FetchError> {
        let retriable = matches!(method, Method::GET | Method::POST);
        let max_attempts = if retriable {
            self.config.max_attempts.max(1)
        } else {
            1
        };
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let mut request = self.client.request(method.clone(), url);
            if let Some(json) = body {
                request = request.json(json);
            }

            let failure = match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let final_url = resp.url().to_string();
                        let text = resp.text().await.map_err(|source| {
                            if source.is_timeout() {
                                FetchError::Timeout {
                                    url: url.to_string(),
                                }
                            } else {
                                FetchError::Body {
                                    url: url.to_string(),
                                    source,
                                }
                            }
                        })?;
                        debug!(
                            attempt,
                            status = status.as_u16(),
                            bytes = text.len(),
                            "Fetched"
                        );
                        return Ok(FetchedPage {
                            final_url,
                            status: status.as_u16(),
                            body: text,
                        });
                    }

                    let transient = self.is_transient(status);
                    let preview = resp.text().await.unwrap_or_default();
                    debug!(
                        status = status.as_u16(),
                        body = %truncate_for_log(&preview, 200),
                        "Non-success response"
                    );
                    let err = FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !transient {
                        warn!(status = status.as_u16(), "Non-retriable status");
                        return Err(err);
                    }
                    err
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    let err = if e.is_timeout() {
                        FetchError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        FetchError::Transport {
                            url: url.to_string(),
                            source: e,
                        }
                    };
                    if !transient {
                        warn!(error = %err, "Non-retriable transport error");
                        return Err(err);
                    }
                    err
                }
            };

            if attempt >= max_attempts {
                error!(
                    attempt,
                    max = max_attempts,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    error = %failure,
                    "fetch exhausted retries"
                );
                return Err(failure);
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt,
                max = max_attempts,
                ?delay,
                error = %failure,
                "fetch attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }

    fn is_transient(&self, status: StatusCode) -> bool {
        self.config.retry_statuses.contains(&status.as_u16())
    }

    /// Delay to wait after the `attempt`-th failed attempt (1-based).
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let mut delay = self.config.backoff_base.saturating_mul(1 << shift);
        if delay > self.config.max_backoff {
            delay = self.config.max_backoff;
        }
        let jitter_ms: u64 = if self.config.jitter_ms == 0 {
            0
        } else {
            rng().random_range(0..=self.config.jitter_ms)
        };
        delay + Duration::from_millis(jitter_ms)
    }
}
