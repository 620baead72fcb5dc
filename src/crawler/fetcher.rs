//! HTTP fetcher implementation
//!
//! This module performs the single-page GET with everything the crawl loop
//! needs wrapped around it:
//! - An identifying user agent and per-request timeout
//! - A politeness gap between consecutive requests to the same host
//! - Retry with exponential backoff and jitter for transient failures
//! - A body size cap (oversized bodies are truncated and flagged)
//! - Content-type gating so only HTML reaches the extractor
//!
//! Redirects are not followed automatically; a 3xx surfaces as
//! [`FetchResult::Redirected`] so the crawl loop can canonicalize the target
//! and route it through the frontier like any other discovery.

use crate::config::{FetchConfig, UserAgentConfig};
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Base delay for the exponential backoff schedule; doubles per attempt
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Connect timeout, bounded separately from the full-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// HTTP status code
        status: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body (possibly truncated at the byte cap)
        body: String,
        /// The URL the body was served from
        final_url: Url,
        /// Whether the body hit the byte cap
        truncated: bool,
    },

    /// The server answered with a redirect
    Redirected {
        /// Raw Location header value (may be relative)
        new_url: String,
    },

    /// The response was refused before the body was consumed
    Blocked {
        /// Why the response was refused
        reason: BlockReason,
    },

    /// The fetch failed after exhausting retries
    Failed {
        /// Classification of the final failure
        kind: FetchErrorKind,
        /// Total attempts made (including the first)
        attempts: u32,
    },
}

/// Reasons a response is refused without consuming its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Content-Type is not HTML
    UnsupportedContentType { content_type: String },

    /// Content-Length announced a body over the byte cap
    BodyTooLarge { announced: u64 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type '{}'", content_type)
            }
            Self::BodyTooLarge { announced } => {
                write!(f, "announced body size {} bytes over cap", announced)
            }
        }
    }
}

/// Classification of a failed fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request timed out
    Timeout,

    /// Connection could not be established (refused, DNS, TLS)
    Connect,

    /// HTTP 5xx
    ServerError { status: u16 },

    /// HTTP 429
    RateLimited,

    /// HTTP 4xx other than 429
    ClientError { status: u16 },

    /// Anything else (body read error, malformed response)
    Other(String),
}

impl FetchErrorKind {
    /// Whether this failure class is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connect | Self::ServerError { .. } | Self::RateLimited
        )
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect => write!(f, "connection failed"),
            Self::ServerError { status } => write!(f, "server error (HTTP {})", status),
            Self::RateLimited => write!(f, "rate limited (HTTP 429)"),
            Self::ClientError { status } => write!(f, "client error (HTTP {})", status),
            Self::Other(message) => write!(f, "{}", message),
        }
    }
}

/// One failed attempt, with an optional server-requested retry delay
struct AttemptFailure {
    kind: FetchErrorKind,
    retry_after: Option<Duration>,
}

impl AttemptFailure {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            FetchErrorKind::Timeout
        } else if error.is_connect() {
            FetchErrorKind::Connect
        } else {
            FetchErrorKind::Other(error.to_string())
        };

        Self {
            kind,
            retry_after: None,
        }
    }
}

/// Performs single-page fetches with politeness and retry handling
///
/// The per-host last-request map is the fetcher's only mutable state; it is
/// owned per job, so concurrent jobs never share politeness bookkeeping.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    last_request: HashMap<String, Instant>,
}

impl Fetcher {
    /// Builds a fetcher with its HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch tunables (timeout, retries, byte cap)
    /// * `user_agent` - Identification used in the User-Agent header
    pub fn new(config: FetchConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(config.request_timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
            .redirect(Policy::none()) // Redirects surface as FetchResult::Redirected
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: HashMap::new(),
        })
    }

    /// Fetches a URL, honoring the host politeness gap and retry policy
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL to fetch
    /// * `host_delay` - Minimum gap since the last request to this host
    ///   (the politeness delay, possibly widened by a robots crawl-delay)
    pub async fn fetch(&mut self, url: &Url, host_delay: Duration) -> FetchResult {
        let host = host_key(url);
        self.wait_for_host(&host, host_delay).await;

        let mut attempts = 0;
        loop {
            attempts += 1;
            self.last_request.insert(host.clone(), Instant::now());

            let failure = match self.attempt(url).await {
                Ok(outcome) => return outcome,
                Err(failure) => failure,
            };

            if !failure.kind.is_transient() || attempts > self.config.max_retries {
                return FetchResult::Failed {
                    kind: failure.kind,
                    attempts,
                };
            }

            let delay = failure.retry_after.unwrap_or_else(|| backoff_delay(attempts));
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempts,
                url,
                failure.kind,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Performs one GET attempt
    async fn attempt(&self, url: &Url) -> Result<FetchResult, AttemptFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AttemptFailure::from_reqwest(&e))?;

        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok());

            return match location {
                Some(new_url) => Ok(FetchResult::Redirected {
                    new_url: new_url.to_string(),
                }),
                None => Err(AttemptFailure {
                    kind: FetchErrorKind::Other(format!(
                        "redirect (HTTP {}) without Location header",
                        status.as_u16()
                    )),
                    retry_after: None,
                }),
            };
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptFailure {
                kind: FetchErrorKind::RateLimited,
                retry_after: parse_retry_after(&response),
            });
        }

        if status.is_server_error() {
            return Err(AttemptFailure {
                kind: FetchErrorKind::ServerError {
                    status: status.as_u16(),
                },
                retry_after: None,
            });
        }

        if status.is_client_error() {
            return Err(AttemptFailure {
                kind: FetchErrorKind::ClientError {
                    status: status.as_u16(),
                },
                retry_after: None,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Ok(FetchResult::Blocked {
                reason: BlockReason::UnsupportedContentType { content_type },
            });
        }

        if let Some(announced) = response.content_length() {
            if announced as usize > self.config.max_body_bytes {
                return Ok(FetchResult::Blocked {
                    reason: BlockReason::BodyTooLarge { announced },
                });
            }
        }

        self.read_body(response, status.as_u16(), content_type, url)
            .await
    }

    /// Streams the response body up to the byte cap
    async fn read_body(
        &self,
        mut response: reqwest::Response,
        status: u16,
        content_type: String,
        url: &Url,
    ) -> Result<FetchResult, AttemptFailure> {
        let mut bytes: Vec<u8> = Vec::new();
        let mut truncated = false;

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.config.max_body_bytes - bytes.len();
                    if chunk.len() > remaining {
                        bytes.extend_from_slice(&chunk[..remaining]);
                        truncated = true;
                        break;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return Err(AttemptFailure::from_reqwest(&e)),
            }
        }

        Ok(FetchResult::Success {
            status,
            content_type,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            final_url: url.clone(),
            truncated,
        })
    }

    /// Sleeps until the host's politeness gap has elapsed
    async fn wait_for_host(&self, host: &str, min_delay: Duration) {
        if min_delay.is_zero() {
            return;
        }

        if let Some(last) = self.last_request.get(host) {
            let elapsed = last.elapsed();
            if elapsed < min_delay {
                tokio::time::sleep(min_delay - elapsed).await;
            }
        }
    }

    #[cfg(test)]
    fn note_request(&mut self, host: &str) {
        self.last_request.insert(host.to_string(), Instant::now());
    }
}

/// Politeness key for a URL (host + effective port)
fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or(0)
    )
}

/// Checks whether a Content-Type header denotes an HTML document
fn is_html(content_type: &str) -> bool {
    let lowered = content_type.to_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml+xml")
}

/// Exponential backoff with jitter: base doubles per attempt
fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = BACKOFF_BASE.as_millis() as u64;
    // Cap the exponent so pathological retry settings cannot overflow
    let exponent = attempt.saturating_sub(1).min(6);
    let delay_ms = base_ms.saturating_mul(1u64 << exponent);
    let jitter_ms = rand::thread_rng().gen_range(0..=base_ms / 2);
    Duration::from_millis(delay_ms + jitter_ms)
}

/// Parses a numeric Retry-After header value
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
