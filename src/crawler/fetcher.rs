//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - GET requests for page text and audio bytes
//! - Retry logic with exponential backoff for transient failures
//! - Error classification (permanent vs. transient)

use crate::config::HttpConfig;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

/// A failed fetch, classified by whether retrying could ever help
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable client error (404 and other 4xx statuses)
    #[error("HTTP {status} for {url} (not retried)")]
    Permanent { url: String, status: u16 },

    /// Transient failure that persisted through every allowed attempt
    #[error("fetch failed for {url} after {attempts} attempt(s): {reason}")]
    Transient {
        url: String,
        attempts: u32,
        reason: String,
    },
}

impl FetchError {
    /// Returns true if retrying this fetch can never succeed
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }
}

/// Retry behavior for a single logical fetch
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 means one attempt total)
    pub max_retries: u32,

    /// Base delay before the first retry, doubled on each subsequent one
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    fn delay_before_attempt(&self, attempt: u32) -> Duration {
        // attempt is 1-based; the delay doubles after every failed attempt
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Builds the HTTP client shared by the whole crawl
///
/// One client is built per run and reused for every request so connection
/// pooling works across listing pages, lesson pages, and audio downloads.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the response body as text
///
/// Applies the retry policy for transient failures; see [`FetchError`] for
/// the classification rules.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let (response, attempts) = execute_with_retry(client, url, policy).await?;
    response.text().await.map_err(|e| FetchError::Transient {
        url: url.to_string(),
        attempts,
        reason: format!("failed to read body: {}", e),
    })
}

/// Fetches a URL and returns the raw response bytes
pub async fn fetch_bytes(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let (response, attempts) = execute_with_retry(client, url, policy).await?;
    match response.bytes().await {
        Ok(body) => Ok(body.to_vec()),
        Err(e) => Err(FetchError::Transient {
            url: url.to_string(),
            attempts,
            reason: format!("failed to read body: {}", e),
        }),
    }
}

/// Sends GET requests until one succeeds or the retry budget is spent
///
/// # Retry Rules
///
/// | Condition          | Action                         |
/// |--------------------|--------------------------------|
/// | 2xx                | Return the response            |
/// | 4xx                | Fail immediately as permanent  |
/// | 5xx                | Retry with backoff             |
/// | Timeout            | Retry with backoff             |
/// | Connection error   | Retry with backoff             |
///
/// Returns the successful response together with the number of attempts it
/// took, so body-read failures can report an accurate count.
async fn execute_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(Response, u32), FetchError> {
    let max_attempts = policy.max_retries + 1;
    let mut last_reason = String::new();

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            let delay = policy.delay_before_attempt(attempt - 1);
            tracing::debug!(
                "Retrying {} (attempt {}/{}) after {:?}: {}",
                url,
                attempt,
                max_attempts,
                delay,
                last_reason
            );
            tokio::time::sleep(delay).await;
        }

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok((response, attempt));
                }

                if status.is_client_error() {
                    return Err(FetchError::Permanent {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                // 5xx and anything else unexpected is worth another try
                last_reason = format!("HTTP {}", status.as_u16());
            }
            Err(e) => {
                last_reason = classify_request_error(&e);
            }
        }
    }

    Err(FetchError::Transient {
        url: url.to_string(),
        attempts: max_attempts,
        reason: last_reason,
    })
}

fn classify_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection error".to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn test_build_http_client() {
        let config = HttpConfig::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = HttpConfig {
            max_retries: 4,
            retry_backoff_ms: 250,
            ..HttpConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_permanent_error_classification() {
        let err = FetchError::Permanent {
            url: "https://example.com/gone".to_string(),
            status: 404,
        };
        assert!(err.is_permanent());

        let err = FetchError::Transient {
            url: "https://example.com/flaky".to_string(),
            attempts: 4,
            reason: "HTTP 503".to_string(),
        };
        assert!(!err.is_permanent());
    }

    // Retry behavior against live responses is covered by the wiremock
    // integration tests in tests/crawl_tests.rs.
}
