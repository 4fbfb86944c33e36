//! Resilient HTTP request utilities.
//!
//! Wraps GET requests with bounded retry and exponential backoff so that
//! transient network failures are masked automatically. The retry core is
//! generic over the attempt closure, so the policy can be exercised in tests
//! without a network.

use crate::error::Error;
use bytes::Bytes;
use core::time::Duration;
use reqwest::header::HeaderMap;

/// Default timeout for a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default retry attempts on top of the original request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff between retries.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Retry configuration: up to `max_retries` additional attempts with
/// `backoff_base * 2^attempt` delays between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

/// A fully-read response produced by one request attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub status: u16,
    pub retry_after: Option<u64>,
    pub body: Bytes,
}

/// What to do after observing one attempt's outcome.
enum NextStep {
    Done,
    Retry(Duration),
    Fail,
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let s = headers.get(reqwest::header::RETRY_AFTER).and_then(|h| h.to_str().ok())?;
    s.parse::<u64>().ok()
}

fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.backoff_base.saturating_mul(2_u32.saturating_pow(attempt))
}

/// Classify one attempt outcome for retry purposes.
fn classify(outcome: &Result<Attempt, Error>, attempt: u32, policy: &RetryPolicy) -> NextStep {
    match outcome {
        // Network / connection errors are always transient.
        Err(_) => NextStep::Retry(backoff_delay(policy, attempt)),

        Ok(resp) if (200..300).contains(&resp.status) => NextStep::Done,

        // Server errors (5xx) are transient.
        Ok(resp) if resp.status >= 500 => NextStep::Retry(backoff_delay(policy, attempt)),

        // Rate-limited (429): honor Retry-After if present, otherwise back off.
        Ok(resp) if resp.status == 429 => {
            let delay = resp
                .retry_after
                .map_or_else(|| backoff_delay(policy, attempt), Duration::from_secs);
            NextStep::Retry(delay)
        }

        // Everything else (other 4xx) is not retried.
        Ok(_) => NextStep::Fail,
    }
}

/// Drive the retry loop over an attempt closure.
///
/// Returns the first successful (2xx) attempt, or the terminal error once the
/// outcome is non-retryable or the retry budget is exhausted: 404 maps to
/// [`Error::NotFound`], any other status to [`Error::Http`], and transport
/// failures pass through as [`Error::Network`].
pub(crate) async fn get_with_policy<F, Fut>(url: &str, policy: &RetryPolicy, mut attempt_fn: F) -> Result<Attempt, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt, Error>>,
{
    let mut outcome = attempt_fn().await;
    let mut attempt = 0;

    loop {
        match classify(&outcome, attempt, policy) {
            NextStep::Done => return outcome,
            NextStep::Fail => break,
            NextStep::Retry(delay) => {
                if attempt >= policy.max_retries {
                    break;
                }
                log::debug!("retrying GET {url} (attempt {}, delay {}ms)", attempt + 1, delay.as_millis());
                tokio::time::sleep(delay).await;
                attempt += 1;
                outcome = attempt_fn().await;
            }
        }
    }

    match outcome {
        Ok(resp) if resp.status == 404 => Err(Error::not_found(url)),
        Ok(resp) => Err(Error::http(url, resp.status, &resp.body)),
        Err(err) => Err(err),
    }
}

/// HTTP client that applies a [`RetryPolicy`] to every GET it issues.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Create a client with the given retry policy and per-request timeout.
    pub fn new(policy: RetryPolicy, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("model-audit")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ClientInit { message: e.to_string() })?;

        Ok(Self { client, policy })
    }

    /// Send a GET request, retrying transient failures, and return the body.
    pub async fn get(&self, url: &str, headers: HeaderMap) -> crate::Result<Bytes> {
        let resp = get_with_policy(url, &self.policy, || self.attempt(url, &headers)).await?;
        Ok(resp.body)
    }

    /// Send a GET request and parse the body as JSON.
    pub async fn get_json(&self, url: &str, headers: HeaderMap) -> crate::Result<serde_json::Value> {
        let body = self.get(url, headers).await?;
        serde_json::from_slice(&body).map_err(|e| Error::schema(url, format!("invalid JSON: {e}")))
    }

    async fn attempt(&self, url: &str, headers: &HeaderMap) -> Result<Attempt, Error> {
        let resp = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| Error::network(url, e))?;

        let status = resp.status().as_u16();
        let retry_after = parse_retry_after(resp.headers());
        let body = resp.bytes().await.map_err(|e| Error::network(url, e))?;

        Ok(Attempt {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, RETRY_AFTER};
    use std::cell::Cell;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base: Duration::ZERO,
        }
    }

    fn attempt_with(status: u16) -> Attempt {
        Attempt {
            status,
            retry_after: None,
            body: Bytes::from_static(b"body"),
        }
    }

    /// Run the retry loop over a scripted status sequence, returning the
    /// outcome and how many calls were made.
    async fn run_script(statuses: &[u16], max_retries: u32) -> (Result<Attempt, Error>, u32) {
        let calls = Cell::new(0_u32);
        let outcome = get_with_policy("https://example.com/data", &instant_policy(max_retries), || {
            let n = calls.get();
            calls.set(n + 1);
            let status = statuses[n as usize];
            async move { Ok(attempt_with(status)) }
        })
        .await;
        (outcome, calls.get())
    }

    #[tokio::test]
    async fn test_success_first_try_makes_one_call() {
        let (outcome, calls) = run_script(&[200], 2).await;
        assert_eq!(calls, 1);
        assert_eq!(outcome.unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (outcome, calls) = run_script(&[503, 503, 200], 2).await;
        assert_eq!(calls, 3);
        assert_eq!(outcome.unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_retries_exhausted_yields_http_error() {
        let (outcome, calls) = run_script(&[503, 503, 503], 2).await;
        assert_eq!(calls, 3);
        match outcome {
            Err(Error::Http { status, url, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(url, "https://example.com/data");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let (outcome, calls) = run_script(&[404], 3).await;
        assert_eq!(calls, 1, "404 must not be retried");
        assert!(matches!(outcome, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_other_4xx_not_retried() {
        let (outcome, calls) = run_script(&[403], 3).await;
        assert_eq!(calls, 1);
        match outcome {
            Err(Error::Http { status, .. }) => assert_eq!(status, 403),
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_429_is_retried() {
        let (outcome, calls) = run_script(&[429, 200], 2).await;
        assert_eq!(calls, 2);
        assert_eq!(outcome.unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_network_errors_follow_retry_policy() {
        let calls = Cell::new(0_u32);
        let outcome = get_with_policy("https://example.com/x", &instant_policy(2), || {
            calls.set(calls.get() + 1);
            async {
                Err(Error::network(
                    "https://example.com/x",
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                ))
            }
        })
        .await;

        assert_eq!(calls.get(), 3);
        assert!(matches!(outcome, Err(Error::Network { .. })));
    }

    #[tokio::test]
    async fn test_network_error_then_success() {
        let calls = Cell::new(0_u32);
        let outcome = get_with_policy("https://example.com/x", &instant_policy(2), || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                if n == 0 {
                    Err(Error::network(
                        "https://example.com/x",
                        std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"),
                    ))
                } else {
                    Ok(attempt_with(200))
                }
            }
        })
        .await;

        assert_eq!(calls.get(), 2);
        assert_eq!(outcome.unwrap().status, 200);
    }

    #[test]
    fn test_backoff_is_exponential() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
        };
        assert_eq!(backoff_delay(&policy, 0), Duration::from_secs(2));
        assert_eq!(backoff_delay(&policy, 1), Duration::from_secs(4));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_after_preferred_for_429() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
        };
        let outcome: Result<Attempt, Error> = Ok(Attempt {
            status: 429,
            retry_after: Some(7),
            body: Bytes::new(),
        });
        match classify(&outcome, 0, &policy) {
            NextStep::Retry(delay) => assert_eq!(delay, Duration::from_secs(7)),
            _ => panic!("expected retry"),
        }
    }

    #[test]
    fn test_429_without_header_uses_backoff() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_secs(3),
        };
        let outcome: Result<Attempt, Error> = Ok(attempt_with(429));
        match classify(&outcome, 1, &policy) {
            NextStep::Retry(delay) => assert_eq!(delay, Duration::from_secs(6)),
            _ => panic!("expected retry"),
        }
    }

    #[test]
    fn test_parse_retry_after_header() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(parse_retry_after(&headers), Some(12));
    }

    #[test]
    fn test_parse_retry_after_missing_or_invalid() {
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.backoff_base, DEFAULT_BACKOFF_BASE);
    }
}
