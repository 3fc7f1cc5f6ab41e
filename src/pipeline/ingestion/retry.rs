use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{HttpClientPort, SourcePort};
use crate::config::Config;
use crate::constants::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::domain::SourceKind;
use crate::error::{CleanupError, Result};
use crate::observability::metrics;

/// Bounded retry with linear backoff: the wait after attempt `k` is
/// `base_delay * k`, and there is no wait after the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            base_delay: config.base_delay(),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Result of a single attempt against a source.
#[derive(Debug)]
enum AttemptOutcome {
    Success(Value),
    Failure(CleanupError),
}

/// Fetches a source's JSON payload over HTTP, retrying transient failures
/// (503, 401, transport errors) and failing fast on any other non-2xx.
pub struct RetryingSourceFetcher {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
    policy: RetryPolicy,
}

impl RetryingSourceFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            policy,
        }
    }

    pub fn from_config(http: Arc<dyn HttpClientPort>, config: &Config) -> Self {
        Self::new(http, config.sources.base_url.clone(), RetryPolicy::from_config(config))
    }

    pub fn url_for(&self, source: SourceKind) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), source.route())
    }

    #[instrument(skip_all, fields(source = %source))]
    pub async fn fetch_with_retry(&self, source: SourceKind) -> Result<Value> {
        let url = self.url_for(source);
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(source, &url).await {
                AttemptOutcome::Success(payload) => {
                    if attempt > 1 {
                        info!(attempt, "Source fetch succeeded after retry");
                    }
                    return Ok(payload);
                }
                AttemptOutcome::Failure(err) if err.is_retryable() && attempt < attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "retry {}/{} after error: {} (sleep {:?})",
                        attempt, attempts, err, delay
                    );
                    metrics::sources::retry(source.name(), err.retry_reason());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                AttemptOutcome::Failure(err) => {
                    warn!(attempt, error = %err, "Source fetch failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, source: SourceKind, url: &str) -> AttemptOutcome {
        metrics::sources::attempt(source.name());
        let started = Instant::now();

        let response = match self.http.get(url).await {
            Ok(response) => response,
            Err(err) => {
                metrics::sources::request_error(source.name());
                return AttemptOutcome::Failure(err);
            }
        };

        if !response.is_success() {
            metrics::sources::request_error(source.name());
            return AttemptOutcome::Failure(CleanupError::from_status(response.status));
        }

        metrics::sources::request_success(source.name());
        metrics::sources::request_duration(source.name(), started.elapsed().as_secs_f64());
        metrics::sources::payload_bytes(source.name(), response.bytes.len());
        debug!(
            status = response.status,
            bytes = response.bytes.len(),
            content_type = %response.content_type,
            "Source responded"
        );

        match serde_json::from_slice(&response.bytes) {
            Ok(payload) => AttemptOutcome::Success(payload),
            Err(e) => AttemptOutcome::Failure(CleanupError::InvalidPayload {
                source_name: source.name().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl SourcePort for RetryingSourceFetcher {
    async fn fetch(&self, source: SourceKind) -> Result<Value> {
        self.fetch_with_retry(source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of responses and records requested URLs
    struct ScriptedHttp {
        responses: Mutex<VecDeque<Result<HttpGetResult>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<Result<HttpGetResult>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClientPort for ScriptedHttp {
        async fn get(&self, url: &str) -> Result<HttpGetResult> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(status(500)))
        }
    }

    fn status(code: u16) -> HttpGetResult {
        HttpGetResult {
            status: code,
            bytes: Vec::new(),
            content_type: "text/plain".into(),
        }
    }

    fn ok_json(value: Value) -> HttpGetResult {
        HttpGetResult {
            status: 200,
            bytes: serde_json::to_vec(&value).unwrap(),
            content_type: "application/json".into(),
        }
    }

    fn fast_fetcher(http: Arc<ScriptedHttp>) -> RetryingSourceFetcher {
        RetryingSourceFetcher::new(
            http,
            "http://mock.local/",
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
    }

    #[test]
    fn test_url_joins_route_onto_base() {
        let fetcher = fast_fetcher(Arc::new(ScriptedHttp::new(vec![])));
        assert_eq!(fetcher.url_for(SourceKind::Identity), "http://mock.local/api/okta/users");
        assert_eq!(fetcher.url_for(SourceKind::Collab), "http://mock.local/api/slack/activity");
        assert_eq!(fetcher.url_for(SourceKind::Mail), "http://mock.local/api/google/logins");
    }

    #[tokio::test]
    async fn test_recovers_after_two_503s() {
        let payload = json!({"data": [{"email": "a@x.com"}]});
        let http = Arc::new(ScriptedHttp::new(vec![
            Ok(status(503)),
            Ok(status(503)),
            Ok(ok_json(payload.clone())),
        ]));
        let fetcher = fast_fetcher(http.clone());

        let result = fetcher.fetch_with_retry(SourceKind::Collab).await.unwrap();
        assert_eq!(result, payload);
        assert_eq!(http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_401_and_network_errors_are_retried() {
        let http = Arc::new(ScriptedHttp::new(vec![
            Ok(status(401)),
            Err(CleanupError::Network("connection reset".into())),
            Ok(ok_json(json!({"data": []}))),
        ]));
        let fetcher = fast_fetcher(http.clone());

        assert!(fetcher.fetch(SourceKind::Identity).await.is_ok());
        assert_eq!(http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_404_fails_immediately() {
        let http = Arc::new(ScriptedHttp::new(vec![
            Ok(status(404)),
            Ok(ok_json(json!({"data": []}))),
        ]));
        let fetcher = fast_fetcher(http.clone());

        let err = fetcher.fetch_with_retry(SourceKind::Mail).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404");
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let http = Arc::new(ScriptedHttp::new(vec![
            Err(CleanupError::Network("timed out".into())),
            Ok(status(503)),
            Ok(status(401)),
            Ok(ok_json(json!({"data": []}))),
        ]));
        let fetcher = fast_fetcher(http.clone());

        let err = fetcher.fetch_with_retry(SourceKind::Identity).await.unwrap_err();
        assert_eq!(err.to_string(), "Retryable error (401)");
        assert_eq!(http.call_count(), 3);
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_retried() {
        let http = Arc::new(ScriptedHttp::new(vec![Ok(HttpGetResult {
            status: 200,
            bytes: b"<html>oops</html>".to_vec(),
            content_type: "text/html".into(),
        })]));
        let fetcher = fast_fetcher(http.clone());

        let err = fetcher.fetch_with_retry(SourceKind::Collab).await.unwrap_err();
        assert!(matches!(err, CleanupError::InvalidPayload { .. }));
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_never_sleeps() {
        let http = Arc::new(ScriptedHttp::new(vec![Ok(status(503))]));
        let fetcher = RetryingSourceFetcher::new(
            http.clone(),
            "http://mock.local",
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_secs(60),
            },
        );

        let started = Instant::now();
        assert!(fetcher.fetch_with_retry(SourceKind::Collab).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_sleeps_500ms_then_1000ms() {
        let http = Arc::new(ScriptedHttp::new(vec![
            Ok(status(503)),
            Ok(status(503)),
            Ok(status(503)),
        ]));
        let fetcher = RetryingSourceFetcher::new(http.clone(), "http://mock.local", RetryPolicy::default());

        let started = tokio::time::Instant::now();
        let err = fetcher.fetch_with_retry(SourceKind::Collab).await.unwrap_err();

        // 500ms after attempt 1, 1000ms after attempt 2, nothing after attempt 3
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Retryable error (503)");
        assert_eq!(http.call_count(), 3);
    }
}
