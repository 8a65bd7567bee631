//! Retry interceptor with capped exponential backoff.
//!
//! Re-issues requests that failed transiently: connect errors,
//! timeouts, and the throttle/outage statuses (429, 502, 503, 504).
//! Non-idempotent requests are never retried unless explicitly opted
//! in, since the first attempt may have reached the server.

use async_trait::async_trait;
use connector_traits::{HttpRequest, HttpResponse, HttpTransport, Result, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct RetryInterceptor {
    inner: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl RetryInterceptor {
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    fn retryable_status(status: u16) -> bool {
        matches!(status, 429 | 502 | 503 | 504)
    }

    /// Server-provided backoff wins over the computed one when it is a
    /// plain delay in seconds.
    fn backoff_for(&self, response: Option<&HttpResponse>, retry: u32) -> Duration {
        if let Some(seconds) = response
            .and_then(|r| r.header("Retry-After"))
            .and_then(|v| v.parse::<u64>().ok())
        {
            return Duration::from_secs(seconds).min(self.policy.max_delay);
        }
        self.policy.delay_for(retry)
    }
}

#[async_trait]
impl HttpTransport for RetryInterceptor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        if !request.is_retryable() {
            return self.inner.execute(request).await;
        }

        let mut attempt = 1;
        loop {
            let outcome = self.inner.execute(request.clone()).await;

            let (should_retry, response) = match &outcome {
                Ok(response) => (Self::retryable_status(response.status), Some(response)),
                Err(err) => (err.is_transient(), None),
            };
            if !should_retry || attempt >= self.policy.max_attempts {
                if should_retry {
                    warn!(
                        url = %request.url,
                        attempts = attempt,
                        "Retry budget exhausted"
                    );
                }
                return outcome;
            }

            let delay = self.backoff_for(response, attempt);
            match &outcome {
                Ok(response) => debug!(
                    url = %request.url,
                    status = response.status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after transient status"
                ),
                Err(err) => debug!(
                    url = %request.url,
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after transient error"
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
