//! Request observability interceptor.
//!
//! Sits directly above the wire transport so recorded durations cover
//! a single exchange, not the whole retry/redirect envelope.

use async_trait::async_trait;
use connector_traits::{HttpRequest, HttpResponse, HttpTransport, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ObservabilityInterceptor {
    inner: Arc<dyn HttpTransport>,
}

impl ObservabilityInterceptor {
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self { inner }
    }
}

/// Upstream throttle signals: an explicit 429, a 503 carrying
/// `Retry-After`, or a rate-limit header reporting an exhausted quota.
fn is_throttled(response: &HttpResponse) -> bool {
    if response.status == 429 {
        return true;
    }
    if response.status == 503 && response.header("Retry-After").is_some() {
        return true;
    }
    matches!(
        response.header("x-ratelimit-remaining"),
        Some(remaining) if remaining.trim() == "0"
    )
}

#[async_trait]
impl HttpTransport for ObservabilityInterceptor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();
        let started = Instant::now();

        let outcome = self.inner.execute(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(response) if is_throttled(response) => {
                warn!(
                    ?method,
                    %url,
                    elapsed_ms,
                    status = response.status,
                    retry_after = response.header("Retry-After").unwrap_or("-"),
                    "Upstream throttled request"
                );
            }
            Ok(response) if response.status >= 400 => {
                warn!(?method, %url, status = response.status, elapsed_ms, "Request failed");
            }
            Ok(response) => {
                debug!(?method, %url, status = response.status, elapsed_ms, "Request completed");
            }
            Err(err) => {
                warn!(?method, %url, elapsed_ms, error = %err, "Request errored");
            }
        }
        outcome
    }
}
