//! Redirect-following interceptor.
//!
//! Follows up to a fixed number of hops, resolving relative
//! `Location` targets against the current URL. On a cross-origin hop
//! the `Authorization` header is stripped so a bearer token never
//! leaks to a host it was not minted for; pre-signed storage URLs rely
//! on this.

use async_trait::async_trait;
use connector_traits::{
    ConnectorError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, Result,
};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

const MAX_REDIRECT_HOPS: u32 = 5;

pub struct RedirectInterceptor {
    inner: Arc<dyn HttpTransport>,
    max_hops: u32,
}

impl RedirectInterceptor {
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner,
            max_hops: MAX_REDIRECT_HOPS,
        }
    }

    fn resolve_location(current_url: &str, location: &str) -> Result<Url> {
        let base = Url::parse(current_url)
            .map_err(|e| ConnectorError::InvalidResponse(format!("Invalid request URL: {e}")))?;
        base.join(location).map_err(|e| {
            ConnectorError::InvalidResponse(format!("Invalid redirect location {location:?}: {e}"))
        })
    }

    fn same_origin(a: &Url, b: &Url) -> bool {
        a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
    }

    /// Build the follow-up request for one hop. A 303, or a 301/302
    /// answering a POST, downgrades to a body-less GET; 307/308
    /// preserve method and body.
    fn next_request(request: &HttpRequest, status: u16, target: &Url) -> HttpRequest {
        let downgrade_to_get = status == 303
            || (matches!(status, 301 | 302) && request.method == HttpMethod::Post);

        let mut next = request.clone();
        next.url = target.to_string();
        if downgrade_to_get {
            next.method = HttpMethod::Get;
            next.body = None;
            next.headers.remove("Content-Type");
            next.headers.remove("Content-Length");
        }

        let current = Url::parse(&request.url).ok();
        let cross_origin = current
            .map(|c| !Self::same_origin(&c, target))
            .unwrap_or(true);
        if cross_origin {
            let removed = next.headers.remove("Authorization").is_some();
            if removed {
                debug!(host = ?target.host_str(), "Stripped Authorization on cross-origin redirect");
            }
        }
        next
    }
}

#[async_trait]
impl HttpTransport for RedirectInterceptor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut current = request;
        let mut hops = 0;

        loop {
            let response = self.inner.execute(current.clone()).await?;
            if !response.is_redirect() {
                return Ok(response);
            }

            hops += 1;
            if hops > self.max_hops {
                warn!(url = %current.url, "Redirect chain exceeded {} hops", self.max_hops);
                return Err(ConnectorError::OperationFailed(format!(
                    "Redirect chain exceeded {} hops",
                    self.max_hops
                )));
            }

            let location = response.header("Location").ok_or_else(|| {
                ConnectorError::InvalidResponse(format!(
                    "Redirect status {} without a Location header",
                    response.status
                ))
            })?;
            let target = Self::resolve_location(&current.url, location)?;
            debug!(status = response.status, target = %target, hop = hops, "Following redirect");
            current = Self::next_request(&current, response.status, &target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct ScriptedTransport {
        responses: Mutex<Vec<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        /// Responses are served in the order given.
        fn new(mut responses: Vec<HttpResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().await.push(request);
            self.responses
                .lock()
                .await
                .pop()
                .ok_or_else(|| ConnectorError::OperationFailed("script exhausted".into()))
        }
    }

    fn redirect_to(status: u16, location: &str) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("Location".to_string(), location.to_string());
        HttpResponse {
            status,
            headers,
            body: Bytes::new(),
        }
    }

    fn ok() -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"done"),
        }
    }

    #[tokio::test]
    async fn follows_relative_redirect_same_origin() {
        let inner = ScriptedTransport::new(vec![redirect_to(302, "/v2/resource"), ok()]);
        let interceptor = RedirectInterceptor::new(inner.clone());

        let request =
            HttpRequest::new(HttpMethod::Get, "https://api.example.com/v1/resource")
                .bearer_token("tok");
        let response = interceptor.execute(request).await.unwrap();
        assert_eq!(response.status, 200);

        let seen = inner.seen.lock().await;
        assert_eq!(seen[1].url, "https://api.example.com/v2/resource");
        assert!(seen[1].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn strips_authorization_on_cross_origin_hop() {
        let inner = ScriptedTransport::new(vec![
            redirect_to(302, "https://storage.example.net/blob/abc"),
            ok(),
        ]);
        let interceptor = RedirectInterceptor::new(inner.clone());

        let request =
            HttpRequest::new(HttpMethod::Get, "https://api.example.com/file").bearer_token("tok");
        interceptor.execute(request).await.unwrap();

        let seen = inner.seen.lock().await;
        assert!(!seen[1].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn see_other_downgrades_post_to_get() {
        let inner = ScriptedTransport::new(vec![redirect_to(303, "/status/42"), ok()]);
        let interceptor = RedirectInterceptor::new(inner.clone());

        let request = HttpRequest::new(HttpMethod::Post, "https://api.example.com/jobs")
            .body(Bytes::from_static(b"payload"));
        interceptor.execute(request).await.unwrap();

        let seen = inner.seen.lock().await;
        assert_eq!(seen[1].method, HttpMethod::Get);
        assert!(seen[1].body.is_none());
    }

    #[tokio::test]
    async fn redirect_loop_is_bounded() {
        let hops: Vec<_> = (0..10).map(|_| redirect_to(302, "/loop")).collect();
        let inner = ScriptedTransport::new(hops);
        let interceptor = RedirectInterceptor::new(inner.clone());

        let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/loop");
        let err = interceptor.execute(request).await.unwrap_err();
        assert!(err.to_string().contains("exceeded"));
        assert_eq!(inner.seen.lock().await.len(), 6);
    }

    #[tokio::test]
    async fn redirect_without_location_is_invalid() {
        let bare = HttpResponse {
            status: 302,
            headers: HashMap::new(),
            body: Bytes::new(),
        };
        let inner = ScriptedTransport::new(vec![bare]);
        let interceptor = RedirectInterceptor::new(inner);

        let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/x");
        let err = interceptor.execute(request).await.unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidResponse(_)));
    }
}
