//! The composed resilient client.
//!
//! Stacks the interceptors in their canonical order around the wire
//! transport and attaches a bearer token to every authenticated
//! dispatch:
//!
//! ```text
//! redirect -> retry -> token refresh -> observe -> reqwest
//! ```
//!
//! Redirects sit outermost so every hop gets a full retry budget;
//! token refresh sits inside retry so retried attempts carry the
//! refreshed token.

use connector_traits::{
    HttpRequest, HttpResponse, HttpTransport, Result, RetryPolicy, TokenProvider,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::observe::ObservabilityInterceptor;
use crate::redirect::RedirectInterceptor;
use crate::retry::RetryInterceptor;
use crate::token_refresh::TokenRefreshInterceptor;
use crate::transport::{ReqwestTransport, TransportConfig};

#[derive(Debug, Clone, Default)]
pub struct ResilientClientConfig {
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

#[derive(Clone)]
pub struct ResilientClient {
    stack: Arc<dyn HttpTransport>,
    provider: Arc<dyn TokenProvider>,
}

impl ResilientClient {
    pub fn new(config: ResilientClientConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let base: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.transport)?);
        Ok(Self::from_transport(base, config.retry, provider))
    }

    /// Build the interceptor stack over an arbitrary base transport.
    pub fn from_transport(
        base: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
        provider: Arc<dyn TokenProvider>,
    ) -> Self {
        let observed: Arc<dyn HttpTransport> = Arc::new(ObservabilityInterceptor::new(base));
        let refreshed: Arc<dyn HttpTransport> =
            Arc::new(TokenRefreshInterceptor::new(observed, provider.clone()));
        let retried: Arc<dyn HttpTransport> =
            Arc::new(RetryInterceptor::with_policy(refreshed, retry));
        let stack: Arc<dyn HttpTransport> = Arc::new(RedirectInterceptor::new(retried));
        Self { stack, provider }
    }

    /// Dispatch with a bearer token from the provider. A request that
    /// already carries an `Authorization` header is sent as-is.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = if request.headers.contains_key("Authorization") {
            request
        } else {
            let token = self.provider.token().await?;
            request.bearer_token(token)
        };
        self.stack.execute(request).await
    }

    /// Dispatch without attaching a token. Used against pre-signed
    /// URLs where a bearer header would be rejected.
    pub async fn execute_unauthenticated(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.stack.execute(request).await
    }

    /// Dispatch, require a 2xx, and decode the JSON body.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(response.into_status_error());
        }
        response.json()
    }

    /// Dispatch and require a 2xx.
    pub async fn execute_success(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(response.into_status_error());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use connector_traits::{ConnectorError, HttpMethod};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct RecordingTransport {
        seen: Mutex<Vec<HttpRequest>>,
        status: u16,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().await.push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::from_static(b"{\"value\":7}"),
            })
        }
    }

    struct StaticProvider;

    #[async_trait]
    impl TokenProvider for StaticProvider {
        async fn token(&self) -> Result<String> {
            Ok("cached-token".to_string())
        }

        async fn refresh(&self) -> Result<String> {
            Ok("cached-token".to_string())
        }
    }

    fn client(status: u16) -> (ResilientClient, Arc<RecordingTransport>) {
        let base = Arc::new(RecordingTransport {
            seen: Mutex::new(Vec::new()),
            status,
        });
        let client = ResilientClient::from_transport(
            base.clone(),
            RetryPolicy::default(),
            Arc::new(StaticProvider),
        );
        (client, base)
    }

    #[tokio::test]
    async fn bearer_token_is_attached_to_authenticated_dispatch() {
        let (client, base) = client(200);
        client
            .execute(HttpRequest::new(HttpMethod::Get, "https://api.example.com/x"))
            .await
            .unwrap();

        let seen = base.seen.lock().await;
        assert_eq!(
            seen[0].headers.get("Authorization").unwrap(),
            "Bearer cached-token"
        );
    }

    #[tokio::test]
    async fn unauthenticated_dispatch_carries_no_token() {
        let (client, base) = client(200);
        client
            .execute_unauthenticated(HttpRequest::new(
                HttpMethod::Put,
                "https://storage.example.net/blob",
            ))
            .await
            .unwrap();

        let seen = base.seen.lock().await;
        assert!(!seen[0].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn execute_json_decodes_success_bodies() {
        #[derive(serde::Deserialize)]
        struct Payload {
            value: u32,
        }

        let (client, _) = client(200);
        let payload: Payload = client
            .execute_json(HttpRequest::new(HttpMethod::Get, "https://api.example.com/x"))
            .await
            .unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn execute_success_maps_failure_statuses() {
        let (client, _) = client(404);
        let err = client
            .execute_success(HttpRequest::new(HttpMethod::Get, "https://api.example.com/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Status { status: 404, .. }));
    }
}
