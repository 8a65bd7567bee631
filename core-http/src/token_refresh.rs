//! Token-refresh interceptor.
//!
//! Upstreams occasionally reject tokens that still look valid locally
//! (clock skew, server-side revocation). When a 401 carries one of the
//! known expiry signatures, the interceptor forces a refresh through
//! the token provider and re-dispatches the request exactly once with
//! the new token. A second signature 401 means the credential itself
//! is bad and surfaces as an authentication error.

use async_trait::async_trait;
use connector_traits::{
    ConnectorError, HttpRequest, HttpResponse, HttpTransport, Result, TokenProvider,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Response-body fragments that identify a 401 as token expiry rather
/// than a genuine authorization problem.
const EXPIRY_SIGNATURES: &[&str] = &[
    "InvalidAuthenticationToken",
    "Lifetime validation failed",
    "token is expired",
    "Access token has expired",
];

pub struct TokenRefreshInterceptor {
    inner: Arc<dyn HttpTransport>,
    provider: Arc<dyn TokenProvider>,
}

impl TokenRefreshInterceptor {
    pub fn new(inner: Arc<dyn HttpTransport>, provider: Arc<dyn TokenProvider>) -> Self {
        Self { inner, provider }
    }

    fn is_expired_token_response(response: &HttpResponse) -> bool {
        if response.status != 401 {
            return false;
        }
        let body = response.text();
        EXPIRY_SIGNATURES.iter().any(|sig| body.contains(sig))
    }
}

#[async_trait]
impl HttpTransport for TokenRefreshInterceptor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let had_authorization = request.headers.contains_key("Authorization");
        let response = self.inner.execute(request.clone()).await?;

        if !had_authorization || !Self::is_expired_token_response(&response) {
            return Ok(response);
        }

        debug!(url = %request.url, "Upstream reported token expiry, refreshing");
        let token = self.provider.refresh().await?;
        let retried = request.bearer_token(token);
        let second = self.inner.execute(retried).await?;

        if Self::is_expired_token_response(&second) {
            warn!("Freshly refreshed token rejected by upstream");
            return Err(ConnectorError::Auth(
                "Upstream rejected a freshly refreshed token".to_string(),
            ));
        }
        Ok(second)
    }
}
