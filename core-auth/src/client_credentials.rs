//! OAuth 2.0 `client_credentials` grant.
//!
//! Mints app-only credentials from an identity provider token
//! endpoint. Client authentication uses the HTTP Basic scheme; the
//! secret never appears in the form body or in log output.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use connector_traits::{
    Credential, CredentialSource, HttpMethod, HttpRequest, HttpTransport, Result,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::AuthError;

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one client-credentials principal.
#[derive(Debug, Clone)]
pub struct ClientCredentialsConfig {
    /// Identity provider token endpoint.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// OAuth scopes, joined with spaces on the wire.
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

/// [`CredentialSource`] backed by the `client_credentials` grant.
pub struct ClientCredentialsSource {
    transport: Arc<dyn HttpTransport>,
    config: ClientCredentialsConfig,
}

impl ClientCredentialsSource {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ClientCredentialsConfig) -> Self {
        Self { transport, config }
    }

    fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.config.client_id, self.config.client_secret);
        format!("Basic {}", BASE64.encode(raw))
    }

    fn form_body(&self) -> std::result::Result<String, AuthError> {
        let params = [
            ("grant_type", "client_credentials".to_string()),
            ("scope", self.config.scopes.join(" ")),
        ];
        serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::AcquisitionFailed(format!("Form encoding failed: {e}")))
    }

    fn parse_response(body: &TokenResponse) -> std::result::Result<Credential, AuthError> {
        if body.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "Missing or empty access_token".to_string(),
            ));
        }
        if body.expires_in <= 0 {
            return Err(AuthError::InvalidTokenResponse(format!(
                "Non-positive expires_in: {}",
                body.expires_in
            )));
        }
        Ok(Credential::with_lifetime(
            body.access_token.clone(),
            body.expires_in,
        ))
    }
}

#[async_trait]
impl CredentialSource for ClientCredentialsSource {
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    async fn acquire(&self) -> Result<Credential> {
        let request = HttpRequest::new(HttpMethod::Post, &self.config.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Authorization", self.basic_auth_header())
            .header("Accept", "application/json")
            .body(Bytes::from(self.form_body()?))
            .timeout(TOKEN_REQUEST_TIMEOUT)
            // Token requests have no side effects worth protecting.
            .idempotent();

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(AuthError::TokenEndpoint {
                status: response.status,
                message: response.text(),
            }
            .into());
        }

        let body: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;
        let credential = Self::parse_response(&body)?;
        debug!(expires_at = %credential.expires_at, "Client credentials grant succeeded");
        Ok(credential)
    }
}
