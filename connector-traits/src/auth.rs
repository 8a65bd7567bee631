//! Credential Acquisition Seams
//!
//! `CredentialSource` abstracts how a credential is minted (client
//! secret, certificate, workload identity); `TokenProvider` abstracts
//! how callers obtain a currently-valid token. The token cache sits
//! between the two.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;

/// A borrowed bearer credential with its expiry.
///
/// Owned exclusively by one token cache per (principal, scope) pair;
/// refreshed in place, never copied out beyond the token string.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Build a credential from an OAuth-style `expires_in` lifetime.
    pub fn with_lifetime(token: impl Into<String>, expires_in_secs: i64) -> Self {
        Self::new(token, Utc::now() + Duration::seconds(expires_in_secs))
    }

    /// Whether the credential is still valid for at least
    /// `buffer_secs` beyond now. A credential failing this check is
    /// never handed out.
    pub fn is_valid_with_buffer(&self, buffer_secs: i64) -> bool {
        self.expires_at > Utc::now() + Duration::seconds(buffer_secs)
    }
}

/// Acquires a fresh credential from an identity provider.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> Result<Credential>;
}

/// Hands out currently-valid tokens and supports a forced refresh
/// after an upstream rejected one.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A token valid for at least the configured safety buffer.
    async fn token(&self) -> Result<String>;

    /// Discard any cached credential and acquire a new one. Used by
    /// the 401 interceptor when an upstream reports token expiry.
    async fn refresh(&self) -> Result<String>;
}
