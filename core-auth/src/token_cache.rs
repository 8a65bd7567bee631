//! Per-principal token cache with single-flight renewal.
//!
//! The cache holds at most one credential and at most one in-flight
//! acquisition. Callers arriving while a renewal is underway await the
//! same memoized future instead of issuing their own token request, so
//! any number of concurrent consumers produce exactly one round trip
//! to the identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use connector_traits::{Credential, CredentialSource, Result, TokenProvider};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Default seconds a credential must remain valid beyond now before
/// the cache will hand it out.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

type SharedAcquisition = Shared<BoxFuture<'static, Result<Credential>>>;

#[derive(Default)]
struct CacheState {
    credential: Option<Credential>,
    in_flight: Option<SharedAcquisition>,
}

struct Inner {
    source: Arc<dyn CredentialSource>,
    expiry_buffer_secs: i64,
    /// Short name carried into log lines; tokens themselves are never
    /// logged.
    principal: String,
    state: Mutex<CacheState>,
}

/// Race-free cache in front of a [`CredentialSource`].
///
/// One instance per (principal, scope) pair, constructed at process
/// start and shared via `Arc`. Cloning shares the same slot.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<Inner>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn CredentialSource>, principal: impl Into<String>) -> Self {
        Self::with_buffer(source, principal, DEFAULT_EXPIRY_BUFFER_SECS)
    }

    pub fn with_buffer(
        source: Arc<dyn CredentialSource>,
        principal: impl Into<String>,
        expiry_buffer_secs: i64,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                expiry_buffer_secs,
                principal: principal.into(),
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// A token valid for at least the configured buffer.
    ///
    /// Returns the cached token when it is still comfortably valid,
    /// otherwise joins (or starts) the single in-flight acquisition.
    #[instrument(skip(self), fields(principal = %self.inner.principal))]
    pub async fn get_token(&self) -> Result<String> {
        let acquisition = {
            let mut state = self.inner.state.lock().await;
            if let Some(credential) = &state.credential {
                if credential.is_valid_with_buffer(self.inner.expiry_buffer_secs) {
                    return Ok(credential.token.clone());
                }
                debug!("Cached credential expired or within buffer, renewing");
            }
            Self::join_or_start(&self.inner, &mut state)
        };

        acquisition.await.map(|credential| credential.token)
    }

    /// Discard the cached credential and acquire a fresh one.
    ///
    /// Used after an upstream rejected a token that looked valid
    /// locally (clock skew, server-side revocation). If a renewal is
    /// already in flight its result is reused rather than discarded.
    #[instrument(skip(self), fields(principal = %self.inner.principal))]
    pub async fn force_refresh(&self) -> Result<String> {
        let acquisition = {
            let mut state = self.inner.state.lock().await;
            state.credential = None;
            Self::join_or_start(&self.inner, &mut state)
        };

        acquisition.await.map(|credential| credential.token)
    }

    /// Caller must hold the state lock. Returns the in-flight
    /// acquisition, starting one if none exists.
    fn join_or_start(inner: &Arc<Inner>, state: &mut CacheState) -> SharedAcquisition {
        if let Some(in_flight) = &state.in_flight {
            debug!("Joining in-flight token acquisition");
            return in_flight.clone();
        }

        debug!("Starting token acquisition");
        let acquisition = Self::acquire(inner.clone()).boxed().shared();
        state.in_flight = Some(acquisition.clone());
        acquisition
    }

    /// The memoized acquisition. Settles the cache state before
    /// resolving so that by the time any waiter observes the result,
    /// the in-flight slot is already cleared.
    async fn acquire(inner: Arc<Inner>) -> Result<Credential> {
        let result = inner.source.acquire().await;

        let mut state = inner.state.lock().await;
        state.in_flight = None;
        match result {
            Ok(credential) => {
                state.credential = Some(credential.clone());
                debug!(expires_at = %credential.expires_at, "Token acquired");
                Ok(credential)
            }
            Err(err) => {
                // A failed renewal must not leave a poisoned memo; the
                // next caller gets a clean attempt.
                state.credential = None;
                warn!(error = %err, "Token acquisition failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn token(&self) -> Result<String> {
        self.get_token().await
    }

    async fn refresh(&self) -> Result<String> {
        self.force_refresh().await
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("principal", &self.inner.principal)
            .field("expiry_buffer_secs", &self.inner.expiry_buffer_secs)
            .finish()
    }
}
