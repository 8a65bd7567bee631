//! # Authentication Core
//!
//! Token caching and credential acquisition for the connector's two
//! principals (source API and destination API).
//!
//! ## Overview
//!
//! - **Token Cache** (`token_cache`): per-(principal, scope) credential
//!   slot with race-free single-flight renewal and an expiry safety
//!   buffer
//! - **Client Credentials** (`client_credentials`): OAuth 2.0
//!   `client_credentials` grant against an identity provider
//!
//! Each upstream the connector talks to gets its own `TokenCache`
//! constructed at process start; there is no module-level global
//! state.

pub mod client_credentials;
pub mod error;
pub mod token_cache;

pub use client_credentials::{ClientCredentialsConfig, ClientCredentialsSource};
pub use error::{AuthError, Result};
pub use token_cache::TokenCache;
