//! # HTTP Core
//!
//! Resilient HTTP plumbing shared by every upstream client.
//!
//! ## Overview
//!
//! - **Transport** (`transport`): single wire exchange over `reqwest`,
//!   automatic redirect following disabled
//! - **Interceptors** (`redirect`, `retry`, `token_refresh`,
//!   `observe`): `HttpTransport` decorators, each wrapping an inner
//!   transport
//! - **Client** (`client`): the composed stack in its canonical order
//! - **Rate Limiter** (`rate_limiter`): shared reservoir limiter for
//!   upstream quota ceilings
//!
//! Decorator order matters and is fixed in [`client::ResilientClient`]:
//! redirect hops sit outside retry so each hop gets its own retry
//! budget, and token refresh sits inside retry so a refreshed token is
//! what gets retried.

pub mod client;
pub mod observe;
pub mod rate_limiter;
pub mod redirect;
pub mod retry;
pub mod token_refresh;
pub mod transport;

pub use client::{ResilientClient, ResilientClientConfig};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use transport::{ReqwestTransport, TransportConfig};
