//! # Runtime Core
//!
//! Process-level concerns shared by every connector crate:
//! configuration loading and validation, and logging initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    AuthConfig, ConnectorConfig, DestinationConfig, KeyMode, PrincipalConfig, ProcessingConfig,
    RateLimitConfig, ReservoirConfig, SourceConfig,
};
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
