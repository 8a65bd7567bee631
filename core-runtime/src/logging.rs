//! # Logging & Tracing Infrastructure
//!
//! Structured logging over the `tracing` crate:
//! - Pretty, JSON, and compact output formats
//! - Module-level filtering via `EnvFilter`, overridable per deploy
//! - Sensitive-field redaction helper for manual log construction
//!
//! Call [`init_logging`] exactly once during startup, before the first
//! upstream request.

use serde::Deserialize;
use std::io;
use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{Result, RuntimeError};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Minimum level for connector crates ("trace" through "error").
    #[serde(default = "default_level")]
    pub level: String,
    /// Full filter override (e.g. "core_http=trace,provider_graph=debug").
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "default_true")]
    pub display_target: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            filter: None,
            display_target: true,
        }
    }
}

/// Initialize the logging system.
///
/// Subsequent calls return an error; the first subscriber wins.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let registry = tracing_subscriber::registry().with(filter);
    let init_result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_writer(io::stdout),
            )
            .try_init(),
    };

    init_result.map_err(|e| RuntimeError::Logging(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Connector crates at the configured level, noisy transport
        // dependencies pinned to warn.
        let level = &config.level;
        format!(
            "connector_traits={level},core_auth={level},core_http={level},\
             core_runtime={level},core_ingest={level},core_pipeline={level},\
             provider_graph={level},h2=warn,hyper=warn,reqwest=warn"
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| RuntimeError::Logging(format!("Invalid log filter: {}", e)))
}

/// Redact sensitive values when manually constructing log entries.
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(token = %redact_if_sensitive("token", token), "Retrieved token");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "access_token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_pins_transport_noise_to_warn() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        let filter = build_filter(&config).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("core_http=debug"));
        assert!(rendered.contains("hyper=warn"));
    }

    #[test]
    fn custom_filter_wins_over_level() {
        let config = LoggingConfig {
            filter: Some("provider_graph=trace".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("provider_graph=trace"));
    }

    #[test]
    fn sensitive_fields_are_redacted() {
        assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("item_id", "abc"), "abc");
    }

    #[test]
    fn logging_config_parses_from_json() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"format": "json", "level": "debug"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
    }
}
