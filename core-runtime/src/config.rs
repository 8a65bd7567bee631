//! # Connector Configuration
//!
//! All settings the connector needs, loaded once at startup and
//! validated fail-fast before any upstream call is made.
//!
//! ## Overview
//!
//! The configuration is a plain JSON document with one section per
//! concern:
//!
//! - `source`: content source API endpoint, scan roots and ceilings
//! - `destination`: knowledge store endpoint and ownership metadata
//! - `auth`: one client-credentials principal per upstream
//! - `processing`: pipeline concurrency, stage timeouts, key mode
//! - `rate_limits`: reservoir sizes per upstream
//! - `logging`: level, format, optional filter override
//!
//! Every numeric field has a default tuned for the public quota of the
//! corresponding upstream; deployments override only what differs.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ConnectorConfig;
//!
//! let config = ConnectorConfig::from_file("/etc/kbsync/config.json")?;
//! config.validate()?;
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, RuntimeError};
use crate::logging::LoggingConfig;

/// How sync keys are derived for discovered items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// `{root_container_id}/{item_id}`: stable across renames and
    /// moves, so those arrive as metadata-only changes.
    #[default]
    ItemId,
    /// Normalized `{container_path}/{name}`: human-readable keys at
    /// the cost of re-ingesting moved items under a new key.
    Path,
}

/// Content source section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub base_url: String,
    /// Root containers to scan; each gets its own scan cycle.
    pub root_container_ids: Vec<String>,
    /// Hard item ceiling per scanned root container; the traversal
    /// stops cleanly after the page in progress when it is reached.
    #[serde(default = "defaults::max_items_per_scan")]
    pub max_items_per_scan: usize,
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
    /// Items larger than this are rejected before download.
    #[serde(default = "defaults::max_content_bytes")]
    pub max_content_bytes: u64,
    /// MIME types eligible for ingestion. Empty means everything.
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}

/// Destination knowledge store section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    pub base_url: String,
    /// Stable name identifying this connector instance in the
    /// destination's manifest.
    pub source_name: String,
    pub scope_id: String,
    #[serde(default = "defaults::owner_type")]
    pub owner_type: String,
    #[serde(default = "defaults::source_kind")]
    pub source_kind: String,
}

/// One client-credentials principal.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Seconds before actual expiry at which a cached token is
    /// treated as stale.
    #[serde(default = "defaults::expiry_buffer_secs")]
    pub expiry_buffer_secs: i64,
}

impl std::fmt::Display for PrincipalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret must never reach log output.
        write!(f, "PrincipalConfig {{ client_id: {} }}", self.client_id)
    }
}

/// Authentication section, one principal per upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub source: PrincipalConfig,
    pub destination: PrincipalConfig,
}

/// Processing pipeline section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Items processed concurrently per batch.
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,
    /// Per-stage deadline in seconds.
    #[serde(default = "defaults::stage_timeout_secs")]
    pub stage_timeout_secs: u64,
    #[serde(default)]
    pub key_mode: KeyMode,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::concurrency(),
            stage_timeout_secs: defaults::stage_timeout_secs(),
            key_mode: KeyMode::default(),
        }
    }
}

/// Reservoir settings for one upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservoirConfig {
    pub capacity: u32,
    pub refill_interval_ms: u64,
}

/// Rate limit section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    #[serde(default = "defaults::source_reservoir")]
    pub source: ReservoirConfig,
    #[serde(default = "defaults::destination_reservoir")]
    pub destination: ReservoirConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            source: defaults::source_reservoir(),
            destination: defaults::destination_reservoir(),
        }
    }
}

/// Top-level connector configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConnectorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RuntimeError::Config(format!(
                "Cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| RuntimeError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast validation of everything the deserializer cannot
    /// express.
    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.is_empty() {
            return Err(RuntimeError::Config(
                "source.base_url cannot be empty".to_string(),
            ));
        }
        if self.source.root_container_ids.is_empty() {
            return Err(RuntimeError::Config(
                "source.root_container_ids requires at least one container".to_string(),
            ));
        }
        if self.source.max_items_per_scan == 0 {
            return Err(RuntimeError::Config(
                "source.max_items_per_scan must be greater than 0".to_string(),
            ));
        }
        if self.source.page_size == 0 {
            return Err(RuntimeError::Config(
                "source.page_size must be greater than 0".to_string(),
            ));
        }
        if self.destination.base_url.is_empty() {
            return Err(RuntimeError::Config(
                "destination.base_url cannot be empty".to_string(),
            ));
        }
        if self.destination.source_name.is_empty() {
            return Err(RuntimeError::Config(
                "destination.source_name cannot be empty".to_string(),
            ));
        }
        for (label, principal) in [
            ("auth.source", &self.auth.source),
            ("auth.destination", &self.auth.destination),
        ] {
            if principal.token_url.is_empty() {
                return Err(RuntimeError::Config(format!(
                    "{}.token_url cannot be empty",
                    label
                )));
            }
            if principal.client_id.is_empty() || principal.client_secret.is_empty() {
                return Err(RuntimeError::Config(format!(
                    "{} requires client_id and client_secret",
                    label
                )));
            }
            if principal.expiry_buffer_secs < 0 {
                return Err(RuntimeError::Config(format!(
                    "{}.expiry_buffer_secs cannot be negative",
                    label
                )));
            }
        }
        if self.processing.concurrency == 0 {
            return Err(RuntimeError::Config(
                "processing.concurrency must be greater than 0".to_string(),
            ));
        }
        if self.processing.stage_timeout_secs == 0 {
            return Err(RuntimeError::Config(
                "processing.stage_timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (label, reservoir) in [
            ("rate_limits.source", &self.rate_limits.source),
            ("rate_limits.destination", &self.rate_limits.destination),
        ] {
            if reservoir.capacity == 0 {
                return Err(RuntimeError::Config(format!(
                    "{}.capacity must be greater than 0",
                    label
                )));
            }
            if reservoir.refill_interval_ms == 0 {
                return Err(RuntimeError::Config(format!(
                    "{}.refill_interval_ms must be greater than 0",
                    label
                )));
            }
        }
        Ok(())
    }
}

mod defaults {
    use super::ReservoirConfig;

    pub fn max_items_per_scan() -> usize {
        50_000
    }

    pub fn page_size() -> u32 {
        200
    }

    pub fn max_content_bytes() -> u64 {
        // 100 MiB
        100 * 1024 * 1024
    }

    pub fn expiry_buffer_secs() -> i64 {
        60
    }

    pub fn owner_type() -> String {
        "SCOPE".to_string()
    }

    pub fn source_kind() -> String {
        "MICROSOFT_365_SHAREPOINT".to_string()
    }

    pub fn concurrency() -> usize {
        4
    }

    pub fn stage_timeout_secs() -> u64 {
        60
    }

    pub fn source_reservoir() -> ReservoirConfig {
        ReservoirConfig {
            capacity: 100,
            refill_interval_ms: 10_000,
        }
    }

    pub fn destination_reservoir() -> ReservoirConfig {
        ReservoirConfig {
            capacity: 50,
            refill_interval_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> String {
        r#"{
            "source": {
                "base_url": "https://graph.example.com/v1.0",
                "root_container_ids": ["drive-1"]
            },
            "destination": {
                "base_url": "https://ingest.example.com/api",
                "source_name": "sharepoint-main",
                "scope_id": "scope-42"
            },
            "auth": {
                "source": {
                    "token_url": "https://login.example.com/token",
                    "client_id": "src-id",
                    "client_secret": "src-secret",
                    "scopes": ["https://graph.example.com/.default"]
                },
                "destination": {
                    "token_url": "https://id.example.com/token",
                    "client_id": "dst-id",
                    "client_secret": "dst-secret"
                }
            }
        }"#
        .to_string()
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config = ConnectorConfig::from_json(&minimal_config()).unwrap();
        assert_eq!(config.processing.concurrency, 4);
        assert_eq!(config.auth.source.expiry_buffer_secs, 60);
        assert_eq!(config.processing.key_mode, KeyMode::ItemId);
        assert_eq!(config.source.page_size, 200);
        assert_eq!(config.rate_limits.source.capacity, 100);
    }

    #[test]
    fn empty_root_containers_are_rejected() {
        let raw = minimal_config().replace(r#"["drive-1"]"#, "[]");
        let err = ConnectorConfig::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("root_container_ids"));
    }

    #[test]
    fn missing_client_secret_is_rejected() {
        let raw = minimal_config().replace(r#""client_secret": "dst-secret""#, r#""client_secret": """#);
        let err = ConnectorConfig::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("auth.destination"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let raw = minimal_config().replace(
            r#""auth""#,
            r#""processing": {"concurrency": 0}, "auth""#,
        );
        let err = ConnectorConfig::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = minimal_config().replace(r#""scope_id""#, r#""scope_idd""#);
        assert!(ConnectorConfig::from_json(&raw).is_err());
    }

    #[test]
    fn key_mode_parses_from_snake_case() {
        let raw = minimal_config().replace(
            r#""auth""#,
            r#""processing": {"key_mode": "path"}, "auth""#,
        );
        let config = ConnectorConfig::from_json(&raw).unwrap();
        assert_eq!(config.processing.key_mode, KeyMode::Path);
    }

    #[test]
    fn principal_display_hides_secret() {
        let config = ConnectorConfig::from_json(&minimal_config()).unwrap();
        let rendered = config.auth.source.to_string();
        assert!(!rendered.contains("src-secret"));
    }
}
