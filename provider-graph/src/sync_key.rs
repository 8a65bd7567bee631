//! Sync-key and fingerprint derivation.
//!
//! The same key identifies an item in the diff and in the
//! destination's manifest, so the derivation is deterministic and
//! fixed by configuration for the lifetime of a deployment. Two modes:
//!
//! - `ItemId`: `{root_container_id}/{item_id}`. Stable across renames
//!   and moves, which therefore arrive as metadata-only changes.
//! - `Path`: normalized `{container_path}/{name}`. Human-readable, at
//!   the cost of re-ingesting an item whenever it moves.

use chrono::SecondsFormat;
use connector_traits::{Candidate, SourceItem};
use core_runtime::KeyMode;

#[derive(Debug, Clone, Copy)]
pub struct KeyBuilder {
    mode: KeyMode,
}

impl KeyBuilder {
    pub fn new(mode: KeyMode) -> Self {
        Self { mode }
    }

    pub fn key_for(&self, item: &SourceItem) -> String {
        match self.mode {
            KeyMode::ItemId => format!("{}/{}", item.root_container_id, item.id),
            KeyMode::Path => normalize_path(&item.item_path()),
        }
    }

    /// Fingerprint recorded in the manifest; a changed fingerprint
    /// marks the item for re-ingestion.
    pub fn fingerprint(&self, item: &SourceItem) -> String {
        item.last_modified_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn candidate_for(&self, item: &SourceItem) -> Candidate {
        Candidate {
            key: self.key_for(item),
            fingerprint: self.fingerprint(item),
            path: normalize_path(&item.item_path()),
        }
    }
}

/// Collapse duplicate separators and guarantee a single leading `/`.
fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    normalized
}
