//! Destination Knowledge Store Seam
//!
//! Two-phase ingestion: `register_content` reserves a slot and returns
//! a pre-authenticated write URL, `finalize_content` commits it. The
//! manifest is the destination's record of previously ingested keys
//! and serves as the diff baseline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ownership metadata attached to registered content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerMeta {
    pub owner_type: String,
    pub scope_id: String,
    pub source_kind: String,
    pub source_name: String,
}

/// Registration request for phase one of the ingestion protocol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub key: String,
    pub title: String,
    pub mime_type: String,
    #[serde(flatten)]
    pub owner: OwnerMeta,
}

/// Slot handed back by the destination after registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredContent {
    pub id: String,
    pub write_url: String,
    pub read_url: String,
}

/// Commit request for phase two of the ingestion protocol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizationRequest {
    pub key: String,
    pub title: String,
    pub mime_type: String,
    pub content_id: String,
    pub byte_size: u64,
    pub file_url: String,
    #[serde(flatten)]
    pub owner: OwnerMeta,
}

/// One previously ingested key as recorded by the destination.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub key: String,
    pub content_id: String,
    /// Content fingerprint recorded at ingestion time (last-modified
    /// timestamp in this connector).
    pub fingerprint: String,
    /// Logical path recorded at ingestion time; drives move detection.
    pub path: String,
}

/// One discovered item reduced to what the diff needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    /// Content fingerprint (last-modified timestamp in this
    /// connector).
    pub fingerprint: String,
    /// Logical path at discovery time.
    pub path: String,
}

/// Outcome of comparing a discovery set against the manifest.
///
/// Computed once per scan cycle and consumed immediately; never
/// persisted beyond it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Keys new to the destination or with a changed fingerprint.
    pub to_ingest: Vec<String>,
    /// Manifest keys absent from the current discovery.
    pub to_delete: Vec<String>,
    /// Keys whose identity is stable but whose logical path changed.
    pub moved: Vec<String>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.to_ingest.is_empty() && self.to_delete.is_empty() && self.moved.is_empty()
    }
}

/// Destination ingestion and manifest API.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The destination's record of previously ingested keys for one
    /// source, used as the diff baseline.
    async fn fetch_manifest(&self, source_name: &str) -> Result<Vec<ManifestEntry>>;

    /// Phase one: reserve a slot, obtain a write URL and content id.
    async fn register_content(&self, request: &RegistrationRequest) -> Result<RegisteredContent>;

    /// Phase two: commit, making the content visible.
    async fn finalize_content(&self, request: &FinalizationRequest) -> Result<String>;

    /// Remove content, including never-finalized registrations.
    async fn delete_content(&self, content_id: &str) -> Result<()>;
}
