//! Per-item processing state flowing through the pipeline.

use bytes::Bytes;
use connector_traits::{RegisteredContent, SourceItem};
use uuid::Uuid;

use crate::error::PipelineError;

/// The fixed stage order of the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    ContentFetching,
    ContentRegistration,
    StorageUpload,
    IngestionFinalization,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ContentFetching => "ContentFetching",
            Self::ContentRegistration => "ContentRegistration",
            Self::StorageUpload => "StorageUpload",
            Self::IngestionFinalization => "IngestionFinalization",
        };
        f.write_str(name)
    }
}

/// Mutable state one item carries through the stages.
///
/// Stages communicate exclusively through the typed fields here; a
/// stage finding its input absent fails with
/// [`PipelineError::MissingStageInput`] naming itself.
#[derive(Debug)]
pub struct ProcessingContext {
    /// Correlation id for every log line about this item.
    pub correlation_id: Uuid,
    pub item: SourceItem,
    /// Sync key, identical in the diff and the destination manifest.
    pub key: String,
    /// Buffered content, set by fetching, released by upload cleanup
    /// and on pipeline exit.
    pub content: Option<Bytes>,
    /// Slot returned by registration.
    pub registration: Option<RegisteredContent>,
    /// Set once finalization committed; its absence after a
    /// registration is what triggers the compensating delete.
    pub finalized_id: Option<String>,
}

impl ProcessingContext {
    pub fn new(item: SourceItem, key: String) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            item,
            key,
            content: None,
            registration: None,
            finalized_id: None,
        }
    }
}

/// Outcome of one item's trip through the pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub key: String,
    pub correlation_id: Uuid,
    pub success: bool,
    pub completed_stages: Vec<StageName>,
    pub error: Option<PipelineError>,
    pub duration_ms: u64,
}

impl PipelineResult {
    /// The stage that failed, when one did.
    pub fn failed_stage(&self) -> Option<StageName> {
        self.error.as_ref().map(|e| e.stage())
    }
}
