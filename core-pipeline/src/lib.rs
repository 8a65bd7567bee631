//! # Processing Pipeline Core
//!
//! Everything between "these items changed" and "they are visible in
//! the knowledge store":
//!
//! - **Context** (`context`): per-item state, stage names, results
//! - **Stages** (`stages`): the four-stage ingestion sequence
//! - **Pipeline** (`pipeline`): timeouts, cleanup, compensating
//!   rollback
//! - **Orchestrator** (`orchestrator`): bounded-concurrency,
//!   all-settle batches
//! - **Service** (`service`): the scan cycle driver tying scanning,
//!   diffing, deletion, and ingestion together

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod service;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{PipelineResult, ProcessingContext, StageName};
pub use error::PipelineError;
pub use orchestrator::{BatchSummary, ItemOrchestrator};
pub use pipeline::ProcessingPipeline;
pub use service::{ScanSummary, SyncService, SyncServiceConfig};
