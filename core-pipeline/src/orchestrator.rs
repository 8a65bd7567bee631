//! Bounded-concurrency orchestration of discovered items.
//!
//! Items whose key the diff marked for ingestion run through the
//! pipeline in batches of `concurrency`, all-settle: an item failure
//! is recorded and never aborts its batch or the cycle.

use std::collections::HashSet;
use std::sync::Arc;

use connector_traits::{Candidate, DiffResult, SourceItem};
use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::context::{PipelineResult, ProcessingContext};
use crate::pipeline::ProcessingPipeline;

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub ingested: usize,
    pub failed: usize,
    /// Discovered items the diff found unchanged.
    pub skipped: usize,
    pub results: Vec<PipelineResult>,
}

pub struct ItemOrchestrator {
    pipeline: Arc<ProcessingPipeline>,
    concurrency: usize,
}

impl ItemOrchestrator {
    pub fn new(pipeline: Arc<ProcessingPipeline>, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
        }
    }

    #[instrument(skip_all, fields(discovered = discovered.len()))]
    pub async fn process_discovered(
        &self,
        discovered: Vec<(SourceItem, Candidate)>,
        diff: &DiffResult,
    ) -> BatchSummary {
        let to_ingest: HashSet<&str> = diff.to_ingest.iter().map(String::as_str).collect();

        let mut summary = BatchSummary::default();
        let mut contexts = Vec::new();
        for (item, candidate) in discovered {
            if to_ingest.contains(candidate.key.as_str()) {
                contexts.push(ProcessingContext::new(item, candidate.key));
            } else {
                summary.skipped += 1;
            }
        }
        debug!(
            selected = contexts.len(),
            skipped = summary.skipped,
            "Selected items for ingestion"
        );

        while !contexts.is_empty() {
            let take = self.concurrency.min(contexts.len());
            let batch: Vec<ProcessingContext> = contexts.drain(..take).collect();
            let results = join_all(
                batch
                    .into_iter()
                    .map(|ctx| self.pipeline.process(ctx)),
            )
            .await;

            for result in results {
                if result.success {
                    summary.ingested += 1;
                } else {
                    summary.failed += 1;
                }
                summary.results.push(result);
            }
        }

        info!(
            ingested = summary.ingested,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch processing complete"
        );
        summary
    }
}
