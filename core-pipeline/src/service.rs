//! The scan cycle driver.
//!
//! One `run_cycle` call per trigger: scan every configured root,
//! fetch the destination manifest, diff, delete removed content
//! first, log moved keys, then hand the changed items to the
//! orchestrator. The cycle always finishes with a [`ScanSummary`];
//! only credential failure (or an unreadable manifest) aborts it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use connector_traits::{Candidate, KnowledgeStore, Result, SourceItem};
use core_ingest::DiffEngine;
use provider_graph::{KeyBuilder, TreeScanner};
use tracing::{info, instrument, warn};

use crate::orchestrator::ItemOrchestrator;

#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    pub root_container_ids: Vec<String>,
    /// This connector's name in the destination manifest.
    pub source_name: String,
}

/// What one scan cycle did, for the log and for callers.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub roots_scanned: usize,
    pub roots_failed: usize,
    pub containers_scanned: usize,
    pub containers_failed: usize,
    pub discovered: usize,
    pub ingested: usize,
    pub failed: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub moved: usize,
    pub truncated: bool,
    pub duration_ms: u64,
}

pub struct SyncService {
    scanner: TreeScanner,
    store: Arc<dyn KnowledgeStore>,
    orchestrator: ItemOrchestrator,
    key_builder: KeyBuilder,
    config: SyncServiceConfig,
}

impl SyncService {
    pub fn new(
        scanner: TreeScanner,
        store: Arc<dyn KnowledgeStore>,
        orchestrator: ItemOrchestrator,
        key_builder: KeyBuilder,
        config: SyncServiceConfig,
    ) -> Self {
        Self {
            scanner,
            store,
            orchestrator,
            key_builder,
            config,
        }
    }

    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<ScanSummary> {
        let started = Instant::now();
        let mut summary = ScanSummary::default();
        let mut discovered: Vec<(SourceItem, Candidate)> = Vec::new();
        // Deleting based on an incomplete discovery would wrongly
        // remove content we simply failed to see.
        let mut discovery_complete = true;

        for root in &self.config.root_container_ids {
            match self.scanner.scan(root).await {
                Ok(outcome) => {
                    summary.roots_scanned += 1;
                    summary.containers_scanned += outcome.containers_scanned;
                    summary.containers_failed += outcome.containers_failed;
                    summary.truncated |= outcome.truncated;
                    if outcome.containers_failed > 0 || outcome.truncated {
                        discovery_complete = false;
                    }
                    for item in outcome.items {
                        let candidate = self.key_builder.candidate_for(&item);
                        discovered.push((item, candidate));
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(root = %root, error = %err, "Root scan failed, continuing with other roots");
                    summary.roots_failed += 1;
                    discovery_complete = false;
                }
            }
        }
        summary.discovered = discovered.len();

        let manifest = self.store.fetch_manifest(&self.config.source_name).await?;
        let candidates: Vec<Candidate> = discovered.iter().map(|(_, c)| c.clone()).collect();
        let diff = DiffEngine::diff(&candidates, &manifest);

        for key in &diff.moved {
            info!(%key, "Item moved; key unchanged, not re-ingested");
        }
        summary.moved = diff.moved.len();

        if diff.to_delete.is_empty() {
            // Nothing to remove this cycle.
        } else if !discovery_complete {
            warn!(
                candidates = diff.to_delete.len(),
                "Discovery was incomplete, skipping the deletion phase"
            );
        } else {
            let by_key: HashMap<&str, &str> = manifest
                .iter()
                .map(|e| (e.key.as_str(), e.content_id.as_str()))
                .collect();
            for key in &diff.to_delete {
                let Some(content_id) = by_key.get(key.as_str()) else {
                    continue;
                };
                match self.store.delete_content(content_id).await {
                    Ok(()) => {
                        info!(%key, content_id, "Deleted removed content");
                        summary.deleted += 1;
                    }
                    Err(err) => {
                        warn!(%key, content_id, error = %err, "Failed to delete removed content");
                    }
                }
            }
        }

        let batch = self.orchestrator.process_discovered(discovered, &diff).await;
        for result in &batch.results {
            if !result.success {
                warn!(
                    correlation_id = %result.correlation_id,
                    key = %result.key,
                    stage = ?result.failed_stage(),
                    "Item ingestion failed"
                );
            }
        }
        summary.ingested = batch.ingested;
        summary.failed = batch.failed;
        summary.skipped = batch.skipped;
        summary.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            roots = summary.roots_scanned,
            roots_failed = summary.roots_failed,
            discovered = summary.discovered,
            ingested = summary.ingested,
            failed = summary.failed,
            skipped = summary.skipped,
            deleted = summary.deleted,
            moved = summary.moved,
            truncated = summary.truncated,
            duration_ms = summary.duration_ms,
            "Scan cycle complete"
        );
        Ok(summary)
    }
}
