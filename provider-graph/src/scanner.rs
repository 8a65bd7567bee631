//! Work-queue traversal of a container tree.
//!
//! Containers are scanned breadth-first through an explicit queue
//! rather than recursion. Each container is paginated to exhaustion;
//! sub-containers are enqueued with their accumulated path and leaves
//! that clear the inclusion filter are emitted as immutable
//! [`SourceItem`]s.
//!
//! Failure isolation: a listing failure inside one container abandons
//! only that container's remaining sub-tree; items gathered so far are
//! kept. A failure on the root container itself, or any authentication
//! failure, aborts the whole scan.

use std::collections::VecDeque;
use std::sync::Arc;

use connector_traits::{ContentSource, Result, SourceItem};
use tracing::{debug, info, instrument, warn};

use crate::filter::InclusionFilter;

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub items: Vec<SourceItem>,
    pub containers_scanned: usize,
    pub containers_failed: usize,
    /// Leaves rejected by the inclusion filter.
    pub skipped: usize,
    /// Whether the item ceiling cut the scan short.
    pub truncated: bool,
}

struct PendingContainer {
    id: String,
    path: String,
}

pub struct TreeScanner {
    source: Arc<dyn ContentSource>,
    filter: InclusionFilter,
    /// Ceiling across the whole scan; the page in progress is finished
    /// before stopping.
    max_items: usize,
}

impl TreeScanner {
    pub fn new(source: Arc<dyn ContentSource>, filter: InclusionFilter, max_items: usize) -> Self {
        Self {
            source,
            filter,
            max_items,
        }
    }

    #[instrument(skip(self), fields(root = %root_container_id))]
    pub async fn scan(&self, root_container_id: &str) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();
        let mut queue = VecDeque::new();
        queue.push_back(PendingContainer {
            id: root_container_id.to_string(),
            path: String::new(),
        });

        'containers: while let Some(container) = queue.pop_front() {
            let is_root = container.id == root_container_id;
            let mut cursor: Option<String> = None;

            loop {
                let page = match self
                    .source
                    .list_children(&container.id, cursor.as_deref())
                    .await
                {
                    Ok(page) => page,
                    Err(err) if is_root || err.is_fatal() => return Err(err),
                    Err(err) => {
                        warn!(
                            container_id = %container.id,
                            error = %err,
                            "Abandoning container sub-tree after listing failure"
                        );
                        outcome.containers_failed += 1;
                        continue 'containers;
                    }
                };

                for entry in page.entries {
                    if entry.is_container {
                        queue.push_back(PendingContainer {
                            path: format!("{}/{}", container.path, entry.name),
                            id: entry.id,
                        });
                        continue;
                    }
                    if let Some(reason) = self.filter.skip_reason(&entry) {
                        debug!(item_id = %entry.id, %reason, "Skipping entry");
                        outcome.skipped += 1;
                        continue;
                    }
                    // The filter guarantees both fields are present.
                    let (Some(mime_type), Some(last_modified_at)) =
                        (entry.mime_type, entry.last_modified_at)
                    else {
                        continue;
                    };
                    outcome.items.push(SourceItem {
                        id: entry.id,
                        name: entry.name,
                        size_bytes: entry.size_bytes,
                        mime_type,
                        last_modified_at,
                        container_path: container.path.clone(),
                        parent_container_id: container.id.clone(),
                        root_container_id: root_container_id.to_string(),
                    });
                }

                if outcome.items.len() >= self.max_items {
                    warn!(
                        items = outcome.items.len(),
                        ceiling = self.max_items,
                        "Item ceiling reached, stopping scan after page in progress"
                    );
                    outcome.containers_scanned += 1;
                    outcome.truncated = true;
                    break 'containers;
                }

                cursor = page.next_cursor;
                if cursor.is_none() {
                    break;
                }
            }
            outcome.containers_scanned += 1;
        }

        info!(
            items = outcome.items.len(),
            containers = outcome.containers_scanned,
            failed = outcome.containers_failed,
            skipped = outcome.skipped,
            truncated = outcome.truncated,
            "Scan complete"
        );
        Ok(outcome)
    }
}
