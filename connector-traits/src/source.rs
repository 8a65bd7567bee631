//! Source Content API Seam
//!
//! The hierarchical store being synchronized: containers hold child
//! items and sub-containers, listed page by page through a cursor.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One entry as returned by the source listing API, before enrichment.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub is_container: bool,
    /// Source-specific opt-in flag; `None` when the source exposes no
    /// such field for this entry.
    pub include_flag: Option<bool>,
    /// Whether the system fields required for ingestion were present
    /// on the wire.
    pub has_system_fields: bool,
}

/// One page of a container listing.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub entries: Vec<SourceEntry>,
    /// Continuation cursor; `None` terminates the container's scan.
    pub next_cursor: Option<String>,
}

/// A syncable leaf item discovered by the tree scanner.
///
/// Immutable once emitted; uniquely identified by
/// `(parent_container_id, id)`.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub last_modified_at: DateTime<Utc>,
    /// Path of the containing container from the scan root, `/`-joined.
    pub container_path: String,
    pub parent_container_id: String,
    /// The root container the scan started from.
    pub root_container_id: String,
}

impl SourceItem {
    /// Full logical path of the item under its scan root.
    pub fn item_path(&self) -> String {
        if self.container_path.is_empty() || self.container_path == "/" {
            format!("/{}", self.name)
        } else {
            format!("{}/{}", self.container_path.trim_end_matches('/'), self.name)
        }
    }
}

/// Paginated, hierarchical source content API.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// List one page of a container's children.
    async fn list_children(
        &self,
        container_id: &str,
        cursor: Option<&str>,
    ) -> Result<SourcePage>;

    /// Fetch the raw bytes of one item.
    async fn fetch_content(&self, container_id: &str, item_id: &str) -> Result<Bytes>;
}
