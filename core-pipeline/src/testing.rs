//! Shared fakes for the crate's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use connector_traits::{
    ConnectorError, ContentSource, FinalizationRequest, KnowledgeStore, ManifestEntry, OwnerMeta,
    RegisteredContent, RegistrationRequest, Result, SourceItem, SourcePage,
};

use crate::context::{ProcessingContext, StageName};
use crate::error::{PipelineError, Result as StageResult};
use crate::stages::PipelineStage;

pub fn item(id: &str) -> SourceItem {
    SourceItem {
        id: id.into(),
        name: format!("{id}.pdf"),
        size_bytes: 64,
        mime_type: "application/pdf".into(),
        last_modified_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
        container_path: "/docs".into(),
        parent_container_id: "dir-1".into(),
        root_container_id: "root".into(),
    }
}

pub fn owner() -> OwnerMeta {
    OwnerMeta {
        owner_type: "SCOPE".into(),
        scope_id: "scope-42".into(),
        source_kind: "MICROSOFT_365_SHAREPOINT".into(),
        source_name: "sharepoint-main".into(),
    }
}

/// Source serving one fixed byte buffer for any item.
pub struct FakeSource {
    content: Bytes,
}

impl FakeSource {
    pub fn with_content(content: &'static [u8]) -> Self {
        Self {
            content: Bytes::from_static(content),
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn list_children(
        &self,
        _container_id: &str,
        _cursor: Option<&str>,
    ) -> Result<SourcePage> {
        Ok(SourcePage {
            entries: Vec::new(),
            next_cursor: None,
        })
    }

    async fn fetch_content(&self, _container_id: &str, _item_id: &str) -> Result<Bytes> {
        Ok(self.content.clone())
    }
}

/// Recording knowledge store with togglable failures.
pub struct FakeStore {
    next_id: AtomicUsize,
    registered: Mutex<Vec<String>>,
    finalized: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    manifest: Mutex<Vec<ManifestEntry>>,
    fail_finalize: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            registered: Mutex::new(Vec::new()),
            finalized: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            manifest: Mutex::new(Vec::new()),
            fail_finalize: false,
        }
    }

    pub fn fail_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }

    pub fn finalized(&self) -> Vec<String> {
        self.finalized.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeStore for FakeStore {
    async fn fetch_manifest(&self, _source_name: &str) -> Result<Vec<ManifestEntry>> {
        Ok(self.manifest.lock().unwrap().clone())
    }

    async fn register_content(&self, _request: &RegistrationRequest) -> Result<RegisteredContent> {
        let id = format!("content-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.registered.lock().unwrap().push(id.clone());
        Ok(RegisteredContent {
            write_url: format!("https://storage.example.net/{id}"),
            read_url: format!("https://storage.example.net/{id}?read"),
            id,
        })
    }

    async fn finalize_content(&self, request: &FinalizationRequest) -> Result<String> {
        if self.fail_finalize {
            return Err(ConnectorError::Status {
                status: 502,
                message: "finalize unavailable".into(),
            });
        }
        self.finalized
            .lock()
            .unwrap()
            .push(request.content_id.clone());
        Ok(request.content_id.clone())
    }

    async fn delete_content(&self, content_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(content_id.to_string());
        Ok(())
    }
}

/// Stage that fails immediately with a fixed error.
pub struct FlakyStage {
    name: StageName,
    error: ConnectorError,
}

impl FlakyStage {
    pub fn new(name: StageName, error: ConnectorError) -> Self {
        Self { name, error }
    }
}

#[async_trait]
impl PipelineStage for FlakyStage {
    fn name(&self) -> StageName {
        self.name
    }

    async fn execute(&self, _ctx: &mut ProcessingContext) -> StageResult<()> {
        Err(PipelineError::Stage {
            stage: self.name,
            source: self.error.clone(),
        })
    }
}

/// Stage that sleeps long enough to trip the pipeline timeout.
pub struct SlowStage {
    name: StageName,
    delay: Duration,
}

impl SlowStage {
    pub fn new(name: StageName, delay: Duration) -> Self {
        Self { name, delay }
    }
}

#[async_trait]
impl PipelineStage for SlowStage {
    fn name(&self) -> StageName {
        self.name
    }

    async fn execute(&self, _ctx: &mut ProcessingContext) -> StageResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
