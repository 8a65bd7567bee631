//! The per-item processing pipeline.
//!
//! Runs the fixed stage order ContentFetching → ContentRegistration →
//! StorageUpload → IngestionFinalization under a per-stage timeout.
//! Failure at a stage aborts the rest; if a registration exists
//! without a finalization, a best-effort compensating delete removes
//! the orphaned slot so the destination never accumulates invisible
//! half-ingested content.

use std::sync::Arc;
use std::time::{Duration, Instant};

use connector_traits::{ContentSource, KnowledgeStore, OwnerMeta};
use core_http::ResilientClient;
use tracing::{debug, info, warn};

use crate::context::{PipelineResult, ProcessingContext, StageName};
use crate::error::PipelineError;
use crate::stages::{
    ContentFetchingStage, ContentRegistrationStage, IngestionFinalizationStage, PipelineStage,
    StorageUploadStage,
};

pub struct ProcessingPipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
    stage_timeout: Duration,
    store: Arc<dyn KnowledgeStore>,
}

impl ProcessingPipeline {
    pub fn new(
        stages: Vec<Arc<dyn PipelineStage>>,
        stage_timeout: Duration,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            stages,
            stage_timeout,
            store,
        }
    }

    /// The canonical four-stage pipeline.
    pub fn standard(
        source: Arc<dyn ContentSource>,
        store: Arc<dyn KnowledgeStore>,
        upload_client: ResilientClient,
        owner: OwnerMeta,
        allowed_mime_types: Vec<String>,
        max_content_bytes: u64,
        stage_timeout: Duration,
    ) -> Self {
        let stages: Vec<Arc<dyn PipelineStage>> = vec![
            Arc::new(ContentFetchingStage::new(
                source,
                allowed_mime_types,
                max_content_bytes,
            )),
            Arc::new(ContentRegistrationStage::new(store.clone(), owner.clone())),
            Arc::new(StorageUploadStage::new(upload_client)),
            Arc::new(IngestionFinalizationStage::new(store.clone(), owner)),
        ];
        Self::new(stages, stage_timeout, store)
    }

    pub async fn process(&self, mut ctx: ProcessingContext) -> PipelineResult {
        let started = Instant::now();
        let mut completed = Vec::new();
        let mut failure: Option<PipelineError> = None;

        for stage in &self.stages {
            let name = stage.name();
            debug!(correlation_id = %ctx.correlation_id, stage = %name, "Executing stage");

            let outcome = match tokio::time::timeout(self.stage_timeout, stage.execute(&mut ctx))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(PipelineError::StageTimeout {
                    stage: name,
                    timeout_secs: self.stage_timeout.as_secs(),
                }),
            };
            // Cleanup runs for the executed stage whatever the outcome;
            // earlier stages already ran theirs.
            stage.cleanup(&mut ctx).await;

            match outcome {
                Ok(()) => completed.push(name),
                Err(err) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        key = %ctx.key,
                        stage = %name,
                        error = %err,
                        "Stage failed, aborting item"
                    );
                    failure = Some(err);
                    break;
                }
            }
        }

        if failure.is_some() {
            self.rollback_orphaned_registration(&ctx).await;
        }
        // Buffers never outlive the pipeline.
        ctx.content = None;

        let duration_ms = started.elapsed().as_millis() as u64;
        let success = failure.is_none();
        if success {
            info!(
                correlation_id = %ctx.correlation_id,
                key = %ctx.key,
                duration_ms,
                "Item ingested"
            );
        }
        PipelineResult {
            key: ctx.key,
            correlation_id: ctx.correlation_id,
            success,
            completed_stages: completed,
            error: failure,
            duration_ms,
        }
    }

    /// Best-effort removal of a registration that never finalized.
    /// Its own failure is logged, never surfaced.
    async fn rollback_orphaned_registration(&self, ctx: &ProcessingContext) {
        let Some(registration) = &ctx.registration else {
            return;
        };
        if ctx.finalized_id.is_some() {
            return;
        }
        match self.store.delete_content(&registration.id).await {
            Ok(()) => debug!(
                correlation_id = %ctx.correlation_id,
                content_id = %registration.id,
                "Rolled back orphaned registration"
            ),
            Err(err) => warn!(
                correlation_id = %ctx.correlation_id,
                content_id = %registration.id,
                error = %err,
                "Failed to roll back orphaned registration"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, FakeStore, FlakyStage, SlowStage};
    use async_trait::async_trait;
    use bytes::Bytes;
    use connector_traits::{ConnectorError, HttpResponse, HttpTransport, Result as CtResult};
    use connector_traits::{HttpRequest, RetryPolicy, TokenProvider};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct UploadTransport {
        status: u16,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for UploadTransport {
        async fn execute(&self, request: HttpRequest) -> CtResult<HttpResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::new(),
            })
        }
    }

    struct NoTokenProvider;

    #[async_trait]
    impl TokenProvider for NoTokenProvider {
        async fn token(&self) -> CtResult<String> {
            Err(ConnectorError::Auth("no token expected".into()))
        }

        async fn refresh(&self) -> CtResult<String> {
            Err(ConnectorError::Auth("no token expected".into()))
        }
    }

    fn upload_client(status: u16) -> (ResilientClient, Arc<UploadTransport>) {
        let transport = Arc::new(UploadTransport {
            status,
            seen: Mutex::new(Vec::new()),
        });
        let client = ResilientClient::from_transport(
            transport.clone(),
            RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            },
            Arc::new(NoTokenProvider),
        );
        (client, transport)
    }

    fn standard_pipeline(
        store: Arc<FakeStore>,
        upload_status: u16,
    ) -> (ProcessingPipeline, Arc<UploadTransport>) {
        let source = Arc::new(crate::testing::FakeSource::with_content(b"file bytes"));
        let (client, transport) = upload_client(upload_status);
        let pipeline = ProcessingPipeline::standard(
            source,
            store,
            client,
            crate::testing::owner(),
            Vec::new(),
            1_000_000,
            Duration::from_secs(5),
        );
        (pipeline, transport)
    }

    #[tokio::test]
    async fn happy_path_runs_all_four_stages() {
        let store = Arc::new(FakeStore::new());
        let (pipeline, transport) = standard_pipeline(store.clone(), 201);

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(result.success, "unexpected error: {:?}", result.error);
        assert_eq!(result.completed_stages.len(), 4);
        assert_eq!(store.finalized().len(), 1);
        assert!(store.deleted().is_empty());

        // Upload went to the pre-signed URL without a bearer header.
        let seen = transport.seen.lock().unwrap();
        assert!(!seen[0].headers.contains_key("Authorization"));
        assert_eq!(seen[0].headers.get("x-ms-blob-type").unwrap(), "BlockBlob");
    }

    #[tokio::test]
    async fn upload_failure_rolls_back_the_registration() {
        let store = Arc::new(FakeStore::new());
        let (pipeline, _) = standard_pipeline(store.clone(), 500);

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(!result.success);
        assert_eq!(result.failed_stage(), Some(StageName::StorageUpload));
        assert_eq!(
            result.completed_stages,
            vec![StageName::ContentFetching, StageName::ContentRegistration]
        );
        // The compensating delete targeted the registered content id.
        let registered_id = store.registered()[0].clone();
        assert_eq!(store.deleted(), vec![registered_id]);
        assert!(store.finalized().is_empty());
    }

    #[tokio::test]
    async fn finalization_failure_also_rolls_back() {
        let store = Arc::new(FakeStore::new().fail_finalize());
        let (pipeline, _) = standard_pipeline(store.clone(), 201);

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(!result.success);
        assert_eq!(
            result.failed_stage(),
            Some(StageName::IngestionFinalization)
        );
        assert_eq!(store.deleted().len(), 1);
    }

    #[tokio::test]
    async fn failure_before_registration_deletes_nothing() {
        let store = Arc::new(FakeStore::new());
        let stages: Vec<Arc<dyn PipelineStage>> = vec![Arc::new(FlakyStage::new(
            StageName::ContentFetching,
            ConnectorError::Timeout("source down".into()),
        ))];
        let pipeline = ProcessingPipeline::new(stages, Duration::from_secs(1), store.clone());

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(!result.success);
        assert!(store.deleted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stage_is_cut_off_by_the_timeout() {
        let store = Arc::new(FakeStore::new());
        let stages: Vec<Arc<dyn PipelineStage>> = vec![Arc::new(SlowStage::new(
            StageName::ContentFetching,
            Duration::from_secs(120),
        ))];
        let pipeline = ProcessingPipeline::new(stages, Duration::from_secs(60), store);

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(!result.success);
        assert!(matches!(
            result.error,
            Some(PipelineError::StageTimeout {
                stage: StageName::ContentFetching,
                timeout_secs: 60
            })
        ));
    }

    #[tokio::test]
    async fn upload_without_fetch_reports_missing_input() {
        let store = Arc::new(FakeStore::new());
        let (client, _) = upload_client(201);
        let stages: Vec<Arc<dyn PipelineStage>> =
            vec![Arc::new(StorageUploadStage::new(client))];
        let pipeline = ProcessingPipeline::new(stages, Duration::from_secs(1), store);

        let result = pipeline
            .process(ProcessingContext::new(item("item-1"), "root/item-1".into()))
            .await;

        assert!(matches!(
            result.error,
            Some(PipelineError::MissingStageInput {
                stage: StageName::StorageUpload,
                ..
            })
        ));
    }
}
