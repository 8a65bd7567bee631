//! Stage 4: commit the registration, completing the two-phase
//! protocol.

use std::sync::Arc;

use async_trait::async_trait;
use connector_traits::{FinalizationRequest, KnowledgeStore, OwnerMeta};
use tracing::debug;

use crate::context::{ProcessingContext, StageName};
use crate::error::{PipelineError, Result};
use crate::stages::PipelineStage;

pub struct IngestionFinalizationStage {
    store: Arc<dyn KnowledgeStore>,
    owner: OwnerMeta,
}

impl IngestionFinalizationStage {
    pub fn new(store: Arc<dyn KnowledgeStore>, owner: OwnerMeta) -> Self {
        Self { store, owner }
    }
}

#[async_trait]
impl PipelineStage for IngestionFinalizationStage {
    fn name(&self) -> StageName {
        StageName::IngestionFinalization
    }

    async fn execute(&self, ctx: &mut ProcessingContext) -> Result<()> {
        let registration = ctx
            .registration
            .as_ref()
            .ok_or(PipelineError::MissingStageInput {
                stage: StageName::IngestionFinalization,
                input: "registration",
            })?;

        let request = FinalizationRequest {
            key: ctx.key.clone(),
            title: ctx.item.name.clone(),
            mime_type: ctx.item.mime_type.clone(),
            content_id: registration.id.clone(),
            byte_size: ctx.item.size_bytes,
            file_url: registration.read_url.clone(),
            owner: self.owner.clone(),
        };
        let finalized_id = self
            .store
            .finalize_content(&request)
            .await
            .map_err(|source| PipelineError::Stage {
                stage: StageName::IngestionFinalization,
                source,
            })?;
        debug!(
            correlation_id = %ctx.correlation_id,
            content_id = %finalized_id,
            "Finalized ingestion"
        );
        ctx.finalized_id = Some(finalized_id);
        Ok(())
    }
}
