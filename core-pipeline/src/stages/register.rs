//! Stage 2: reserve an ingestion slot at the destination.

use std::sync::Arc;

use async_trait::async_trait;
use connector_traits::{KnowledgeStore, OwnerMeta, RegistrationRequest};
use tracing::debug;

use crate::context::{ProcessingContext, StageName};
use crate::error::{PipelineError, Result};
use crate::stages::PipelineStage;

pub struct ContentRegistrationStage {
    store: Arc<dyn KnowledgeStore>,
    owner: OwnerMeta,
}

impl ContentRegistrationStage {
    pub fn new(store: Arc<dyn KnowledgeStore>, owner: OwnerMeta) -> Self {
        Self { store, owner }
    }
}

#[async_trait]
impl PipelineStage for ContentRegistrationStage {
    fn name(&self) -> StageName {
        StageName::ContentRegistration
    }

    async fn execute(&self, ctx: &mut ProcessingContext) -> Result<()> {
        let request = RegistrationRequest {
            key: ctx.key.clone(),
            title: ctx.item.name.clone(),
            mime_type: ctx.item.mime_type.clone(),
            owner: self.owner.clone(),
        };
        let registered = self
            .store
            .register_content(&request)
            .await
            .map_err(|source| PipelineError::Stage {
                stage: StageName::ContentRegistration,
                source,
            })?;
        debug!(
            correlation_id = %ctx.correlation_id,
            content_id = %registered.id,
            "Registered content slot"
        );
        ctx.registration = Some(registered);
        Ok(())
    }
}
