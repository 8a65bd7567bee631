//! Stage 1: validate and buffer the item's content.

use std::sync::Arc;

use async_trait::async_trait;
use connector_traits::{ConnectorError, ContentSource};
use tracing::debug;

use crate::context::{ProcessingContext, StageName};
use crate::error::{PipelineError, Result};
use crate::stages::PipelineStage;

pub struct ContentFetchingStage {
    source: Arc<dyn ContentSource>,
    /// Empty allow-list admits every MIME type.
    allowed_mime_types: Vec<String>,
    max_content_bytes: u64,
}

impl ContentFetchingStage {
    pub fn new(
        source: Arc<dyn ContentSource>,
        allowed_mime_types: Vec<String>,
        max_content_bytes: u64,
    ) -> Self {
        Self {
            source,
            allowed_mime_types,
            max_content_bytes,
        }
    }

    fn validate(&self, ctx: &ProcessingContext) -> std::result::Result<(), ConnectorError> {
        let mime = &ctx.item.mime_type;
        if !self.allowed_mime_types.is_empty() && !self.allowed_mime_types.contains(mime) {
            return Err(ConnectorError::Validation(format!(
                "MIME type {mime:?} is not on the allow-list"
            )));
        }
        if ctx.item.size_bytes > self.max_content_bytes {
            return Err(ConnectorError::Validation(format!(
                "Item is {} bytes, exceeding the {} byte cap",
                ctx.item.size_bytes, self.max_content_bytes
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineStage for ContentFetchingStage {
    fn name(&self) -> StageName {
        StageName::ContentFetching
    }

    async fn execute(&self, ctx: &mut ProcessingContext) -> Result<()> {
        let wrap = |source: ConnectorError| PipelineError::Stage {
            stage: StageName::ContentFetching,
            source,
        };
        self.validate(ctx).map_err(wrap)?;

        let content = self
            .source
            .fetch_content(&ctx.item.parent_container_id, &ctx.item.id)
            .await
            .map_err(wrap)?;
        debug!(
            correlation_id = %ctx.correlation_id,
            bytes = content.len(),
            "Buffered item content"
        );
        ctx.content = Some(content);
        Ok(())
    }
}
