//! Stage 3: PUT the buffer to the pre-authenticated write URL.

use async_trait::async_trait;
use connector_traits::{HttpMethod, HttpRequest};
use core_http::ResilientClient;
use tracing::debug;

use crate::context::{ProcessingContext, StageName};
use crate::error::{PipelineError, Result};
use crate::stages::PipelineStage;

pub struct StorageUploadStage {
    client: ResilientClient,
}

impl StorageUploadStage {
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PipelineStage for StorageUploadStage {
    fn name(&self) -> StageName {
        StageName::StorageUpload
    }

    async fn execute(&self, ctx: &mut ProcessingContext) -> Result<()> {
        let content = ctx.content.clone().ok_or(PipelineError::MissingStageInput {
            stage: StageName::StorageUpload,
            input: "buffered content",
        })?;
        let registration = ctx
            .registration
            .as_ref()
            .ok_or(PipelineError::MissingStageInput {
                stage: StageName::StorageUpload,
                input: "registration",
            })?;

        let bytes = content.len();
        let request = HttpRequest::new(HttpMethod::Put, registration.write_url.clone())
            .header("Content-Type", ctx.item.mime_type.clone())
            .header("x-ms-blob-type", "BlockBlob")
            .body(content);

        // The write URL is pre-signed; a bearer header would be
        // rejected.
        self.client
            .execute_unauthenticated(request)
            .await
            .and_then(|response| {
                if response.is_success() {
                    Ok(())
                } else {
                    Err(response.into_status_error())
                }
            })
            .map_err(|source| PipelineError::Stage {
                stage: StageName::StorageUpload,
                source,
            })?;

        debug!(correlation_id = %ctx.correlation_id, bytes, "Uploaded content");
        Ok(())
    }

    /// The buffer is not needed past this stage.
    async fn cleanup(&self, ctx: &mut ProcessingContext) {
        ctx.content = None;
    }
}
