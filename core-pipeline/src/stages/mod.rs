//! The four pipeline stages.
//!
//! Each stage does one thing to the [`ProcessingContext`] and may
//! carry a `cleanup` that the pipeline runs after the stage's
//! execution, successful or not.

use async_trait::async_trait;

use crate::context::{ProcessingContext, StageName};
use crate::error::Result;

mod fetch;
mod finalize;
mod register;
mod upload;

pub use fetch::ContentFetchingStage;
pub use finalize::IngestionFinalizationStage;
pub use register::ContentRegistrationStage;
pub use upload::StorageUploadStage;

#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> StageName;

    async fn execute(&self, ctx: &mut ProcessingContext) -> Result<()>;

    /// Runs after `execute` regardless of its outcome. Must not fail.
    async fn cleanup(&self, _ctx: &mut ProcessingContext) {}
}
