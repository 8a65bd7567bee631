use connector_traits::ConnectorError;
use thiserror::Error;

use crate::context::StageName;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: StageName,
        #[source]
        source: ConnectorError,
    },

    #[error("Stage {stage} timed out after {timeout_secs}s")]
    StageTimeout { stage: StageName, timeout_secs: u64 },

    #[error("Stage {stage} requires {input} from an earlier stage")]
    MissingStageInput {
        stage: StageName,
        input: &'static str,
    },
}

impl PipelineError {
    pub fn stage(&self) -> StageName {
        match self {
            Self::Stage { stage, .. }
            | Self::StageTimeout { stage, .. }
            | Self::MissingStageInput { stage, .. } => *stage,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
