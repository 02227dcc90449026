use thiserror::Error;

use crate::domain::value_objects::{NodeRole, PipelineState};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid RTSP URL: {0}")]
    InvalidRtspUrl(String),

    #[error("Invalid retry count: the source needs at least one connection attempt")]
    InvalidRetryCount,

    #[error("Unsupported platform: no node set is defined for this target")]
    UnsupportedPlatform,

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Failed to create {role} node of kind '{kind}'")]
    NodeCreation { role: NodeRole, kind: String },

    #[error("Failed to link {edge}")]
    Link { edge: String },

    #[error("Failed to set pipeline state to {target}: {reason}")]
    StateTransition {
        target: PipelineState,
        reason: String,
    },

    #[error("Pipeline execution failed: {0}")]
    PipelineExecutionFailed(String),

    #[error("Pipeline has already been released")]
    PipelineReleased,
}

pub type Result<T> = std::result::Result<T, DomainError>;
