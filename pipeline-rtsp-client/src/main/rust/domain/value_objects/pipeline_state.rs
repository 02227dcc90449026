use std::fmt;

/// Engine-level pipeline states, ordered from fully released to running
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// Nothing allocated, the only state from which resources may be dropped
    Null,
    Ready,
    Paused,
    Playing,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Ready => write!(f, "READY"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Playing => write!(f, "PLAYING"),
        }
    }
}

impl PipelineState {
    /// Steps walked when bringing a freshly built pipeline up
    pub const STARTUP_SEQUENCE: [PipelineState; 3] =
        [PipelineState::Ready, PipelineState::Paused, PipelineState::Playing];

    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Ready => 1.0,
            Self::Paused => 2.0,
            Self::Playing => 3.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Null
    }
}
