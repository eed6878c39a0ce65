//! Error type shared by every stage, sink and terminal.

use crate::stage::StageInfo;
use thiserror::Error;

/// Boxed error returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sort stage found no usable ordering between two elements.
    #[error("no usable ordering at {stage}: {reason}")]
    Type { stage: StageInfo, reason: String },

    /// Terminal invoked twice, or a stage appended after the terminal ran.
    #[error("illegal pipeline state: {0}")]
    IllegalState(&'static str),

    /// A user-supplied callback failed.
    #[error("callback failed at {stage}: {source}")]
    Callback {
        stage: StageInfo,
        #[source]
        source: BoxError,
    },

    #[error("pipeline `{0}` was cancelled")]
    Cancelled(&'static str),
}

impl PipelineError {
    pub(crate) fn callback(stage: StageInfo, source: BoxError) -> Self {
        Self::Callback { stage, source }
    }

    /// Stage that raised the error, when it came from a specific stage.
    pub fn stage(&self) -> Option<StageInfo> {
        match self {
            Self::Type { stage, .. } | Self::Callback { stage, .. } => Some(*stage),
            Self::IllegalState(_) | Self::Cancelled(_) => None,
        }
    }
}
