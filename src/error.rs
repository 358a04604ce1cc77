//! Error taxonomy for a pipeline run

use thiserror::Error;

/// Failures a pipeline run can report.
///
/// Only [`PipelineError::Synthesis`] is recoverable: the pipeline logs it,
/// skips the unit and keeps going. Every other variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Empty, missing or malformed script
    #[error("input error: {0}")]
    Input(String),

    /// Invalid voice profile, engine or option
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One unit could not be rendered or its audio was unusable
    #[error("synthesis failed for unit {index}: {reason}")]
    Synthesis { index: usize, reason: String },

    /// Merged audio does not match the accumulated timeline
    #[error(
        "merged audio lasts {actual:.3}s but timeline ends at {expected:.3}s (tolerance {tolerance:.3}s)"
    )]
    Integrity {
        expected: f64,
        actual: f64,
        tolerance: f64,
    },

    /// Audio or metadata could not be persisted
    #[error("output error: {0}")]
    Output(String),
}

impl PipelineError {
    pub fn input(message: impl Into<String>) -> Self {
        PipelineError::Input(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration(message.into())
    }

    pub fn output(message: impl Into<String>) -> Self {
        PipelineError::Output(message.into())
    }

    /// Build a synthesis error from any error chain, keeping every cause
    pub fn synthesis(index: usize, err: &anyhow::Error) -> Self {
        PipelineError::Synthesis {
            index,
            reason: format!("{err:#}"),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Synthesis { .. })
    }
}

/// Convenient alias for results returned by pipeline stages.
pub type Result<T> = std::result::Result<T, PipelineError>;
