//! Error types for the ffbench core library.
//!
//! Uses `thiserror` for structured error variants covering checkpoint
//! configuration, the timing model, config loading and report output.

/// Top-level error type for the ffbench core library.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("Configuration load error: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invalid benchmarker settings, detected before any batch runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("'epoch_list' must be non-empty")]
    EmptyEpochList,

    #[error("'epoch_list' must contain 0, otherwise the first epochs have unknown speed")]
    MissingEpochZero,

    #[error("'step_list' must be non-empty")]
    EmptyStepList,

    #[error("'step_list' must contain 0 because every epoch starts at batch 0")]
    MissingStepZero,

    #[error("'min_steps' must be at least 1")]
    ZeroMinSteps,
}

/// Violations of the timing model's preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    #[error("Epoch {epoch} has no measurement at step 0; cannot extrapolate")]
    MissingBaseline { epoch: u64 },

    #[error("Checkpoint (epoch {epoch}, step {step}) is not part of the schedule")]
    UnknownCheckpoint { epoch: u64, step: u64 },
}
