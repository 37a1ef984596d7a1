//! Error taxonomy for the frame-processing core

use thiserror::Error;

/// Result alias for core operations that must distinguish failure kinds
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Failures the pipeline reacts to. None of these is fatal in steady state.
#[derive(Error, Debug)]
pub enum SentinelError {
    /// `open` failed; retried indefinitely with a fixed backoff
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A single read errored or produced no frame; the handle is discarded
    #[error("frame read failed: {0}")]
    ReadFailed(String),

    /// Shape mismatch or numeric failure while scoring; reported as score 0.0
    #[error("scoring failed: {0}")]
    ScoringFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SentinelError {
    pub fn device_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    pub fn read_failed<S: Into<String>>(msg: S) -> Self {
        Self::ReadFailed(msg.into())
    }

    pub fn scoring<S: Into<String>>(msg: S) -> Self {
        Self::ScoringFailure(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
