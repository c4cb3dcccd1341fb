//! Error types for configuration and callback failures.

use crate::MAX_BUFFER_SIZE;

/// Rejected dispatcher configuration.
///
/// `Copy` so it can travel through the diagnostics queue from the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("frame divider must be at least 1")]
    ZeroFrameDivider,

    #[error("buffer size must be at least 1")]
    ZeroBufferSize,

    #[error("buffer size {requested} exceeds the maximum of {max}")]
    BufferTooLarge { requested: usize, max: usize },

    #[error("configuration staging queue is full")]
    StagingFull,
}

impl ConfigurationError {
    pub(crate) fn too_large(requested: usize) -> Self {
        ConfigurationError::BufferTooLarge {
            requested,
            max: MAX_BUFFER_SIZE,
        }
    }
}

/// Error returned by a processor's `process` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProcessError {
    message: String,
}

impl ProcessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ProcessError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ProcessError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type for processor callbacks
pub type ProcessResult<T = ()> = Result<T, ProcessError>;
