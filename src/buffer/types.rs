use thiserror::Error;

use super::config::ConfigBuilderError;

/// Errors returned by [`TimedBuffer`](super::TimedBuffer) operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Capacity or delay was zero, or a required field was missing.
    ///
    /// Reported at construction, never deferred to first use.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The buffer was already closed.
    #[error("buffer closed")]
    Closed,

    /// The background timer task ended abnormally, usually because the
    /// flusher panicked while running on it.
    #[error("timer task failed: {0}")]
    Worker(String),
}

impl From<ConfigBuilderError> for BufferError {
    fn from(err: ConfigBuilderError) -> Self {
        BufferError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = BufferError::Closed;
        assert_eq!(err.to_string(), "buffer closed");

        let err = BufferError::InvalidConfig("capacity must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: capacity must be positive"
        );

        let err = BufferError::Worker("task panicked".to_string());
        assert_eq!(err.to_string(), "timer task failed: task panicked");
    }

    #[test]
    fn test_builder_error_converts_to_invalid_config() {
        let err: BufferError = ConfigBuilderError::ValidationError("bad".to_string()).into();

        match err {
            BufferError::InvalidConfig(msg) => assert!(msg.contains("bad")),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_have_no_source() {
        assert!(BufferError::Closed.source().is_none());
        assert!(BufferError::Worker("x".to_string()).source().is_none());
    }
}
