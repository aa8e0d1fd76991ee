//! Core error types for the Stagehand engine.

use crate::types::Handle;

/// A specialized Result type for Stagehand operations.
pub type StageResult<T> = Result<T, StageError>;

/// Top-level error type encompassing all Stagehand subsystems.
///
/// Every variant is recoverable by the caller; library code reports
/// problems through this type instead of panicking.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("unknown handle: {0}")]
    UnknownHandle(Handle),

    #[error("unknown object name: {0}")]
    UnknownObject(String),

    #[error("cyclic attachment: {derived} cannot depend on {anchor}")]
    CyclicAttachment { derived: Handle, anchor: Handle },

    #[error("invalid layout parameters: {0}")]
    InvalidLayoutParameters(String),

    #[error("invalid mutation on {handle}: {message}")]
    InvalidMutation { handle: Handle, message: String },

    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("invalid sequencer state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StageError {
    /// Create a mutation error for the given object.
    pub fn mutation(handle: Handle, message: impl Into<String>) -> Self {
        StageError::InvalidMutation {
            handle,
            message: message.into(),
        }
    }

    /// Create a layout parameter error.
    pub fn layout(message: impl Into<String>) -> Self {
        StageError::InvalidLayoutParameters(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_handle_display() {
        let err = StageError::UnknownHandle(Handle::new(7));
        assert_eq!(err.to_string(), "unknown handle: #7");
    }

    #[test]
    fn test_cyclic_attachment_display() {
        let err = StageError::CyclicAttachment {
            derived: Handle::new(1),
            anchor: Handle::new(2),
        };
        assert_eq!(
            err.to_string(),
            "cyclic attachment: #1 cannot depend on #2"
        );
    }

    #[test]
    fn test_mutation_error_display() {
        let err = StageError::mutation(Handle::new(3), "circle has no endpoints");
        assert!(err.to_string().contains("circle has no endpoints"));
    }
}
