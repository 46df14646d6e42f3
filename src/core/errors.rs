//! Error types for the chat core.

use thiserror::Error;

use crate::transport::Operation;

/// Chat core error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Chatroom title is empty after trimming.
    #[error("chatroom title must not be empty")]
    EmptyTitle,
    /// Message has neither text nor an image.
    #[error("message must have content or an image")]
    EmptyMessage,
    /// An operation needed a current chatroom and none is selected.
    #[error("no chatroom is currently selected")]
    NoCurrentChatroom,
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A simulated round-trip was reported as failed by the transport.
    #[error("{operation} failed in transport")]
    TransportFailure {
        /// Operation that failed.
        operation: Operation,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_failures_retry() {
        let failure = ChatError::TransportFailure {
            operation: Operation::CreateChatroom,
        };
        assert!(failure.is_retryable());
        assert!(!ChatError::EmptyTitle.is_retryable());
        assert_eq!(failure.to_string(), "create_chatroom failed in transport");
    }
}
