//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server's gate redirected the request to its login page
    #[error("Not signed in: server redirected to '{0}'")]
    Unauthorized(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ClientError {
    /// Whether reconnecting could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}
