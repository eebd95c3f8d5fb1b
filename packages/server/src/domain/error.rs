//! Error types for the domain layer.

use thiserror::Error;

/// Errors returned when submitting requests to the hub
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub's control loop has stopped and no longer accepts requests
    #[error("hub is no longer running")]
    Closed,
}
