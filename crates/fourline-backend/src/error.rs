//! Error types for the collaborator seams.

use fourline_protocol::PlayerId;

/// Errors a collaborator call can return.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The identity service has no record of this player id.
    #[error("no identity found for player {0}")]
    NotFound(PlayerId),

    /// The collaborator could not be reached or refused the request.
    /// Carries a human-readable description for the logs.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
