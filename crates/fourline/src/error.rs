//! Unified error type for the server crate.

use fourline_protocol::ProtocolError;
use fourline_transport::TransportError;

/// Top-level error for building and running the server.
///
/// Match and collaborator errors never surface here: the gateway converts
/// them into `error` events on the offending connection. What's left is
/// the connection's own plumbing — transport failures and encode bugs.
/// The `#[from]` attributes let `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode/decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
