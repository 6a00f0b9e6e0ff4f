//! Unified error type for the Duel server.

use duel_transport::TransportError;

/// Top-level error returned by the server and its builder.
///
/// Rejected room operations and malformed client messages never surface
/// here: the handler answers them with a `ServerMessage::Error` to the
/// client and keeps the connection open.
#[derive(Debug, thiserror::Error)]
pub enum DuelError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
