//! Error types for the protocol layer.
//!
//! Each crate in Duel defines its own error enum. A `ProtocolError` always
//! means the bytes or strings coming off the wire were the problem, never
//! the game state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown message `type`, or a
    /// choice tag other than `rock`, `paper` or `scissors`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code supplied by a client is not six characters drawn
    /// from `A-Z` and `0-9` (after trimming and upper-casing).
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}
