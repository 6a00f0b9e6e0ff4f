//! Wire protocol for Duel.
//!
//! This crate defines the "language" the browser client and the server
//! speak, plus the small value types every other crate shares:
//!
//! - **Identity** ([`PlayerId`], [`RoomCode`])
//! - **Game values** ([`Choice`], [`Outcome`], [`PlayerChoice`])
//! - **Messages** ([`Envelope`], [`ClientMessage`], [`ServerMessage`])
//! - **Codec** ([`Codec`] trait, [`JsonCodec`])
//! - **Errors** ([`ProtocolError`])
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room registry (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Choice, ClientMessage, Envelope, Outcome, PlayerChoice, PlayerId, RoomCode,
    ServerMessage,
};
