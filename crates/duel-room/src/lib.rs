//! Room state for Duel.
//!
//! [`RoomRegistry`] is the single authoritative table of live rooms. It
//! pairs two players under a six-character code, collects their choices,
//! resolves each round, and forgets the room once nobody is connected.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: create, join, rejoin, choose, reset, disconnect
//! - [`Room`] / [`PlayerSlot`]: read-only views of a room's state
//! - [`RoomStatus`]: where the room is in its round cycle
//! - [`Rejoin`], [`ChoiceOutcome`], [`Disconnect`]: tagged results
//! - [`resolve`]: the winner table

mod error;
mod registry;
mod room;
mod rules;
mod status;

pub use error::RoomError;
pub use registry::{ChoiceOutcome, Disconnect, Rejoin, RoomRegistry, RoundResult};
pub use room::{PlayerSlot, Room, Seat};
pub use rules::resolve;
pub use status::RoomStatus;
