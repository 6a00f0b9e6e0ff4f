//! Error types for the room layer.

use duel_protocol::{PlayerId, RoomCode};

/// Why a registry operation was rejected.
///
/// Every variant is an expected outcome of client input, never a fault.
/// Operations check for these before touching any state, so a returned
/// error always means nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No active room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// Slot 2 is already taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The player already sits in slot 1 of this room.
    #[error("player {0} already joined room {1}")]
    AlreadyJoined(PlayerId, RoomCode),

    /// The player occupies neither slot.
    #[error("player {0} not in room {1}")]
    PlayerNotInRoom(PlayerId, RoomCode),

    /// A rejoin into a room whose two slots belong to other players.
    #[error("room {0} is full and player {1} is not a participant")]
    RoomFullNotParticipant(RoomCode, PlayerId),
}
