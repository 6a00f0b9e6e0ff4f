//! Room status.

use std::fmt;

/// Where a room is in its round cycle.
///
/// ```text
/// WaitingForPlayer ──(slot 2 filled)──→ InProgress ──(round resolved)──→ Completed
///        ↑                                                                 │
///        └───────────────────────────(reset)───────────────────────────────┘
/// ```
///
/// After a reset the room reports `WaitingForPlayer` even though both
/// slots stay occupied; the next resolved round moves it to `Completed`
/// directly. Only the registry changes a room's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    WaitingForPlayer,
    InProgress,
    Completed,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForPlayer => write!(f, "WaitingForPlayer"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}
