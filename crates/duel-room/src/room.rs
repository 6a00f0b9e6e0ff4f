//! Room and player slot records.
//!
//! These are plain data owned by the [`RoomRegistry`](crate::RoomRegistry).
//! Outside the crate they are only reachable through shared references,
//! so every mutation goes through a registry operation.

use std::fmt;

use duel_protocol::{Choice, PlayerChoice, PlayerId, RoomCode};

use crate::RoomStatus;

/// Which of the two positions in a room a player holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    First,
    Second,
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "player 1"),
            Self::Second => write!(f, "player 2"),
        }
    }
}

/// A participant position bound to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    player: PlayerId,
    choice: Option<Choice>,
    connected: bool,
}

impl PlayerSlot {
    fn occupied_by(player: PlayerId) -> Self {
        Self {
            player,
            choice: None,
            connected: true,
        }
    }

    /// The connection occupying this slot.
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The choice for the current round, if one was made.
    pub fn choice(&self) -> Option<Choice> {
        self.choice
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// One match between (at most) two players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    code: RoomCode,
    first: PlayerSlot,
    second: Option<PlayerSlot>,
    status: RoomStatus,
}

impl Room {
    /// A room with `player` in slot 1 and slot 2 open.
    pub(crate) fn open(code: RoomCode, player: PlayerId) -> Self {
        Self {
            code,
            first: PlayerSlot::occupied_by(player),
            second: None,
            status: RoomStatus::WaitingForPlayer,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Slot 1, held by whoever created (or recreated) the room.
    pub fn first(&self) -> &PlayerSlot {
        &self.first
    }

    /// Slot 2, empty until someone joins.
    pub fn second(&self) -> Option<&PlayerSlot> {
        self.second.as_ref()
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Returns `true` when both slots are occupied.
    pub fn is_full(&self) -> bool {
        self.second.is_some()
    }

    /// Finds the slot `player` occupies, checking slot 1 first.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if self.first.player == player {
            Some(Seat::First)
        } else if self.second.as_ref().is_some_and(|s| s.player == player) {
            Some(Seat::Second)
        } else {
            None
        }
    }

    /// Returns `true` when no occupied slot is still connected. An empty
    /// slot 2 counts as disconnected.
    pub fn is_abandoned(&self) -> bool {
        !self.first.connected
            && self.second.as_ref().is_none_or(|s| !s.connected)
    }

    pub(crate) fn seat_second(&mut self, player: PlayerId) {
        self.second = Some(PlayerSlot::occupied_by(player));
        self.status = RoomStatus::InProgress;
    }

    fn slot_mut(&mut self, seat: Seat) -> Option<&mut PlayerSlot> {
        match seat {
            Seat::First => Some(&mut self.first),
            Seat::Second => self.second.as_mut(),
        }
    }

    pub(crate) fn set_choice(&mut self, seat: Seat, choice: Choice) {
        if let Some(slot) = self.slot_mut(seat) {
            slot.choice = Some(choice);
        }
    }

    pub(crate) fn set_connected(&mut self, seat: Seat, connected: bool) {
        if let Some(slot) = self.slot_mut(seat) {
            slot.connected = connected;
        }
    }

    /// Both hands, if both slots are occupied and both have chosen.
    pub(crate) fn hands(&self) -> Option<(PlayerChoice, PlayerChoice)> {
        let second = self.second.as_ref()?;
        let first = PlayerChoice {
            id: self.first.player,
            choice: self.first.choice?,
        };
        let second = PlayerChoice {
            id: second.player,
            choice: second.choice?,
        };
        Some((first, second))
    }

    pub(crate) fn complete_round(&mut self) {
        self.status = RoomStatus::Completed;
    }

    /// Clears both choices and returns to `WaitingForPlayer`. Occupancy
    /// and connection flags are kept.
    pub(crate) fn reset(&mut self) {
        self.first.choice = None;
        if let Some(second) = &mut self.second {
            second.choice = None;
        }
        self.status = RoomStatus::WaitingForPlayer;
    }
}
