//! The room registry: the authoritative table of active rooms.
//!
//! # Concurrency note
//!
//! `RoomRegistry` is a plain owned value with `&mut self` operations and
//! no interior locking. Every operation runs to completion without
//! suspending, so wrapping the registry in one mutex (as the gateway does)
//! is enough to make each operation atomic. In particular two racing
//! [`RoomRegistry::record_choice`] calls on one room are serialized and
//! exactly one of them observes the resolved round.

use std::collections::HashMap;

use duel_protocol::{Choice, Outcome, PlayerChoice, PlayerId, RoomCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::room::Seat;
use crate::rules::resolve;
use crate::{Room, RoomError};

/// How a [`RoomRegistry::rejoin_room`] call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejoin {
    /// The code was unknown, so a fresh room was opened under it with
    /// the caller in slot 1.
    Recreated,
    /// The caller already held slot 1 and is marked connected again.
    RejoinedFirst,
    /// The caller already held slot 2 and is marked connected again.
    RejoinedSecond,
    /// Slot 2 was open and the caller took it.
    JoinedSecond,
}

impl Rejoin {
    /// Human-readable summary, suitable for logs.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Recreated => "room not found, created new room",
            Self::RejoinedFirst => "rejoined as player 1",
            Self::RejoinedSecond => "rejoined as player 2",
            Self::JoinedSecond => "joined as player 2",
        }
    }

    /// Returns `true` when this rejoin just completed the pairing, so both
    /// players should be told the game can start.
    pub fn announces_ready(&self) -> bool {
        matches!(self, Self::JoinedSecond)
    }
}

/// A resolved round: both hands and who won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResult {
    pub winner: Outcome,
    pub first: PlayerChoice,
    pub second: PlayerChoice,
}

/// What recording a choice led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The other slot is empty or hasn't chosen yet.
    Waiting,
    /// Both slots now hold a choice and the round was decided.
    Resolved(RoundResult),
}

/// What a disconnect did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Another occupant is still connected; the room stays.
    RoomKept,
    /// Nobody connected was left, so the room was removed.
    RoomDeleted,
}

/// Owns every active room, keyed by its code.
///
/// ## Lifecycle
///
/// ```text
/// create_room() ──→ join_room() ──→ record_choice() ×2 ──→ reset_room() ─┐
///       │                                  ↑                             │
///       │                                  └─────────────────────────────┘
///       ▼
/// handle_disconnect() … until every occupied slot is disconnected → removed
/// ```
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry that draws room codes from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates an empty registry with a deterministic code sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            rng,
        }
    }

    /// Opens a room with `player` in slot 1 and returns its fresh code.
    pub fn create_room(&mut self, player: PlayerId) -> RoomCode {
        let code = self.generate_code();
        self.rooms
            .insert(code.clone(), Room::open(code.clone(), player));
        tracing::info!(room_code = %code, %player, "room created");
        code
    }

    /// Puts `player` in slot 2 of the room.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::RoomFull`]: slot 2 already taken
    /// - [`RoomError::AlreadyJoined`]: `player` is the room's creator
    pub fn join_room(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<(), RoomError> {
        let room = self.room_mut(code)?;
        if room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }
        if room.first().player() == player {
            return Err(RoomError::AlreadyJoined(player, code.clone()));
        }

        room.seat_second(player);
        tracing::info!(room_code = %code, %player, "player joined");
        Ok(())
    }

    /// Re-establishes `player`'s membership after a transport reconnect.
    ///
    /// Only the code and the player's identity are available, so the
    /// cases are tried in order: unknown code, slot 1, slot 2, open
    /// slot 2.
    ///
    /// # Errors
    /// [`RoomError::RoomFullNotParticipant`] if both slots belong to
    /// other players.
    pub fn rejoin_room(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<Rejoin, RoomError> {
        let outcome = match self.rooms.get_mut(code) {
            None => {
                self.rooms
                    .insert(code.clone(), Room::open(code.clone(), player));
                Rejoin::Recreated
            }
            Some(room) => match room.seat_of(player) {
                Some(Seat::First) => {
                    room.set_connected(Seat::First, true);
                    Rejoin::RejoinedFirst
                }
                Some(Seat::Second) => {
                    room.set_connected(Seat::Second, true);
                    Rejoin::RejoinedSecond
                }
                None if !room.is_full() => {
                    room.seat_second(player);
                    Rejoin::JoinedSecond
                }
                None => {
                    return Err(RoomError::RoomFullNotParticipant(
                        code.clone(),
                        player,
                    ));
                }
            },
        };

        tracing::info!(
            room_code = %code,
            %player,
            outcome = outcome.message(),
            "player rejoined"
        );
        Ok(outcome)
    }

    /// Records `player`'s choice for the current round, replacing any
    /// earlier choice, and resolves the round once both slots have one.
    ///
    /// Resolution depends only on both choices being present at the
    /// moment of the write, so re-choosing after a resolved round (without
    /// a reset) resolves again with the new hand.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::PlayerNotInRoom`]: `player` holds neither slot
    pub fn record_choice(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
        choice: Choice,
    ) -> Result<ChoiceOutcome, RoomError> {
        let room = self.room_mut(code)?;
        let seat = room
            .seat_of(player)
            .ok_or_else(|| RoomError::PlayerNotInRoom(player, code.clone()))?;

        room.set_choice(seat, choice);
        tracing::debug!(room_code = %code, %player, %seat, "choice recorded");

        let Some((first, second)) = room.hands() else {
            return Ok(ChoiceOutcome::Waiting);
        };

        let winner = resolve(first.choice, second.choice);
        room.complete_round();
        tracing::info!(
            room_code = %code,
            first = %first.choice,
            second = %second.choice,
            %winner,
            "round resolved"
        );
        Ok(ChoiceOutcome::Resolved(RoundResult {
            winner,
            first,
            second,
        }))
    }

    /// Clears both choices and puts the room back to `WaitingForPlayer`.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`]: no such room
    pub fn reset_room(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        self.room_mut(code)?.reset();
        tracing::info!(room_code = %code, "room reset");
        Ok(())
    }

    /// Marks `player`'s slot disconnected and removes the room once no
    /// occupied slot is connected any more.
    ///
    /// A room whose slot 2 was never filled is removed as soon as its
    /// creator disconnects.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::PlayerNotInRoom`]: `player` holds neither slot
    pub fn handle_disconnect(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<Disconnect, RoomError> {
        let room = self.room_mut(code)?;
        let seat = room
            .seat_of(player)
            .ok_or_else(|| RoomError::PlayerNotInRoom(player, code.clone()))?;

        room.set_connected(seat, false);
        tracing::info!(room_code = %code, %player, %seat, "player disconnected");

        if room.is_abandoned() {
            self.rooms.remove(code);
            tracing::info!(room_code = %code, "room deleted");
            Ok(Disconnect::RoomDeleted)
        } else {
            Ok(Disconnect::RoomKept)
        }
    }

    /// Looks up a room by code.
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Lists all active room codes, in no particular order.
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    fn room_mut(&mut self, code: &RoomCode) -> Result<&mut Room, RoomError> {
        self.rooms.get_mut(code).ok_or_else(|| {
            tracing::debug!(room_code = %code, "room not found");
            RoomError::RoomNotFound(code.clone())
        })
    }

    /// Draws codes until one is not in use. With 36^6 codes a retry is
    /// rare, but a live room must never be overwritten.
    fn generate_code(&mut self) -> RoomCode {
        loop {
            let indices = std::array::from_fn(|_| {
                self.rng.random_range(0..RoomCode::ALPHABET.len())
            });
            let code = RoomCode::from_indices(indices);
            if !self.rooms.contains_key(&code) {
                return code;
            }
            tracing::debug!(room_code = %code, "room code collision, retrying");
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for `RoomRegistry`, one section per operation.
    //! Multi-step scenarios live in `tests/room_registry.rs`.

    use super::*;
    use crate::RoomStatus;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    /// A registry with one room: `pid(1)` in slot 1, `pid(2)` in slot 2.
    fn paired() -> (RoomRegistry, RoomCode) {
        let mut reg = RoomRegistry::with_seed(1);
        let code = reg.create_room(pid(1));
        reg.join_room(&code, pid(2)).unwrap();
        (reg, code)
    }

    // =====================================================================
    // create_room()
    // =====================================================================

    #[test]
    fn test_create_room_returns_well_formed_unique_codes() {
        let mut reg = RoomRegistry::with_seed(42);
        let a = reg.create_room(pid(1));
        let b = reg.create_room(pid(2));

        assert_ne!(a, b);
        for c in [&a, &b] {
            assert_eq!(c.as_str().len(), RoomCode::LEN);
            assert!(RoomCode::parse(c.as_str()).is_ok());
        }
        assert_eq!(reg.room_count(), 2);
    }

    #[test]
    fn test_create_room_initial_state() {
        let mut reg = RoomRegistry::with_seed(42);
        let c = reg.create_room(pid(1));

        let room = reg.room(&c).unwrap();
        assert_eq!(room.code(), &c);
        assert_eq!(room.first().player(), pid(1));
        assert!(room.first().is_connected());
        assert!(room.second().is_none());
        assert_eq!(room.status(), RoomStatus::WaitingForPlayer);
    }

    #[test]
    fn test_create_room_retries_on_collision() {
        // Two registries with the same seed draw the same first code.
        let first_draw = RoomRegistry::with_seed(7).create_room(pid(1));

        let mut reg = RoomRegistry::with_seed(7);
        reg.rejoin_room(&first_draw, pid(9)).unwrap(); // occupy that code

        let fresh = reg.create_room(pid(1));

        assert_ne!(fresh, first_draw);
        assert_eq!(reg.room_count(), 2);
        assert_eq!(
            reg.room(&first_draw).unwrap().first().player(),
            pid(9),
            "existing room must not be overwritten"
        );
    }

    // =====================================================================
    // join_room()
    // =====================================================================

    #[test]
    fn test_join_room_success_sets_in_progress() {
        let (reg, c) = paired();
        let room = reg.room(&c).unwrap();
        assert_eq!(room.status(), RoomStatus::InProgress);
        assert_eq!(room.second().unwrap().player(), pid(2));
        assert!(room.second().unwrap().is_connected());
    }

    #[test]
    fn test_join_room_not_found() {
        let mut reg = RoomRegistry::with_seed(1);
        let result = reg.join_room(&code("NOPE00"), pid(1));
        assert_eq!(result, Err(RoomError::RoomNotFound(code("NOPE00"))));
    }

    #[test]
    fn test_join_room_own_room_already_joined() {
        let mut reg = RoomRegistry::with_seed(1);
        let c = reg.create_room(pid(1));
        let result = reg.join_room(&c, pid(1));
        assert_eq!(result, Err(RoomError::AlreadyJoined(pid(1), c.clone())));
        assert!(reg.room(&c).unwrap().second().is_none());
    }

    #[test]
    fn test_join_room_full_regardless_of_who_asks() {
        let (mut reg, c) = paired();
        for p in [pid(1), pid(2), pid(3)] {
            assert_eq!(
                reg.join_room(&c, p),
                Err(RoomError::RoomFull(c.clone())),
                "{p}"
            );
        }
    }

    // =====================================================================
    // rejoin_room()
    // =====================================================================

    #[test]
    fn test_rejoin_room_absent_code_recreates_under_same_code() {
        let mut reg = RoomRegistry::with_seed(1);
        let c = code("X7K2M9");

        let outcome = reg.rejoin_room(&c, pid(5)).unwrap();

        assert_eq!(outcome, Rejoin::Recreated);
        assert!(!outcome.announces_ready());
        let room = reg.room(&c).unwrap();
        assert_eq!(room.first().player(), pid(5));
        assert!(room.second().is_none());
        assert_eq!(room.status(), RoomStatus::WaitingForPlayer);
    }

    #[test]
    fn test_rejoin_room_first_player_restores_connection_only() {
        let (mut reg, c) = paired();
        reg.record_choice(&c, pid(2), Choice::Paper).unwrap();
        reg.handle_disconnect(&c, pid(1)).unwrap();
        assert!(!reg.room(&c).unwrap().first().is_connected());

        let outcome = reg.rejoin_room(&c, pid(1)).unwrap();

        assert_eq!(outcome, Rejoin::RejoinedFirst);
        let room = reg.room(&c).unwrap();
        assert!(room.first().is_connected());
        let second = room.second().unwrap();
        assert_eq!(second.player(), pid(2));
        assert_eq!(second.choice(), Some(Choice::Paper));
        assert_eq!(room.status(), RoomStatus::InProgress);
    }

    #[test]
    fn test_rejoin_room_second_player() {
        let (mut reg, c) = paired();
        reg.handle_disconnect(&c, pid(2)).unwrap();

        let outcome = reg.rejoin_room(&c, pid(2)).unwrap();

        assert_eq!(outcome, Rejoin::RejoinedSecond);
        assert!(reg.room(&c).unwrap().second().unwrap().is_connected());
    }

    #[test]
    fn test_rejoin_room_open_slot_joins_as_second() {
        let mut reg = RoomRegistry::with_seed(1);
        let c = reg.create_room(pid(1));

        let outcome = reg.rejoin_room(&c, pid(2)).unwrap();

        assert_eq!(outcome, Rejoin::JoinedSecond);
        assert!(outcome.announces_ready());
        assert_eq!(reg.room(&c).unwrap().status(), RoomStatus::InProgress);
    }

    #[test]
    fn test_rejoin_room_full_stranger_rejected() {
        let (mut reg, c) = paired();
        let before = reg.room(&c).unwrap().clone();

        let result = reg.rejoin_room(&c, pid(3));

        assert_eq!(
            result,
            Err(RoomError::RoomFullNotParticipant(c.clone(), pid(3)))
        );
        assert_eq!(reg.room(&c).unwrap(), &before);
    }

    #[test]
    fn test_rejoin_messages_are_distinct() {
        let all = [
            Rejoin::Recreated,
            Rejoin::RejoinedFirst,
            Rejoin::RejoinedSecond,
            Rejoin::JoinedSecond,
        ];
        let mut messages: Vec<_> = all.iter().map(Rejoin::message).collect();
        messages.sort_unstable();
        messages.dedup();
        assert_eq!(messages.len(), all.len());
    }

    // =====================================================================
    // record_choice()
    // =====================================================================

    #[test]
    fn test_record_choice_first_choice_waits() {
        let (mut reg, c) = paired();
        let outcome = reg.record_choice(&c, pid(1), Choice::Rock).unwrap();
        assert_eq!(outcome, ChoiceOutcome::Waiting);
        assert_eq!(reg.room(&c).unwrap().status(), RoomStatus::InProgress);
    }

    #[test]
    fn test_record_choice_alone_in_room_waits() {
        let mut reg = RoomRegistry::with_seed(1);
        let c = reg.create_room(pid(1));
        let outcome = reg.record_choice(&c, pid(1), Choice::Rock).unwrap();
        assert_eq!(outcome, ChoiceOutcome::Waiting);
        assert_eq!(
            reg.room(&c).unwrap().first().choice(),
            Some(Choice::Rock)
        );
    }

    #[test]
    fn test_record_choice_second_choice_resolves() {
        let (mut reg, c) = paired();
        reg.record_choice(&c, pid(1), Choice::Rock).unwrap();

        let outcome = reg.record_choice(&c, pid(2), Choice::Scissors).unwrap();

        assert_eq!(
            outcome,
            ChoiceOutcome::Resolved(RoundResult {
                winner: Outcome::FirstPlayer,
                first: PlayerChoice { id: pid(1), choice: Choice::Rock },
                second: PlayerChoice { id: pid(2), choice: Choice::Scissors },
            })
        );
        assert_eq!(reg.room(&c).unwrap().status(), RoomStatus::Completed);
    }

    #[test]
    fn test_record_choice_overwrites_before_resolution() {
        let (mut reg, c) = paired();
        reg.record_choice(&c, pid(1), Choice::Rock).unwrap();
        reg.record_choice(&c, pid(1), Choice::Paper).unwrap();

        let outcome = reg.record_choice(&c, pid(2), Choice::Rock).unwrap();

        let ChoiceOutcome::Resolved(result) = outcome else {
            panic!("expected resolution, got {outcome:?}");
        };
        assert_eq!(result.first.choice, Choice::Paper);
        assert_eq!(result.winner, Outcome::FirstPlayer);
    }

    #[test]
    fn test_record_choice_not_found() {
        let mut reg = RoomRegistry::with_seed(1);
        let result = reg.record_choice(&code("AAAAAA"), pid(1), Choice::Rock);
        assert_eq!(result, Err(RoomError::RoomNotFound(code("AAAAAA"))));
    }

    #[test]
    fn test_record_choice_stranger_rejected_without_mutation() {
        let (mut reg, c) = paired();
        let before = reg.room(&c).unwrap().clone();

        let result = reg.record_choice(&c, pid(3), Choice::Rock);

        assert_eq!(result, Err(RoomError::PlayerNotInRoom(pid(3), c.clone())));
        assert_eq!(reg.room(&c).unwrap(), &before);
    }

    // =====================================================================
    // reset_room()
    // =====================================================================

    #[test]
    fn test_reset_room_clears_choices_and_status() {
        let (mut reg, c) = paired();
        reg.record_choice(&c, pid(1), Choice::Rock).unwrap();
        reg.record_choice(&c, pid(2), Choice::Rock).unwrap();

        reg.reset_room(&c).unwrap();

        let room = reg.room(&c).unwrap();
        assert_eq!(room.status(), RoomStatus::WaitingForPlayer);
        assert_eq!(room.first().choice(), None);
        assert_eq!(room.second().unwrap().choice(), None);
        assert_eq!(room.second().unwrap().player(), pid(2));
    }

    #[test]
    fn test_reset_room_not_found() {
        let mut reg = RoomRegistry::with_seed(1);
        assert_eq!(
            reg.reset_room(&code("ZZZZZZ")),
            Err(RoomError::RoomNotFound(code("ZZZZZZ")))
        );
    }

    // =====================================================================
    // handle_disconnect()
    // =====================================================================

    #[test]
    fn test_handle_disconnect_one_of_two_keeps_room() {
        let (mut reg, c) = paired();
        let outcome = reg.handle_disconnect(&c, pid(1)).unwrap();
        assert_eq!(outcome, Disconnect::RoomKept);
        assert!(reg.contains(&c));
    }

    #[test]
    fn test_handle_disconnect_both_deletes_room() {
        let (mut reg, c) = paired();
        reg.handle_disconnect(&c, pid(2)).unwrap();
        let outcome = reg.handle_disconnect(&c, pid(1)).unwrap();
        assert_eq!(outcome, Disconnect::RoomDeleted);
        assert!(!reg.contains(&c));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_handle_disconnect_lone_creator_deletes_room() {
        let mut reg = RoomRegistry::with_seed(1);
        let c = reg.create_room(pid(1));
        assert_eq!(
            reg.handle_disconnect(&c, pid(1)).unwrap(),
            Disconnect::RoomDeleted
        );
        assert!(!reg.contains(&c));
    }

    #[test]
    fn test_handle_disconnect_errors() {
        let (mut reg, c) = paired();
        assert_eq!(
            reg.handle_disconnect(&code("QQQQQQ"), pid(1)),
            Err(RoomError::RoomNotFound(code("QQQQQQ")))
        );
        assert_eq!(
            reg.handle_disconnect(&c, pid(3)),
            Err(RoomError::PlayerNotInRoom(pid(3), c.clone()))
        );
        assert!(reg.room(&c).unwrap().first().is_connected());
    }

    #[test]
    fn test_codes_lists_active_rooms() {
        let mut reg = RoomRegistry::with_seed(3);
        let a = reg.create_room(pid(1));
        let b = reg.create_room(pid(2));
        let mut codes = reg.codes();
        codes.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        let mut expected = vec![a, b];
        expected.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(codes, expected);
    }
}
