//! Core protocol types for Duel's wire format.
//!
//! Everything in this module either travels on the wire or names
//! something that does: identities, room codes, the three choices, round
//! outcomes, and the client/server message enums.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of the connection occupying a player slot.
///
/// The gateway derives it from the transport's connection id, so a client
/// that reconnects shows up with a new `PlayerId`.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A six-character room code such as `X7K2M9`.
///
/// A `RoomCode` value is always well-formed: exactly [`RoomCode::LEN`]
/// symbols from [`RoomCode::ALPHABET`]. Client input goes through
/// [`RoomCode::parse`]; the registry builds fresh codes with
/// [`RoomCode::from_indices`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of symbols in a code.
    pub const LEN: usize = 6;

    /// Symbols a code is drawn from.
    pub const ALPHABET: &'static [u8; 36] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Normalizes and validates a code typed by a user.
    ///
    /// Surrounding whitespace is trimmed and letters are upper-cased, so
    /// `" x7k2m9 "` parses to `X7K2M9`.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidRoomCode`] if the normalized input is not
    /// exactly six characters from `A-Z0-9`.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let normalized = input.trim().to_ascii_uppercase();
        let well_formed = normalized.len() == Self::LEN
            && normalized.bytes().all(|b| Self::ALPHABET.contains(&b));
        if well_formed {
            Ok(Self(normalized))
        } else {
            Err(ProtocolError::InvalidRoomCode(input.to_string()))
        }
    }

    /// Builds a code from alphabet indices. Indices wrap around the
    /// alphabet, so any `usize` is accepted.
    pub fn from_indices(indices: [usize; Self::LEN]) -> Self {
        let code = indices
            .iter()
            .map(|i| char::from(Self::ALPHABET[i % Self::ALPHABET.len()]))
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Game values
// ---------------------------------------------------------------------------

/// One of the three hands a player can throw.
///
/// On the wire these are the lowercase tags `"rock"`, `"paper"` and
/// `"scissors"`; anything else fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// All three choices, in a fixed order.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => f.write_str("rock"),
            Self::Paper => f.write_str("paper"),
            Self::Scissors => f.write_str("scissors"),
        }
    }
}

/// The result of a resolved round, seen from the room's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "tie")]
    Tie,
    /// The player in slot 1 (the room's creator) won.
    #[serde(rename = "player1")]
    FirstPlayer,
    /// The player in slot 2 won.
    #[serde(rename = "player2")]
    SecondPlayer,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tie => f.write_str("tie"),
            Self::FirstPlayer => f.write_str("player1"),
            Self::SecondPlayer => f.write_str("player2"),
        }
    }
}

/// A player's identity together with the choice they locked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChoice {
    pub id: PlayerId,
    pub choice: Choice,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wrapper around every message on the wire.
///
/// The server numbers its envelopes per connection (`seq`) and stamps
/// them with milliseconds since the connection opened. Clients may leave
/// both fields out; `#[serde(default)]` fills in zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub message: M,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Intents a client can send.
///
/// Room codes arrive as raw strings; the gateway normalizes them with
/// [`RoomCode::parse`] so a bad code can be reported on its own instead
/// of failing the whole message.
///
/// `#[serde(tag = "type")]` produces `{ "type": "JoinRoom", "room_code": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Open a new room with the sender in slot 1.
    CreateRoom,
    /// Take slot 2 of an existing room.
    JoinRoom { room_code: String },
    /// Re-establish membership after a transport reconnect.
    RejoinRoom { room_code: String },
    /// Throw a hand for the current round.
    MakeChoice { room_code: String, choice: Choice },
    /// Clear both hands and start the next round.
    PlayAgain { room_code: String },
    /// Close the session cleanly.
    Leave,
}

/// Notifications the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// First message on every connection: the identity the server uses
    /// for this connection.
    Connected { player_id: PlayerId },
    /// Sent to the creator of a room.
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
    },
    /// Sent to the connection that just took slot 2.
    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
    },
    /// Broadcast once both slots are filled.
    GameReady { message: String },
    /// Acknowledges a choice while the opponent hasn't chosen yet.
    ChoiceMade { message: String },
    /// Broadcast when a round resolves.
    GameResult {
        winner: Outcome,
        player1: PlayerChoice,
        player2: PlayerChoice,
    },
    /// Broadcast after a reset.
    GameReset { message: String },
    /// Sent to whoever is left when a disconnect tears the room down.
    PlayerDisconnected { message: String },
    /// A rejected request. Only ever sent to the requesting connection.
    Error { code: u16, message: String },
}
