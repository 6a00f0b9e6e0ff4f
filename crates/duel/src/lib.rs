//! # Duel
//!
//! Real-time server for two-player rock/paper/scissors matches.
//!
//! Players connect over WebSocket, open a room (which hands out a
//! six-character code), share the code, and play rounds until one of them
//! leaves. All room state lives in a [`RoomRegistry`](duel_room::RoomRegistry);
//! this crate is the gateway that turns client intents into registry calls
//! and registry results into notifications.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duel::prelude::*;
//!
//! # async fn start() -> Result<(), DuelError> {
//! let server = DuelServer::builder()
//!     .config(GatewayConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod hub;
mod server;

pub use config::GatewayConfig;
pub use error::DuelError;
pub use server::{DuelServer, DuelServerBuilder};

pub mod prelude {
    pub use crate::{DuelError, DuelServer, DuelServerBuilder, GatewayConfig};
    pub use duel_protocol::{
        Choice, ClientMessage, Codec, Envelope, JsonCodec, Outcome,
        PlayerChoice, PlayerId, RoomCode, ServerMessage,
    };
    pub use duel_room::{
        ChoiceOutcome, Disconnect, Rejoin, RoomError, RoomRegistry,
        RoomStatus, RoundResult,
    };
}
