//! `DuelServer` builder and server loop.
//!
//! This is the entry point for running a Duel server. It ties the layers
//! together: transport → protocol → room registry → hub.

use std::net::SocketAddr;
use std::sync::Arc;

use duel_protocol::{Codec, JsonCodec};
use duel_room::RoomRegistry;
use duel_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::config::GatewayConfig;
use crate::handler::handle_connection;
use crate::hub::Hub;
use crate::DuelError;

/// Shared server state passed to each connection handler task.
///
/// Lock order is `rooms` then `hub`. A handler keeps the registry locked
/// while it queues the notifications for that operation, so every
/// connection sees room events in the order the registry applied them.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) hub: Mutex<Hub>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Duel server.
///
/// # Example
///
/// ```rust,no_run
/// use duel::prelude::*;
///
/// # async fn start() -> Result<(), DuelError> {
/// let server = DuelServer::builder()
///     .bind("127.0.0.1:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DuelServerBuilder {
    config: GatewayConfig,
    registry: Option<RoomRegistry>,
}

impl DuelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            registry: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Starts from an existing registry instead of an empty one.
    pub fn registry(mut self, registry: RoomRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<DuelServer<JsonCodec>, DuelError> {
        let transport =
            WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(self.registry.unwrap_or_default()),
            hub: Mutex::new(Hub::new()),
            codec: JsonCodec,
        });

        Ok(DuelServer { transport, state })
    }
}

impl Default for DuelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Duel server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuelServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DuelServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DuelServerBuilder {
        DuelServerBuilder::new()
    }
}

impl<C: Codec> DuelServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, DuelError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), DuelError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Duel server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
