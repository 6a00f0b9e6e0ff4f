//! Gateway configuration.

use crate::DuelError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Settings for the gateway's listener.
///
/// Connections are never dropped for being quiet: a connection ends only
/// when the client closes it, sends `Leave`, or the transport fails.
///
/// Start from `GatewayConfig::default()` and override what you need, or
/// read everything from the environment with [`GatewayConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
        }
    }
}

impl GatewayConfig {
    /// Environment variable holding the listen port.
    pub const PORT_VAR: &'static str = "PORT";
    /// Environment variable holding the listen host.
    pub const HOST_VAR: &'static str = "DUEL_BIND_HOST";

    /// Builds a config from the process environment. Unset variables keep
    /// their defaults.
    ///
    /// # Errors
    /// [`DuelError::Config`] if a variable is set but can't be parsed.
    pub fn from_env() -> Result<Self, DuelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DuelError> {
        let host = lookup(Self::HOST_VAR)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(Self::PORT_VAR) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                DuelError::Config(format!("{}={raw:?}: {e}", Self::PORT_VAR))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            bind_addr: format!("{host}:{port}"),
        })
    }
}
