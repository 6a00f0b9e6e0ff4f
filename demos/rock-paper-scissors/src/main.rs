use duel::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.bind_addr, "starting rock-paper-scissors server");

    let server = DuelServer::builder().config(config).build().await?;
    server.run().await?;
    Ok(())
}
