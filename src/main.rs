//! Tambola tournament server binary.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tambola::api::{ApiServer, AppState, ServerSettings};
use tambola::config::TambolaConfig;
use tambola::game::broadcast::BroadcastCoordinator;
use tambola::game::registry::GameSessionRegistry;
use tambola::game::ticket::TicketGenerator;
use tambola::game::wallet::WalletLedger;
use tambola::storage::MemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tambola", about = "Live Tambola tournament server", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tambola=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let config = TambolaConfig::load(path)?;
            info!("📋 loaded configuration from {}", path.display());
            config
        }
        None => TambolaConfig::default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    let store = Arc::new(MemoryStore::new());
    let broadcast = Arc::new(BroadcastCoordinator::new(config.game.room_channel_capacity));
    let generator = TicketGenerator::new(config.game.ticket_max_attempts_per_cell);
    let registry = Arc::new(GameSessionRegistry::new(
        store.clone(),
        broadcast,
        generator,
    ));
    let wallet = Arc::new(WalletLedger::new(store));

    let state = Arc::new(AppState {
        registry,
        wallet,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let server = ApiServer::new(ServerSettings::from(&config.server), state);
    server.run().await?;
    Ok(())
}
