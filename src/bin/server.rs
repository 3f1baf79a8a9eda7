//! Shiftboard store server
//!
//! Hosts the `users`, `nurses` and `schedules` collections in SQLite and
//! pushes change notifications to realtime subscribers.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SHIFTBOARD_PORT`: Port to listen on (default: 8080)
//! - `SHIFTBOARD_DATABASE_PATH`: SQLite file (default: ~/.local/share/shiftboard-server/shiftboard.db)
//! - `SHIFTBOARD_CONFIG`: Path to config file (default: ~/.config/shiftboard-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - "your-secret-key-here"
//! ```
//!
//! With no keys configured the service accepts every request.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftboard::db::{init_db, Database};
use shiftboard::server::{self, ApiKeyStore, AppState, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    tracing::info!("Database: {}", config.database_path.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let pool = init_db(&config.database_path).await?;

    let api_keys = ApiKeyStore::load(&config.config_path);
    if api_keys.is_open() {
        tracing::warn!("No API keys configured - the store accepts unauthenticated requests");
    }

    let state = AppState::new(Database::new(pool), api_keys);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, state).await?;
    Ok(())
}
