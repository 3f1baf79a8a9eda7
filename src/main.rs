use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    open_session, ConfigCommand, NoteCommand, ScheduleCommand, StaffCommand, WatchCommand,
};
use config::Config;
use shiftboard::store::StoreClient;
use shiftboard::Board;

#[derive(Parser)]
#[command(name = "shiftboard")]
#[command(version)]
#[command(about = "Shift-scheduling board for a nursing team", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the store service answers
    Health,

    /// Create the default administrator if it is missing
    Init,

    /// Manage staff
    Staff(StaffCommand),

    /// Show and edit monthly schedules
    Schedule(ScheduleCommand),

    /// Manage day notes
    Note(NoteCommand),

    /// Follow the board live
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let store = StoreClient::new(
        config.server_url.value.clone(),
        config.api_key.value.clone(),
    );
    let board = Board::new(store);

    match cli.command {
        Some(Commands::Health) => {
            board.ensure_reachable(config.probe_timeout()).await?;
            println!("Store at {} is reachable", config.server_url.value);
        }
        Some(Commands::Init) => {
            board.ensure_reachable(config.probe_timeout()).await?;
            board.auth().initialize().await?;
            println!("Store initialized");
        }
        Some(Commands::Staff(cmd)) => {
            open_session(&board, &config).await?;
            cmd.run(&board).await?;
        }
        Some(Commands::Schedule(cmd)) => {
            open_session(&board, &config).await?;
            cmd.run(&board).await?;
        }
        Some(Commands::Note(cmd)) => {
            open_session(&board, &config).await?;
            cmd.run(&board).await?;
        }
        Some(Commands::Watch(cmd)) => {
            open_session(&board, &config).await?;
            cmd.run(&board).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
