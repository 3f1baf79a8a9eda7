use clap::Args;

use shiftboard::board::Board;

use super::schedule::print_month;
use super::{parse_month, OutputFormat};

/// Follow the board live, reprinting it after every reload
#[derive(Args)]
pub struct WatchCommand {
    /// Month (YYYY-MM), defaults to the current month
    #[arg(long)]
    month: Option<String>,
}

impl WatchCommand {
    pub async fn run(&self, board: &Board) -> Result<(), Box<dyn std::error::Error>> {
        let (year, month) = parse_month(self.month.as_deref())?;
        let mut loads = board.schedule().watch_loads();
        let mut sync = board.activate_sync().await?;

        print_month(board, year, month, None, &OutputFormat::Text).await?;
        println!("\nWatching for changes. Press Ctrl-C to stop.");

        loop {
            tokio::select! {
                changed = loads.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(error) = board.schedule().snapshot().await.last_error {
                        eprintln!("Reload failed: {}", error);
                        continue;
                    }
                    println!();
                    print_month(board, year, month, None, &OutputFormat::Text).await?;
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        sync.deactivate();
        Ok(())
    }
}
