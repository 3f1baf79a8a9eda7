use clap::{Args, Subcommand};
use std::io::{self, Write};

use shiftboard::board::Board;

use super::OutputFormat;

#[derive(Args)]
pub struct StaffCommand {
    #[command(subcommand)]
    pub command: StaffSubcommand,
}

#[derive(Subcommand)]
pub enum StaffSubcommand {
    /// List the staff visible to the signed-in user
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Register a staff member (admin only)
    Add {
        /// Login name; also used as the display name
        username: String,

        /// Login secret for the new account
        #[arg(long)]
        secret: String,
    },

    /// Remove a staff member and their schedules (admin only)
    Remove {
        /// Staff id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl StaffCommand {
    pub async fn run(&self, board: &Board) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StaffSubcommand::List { format } => {
                let nurses = board.visible_nurses().await;

                if nurses.is_empty() {
                    println!("No staff found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&nurses)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  NAME", "ID");
                        println!("{}", "-".repeat(60));
                        for nurse in &nurses {
                            println!("{:<36}  {}", nurse.id, nurse.name);
                        }
                        println!("\nTotal: {} staff member(s)", nurses.len());
                    }
                }
                Ok(())
            }

            StaffSubcommand::Add { username, secret } => {
                let nurse = board.register_staff(username, secret).await?;
                println!("Registered {} ({})", nurse.name, nurse.id);
                Ok(())
            }

            StaffSubcommand::Remove { id, force } => {
                let nurse = board
                    .visible_nurses()
                    .await
                    .into_iter()
                    .find(|n| &n.id == id)
                    .ok_or_else(|| format!("Staff member not found: {}", id))?;

                // Confirm deletion unless --force is used
                if !force {
                    print!("Remove '{}' and all their schedules? [y/N] ", nurse.name);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Removal cancelled.");
                        return Ok(());
                    }
                }

                board.remove_staff(&nurse.id).await?;
                println!("Removed {}", nurse.name);
                Ok(())
            }
        }
    }
}
