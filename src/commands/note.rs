use chrono::{Datelike, TimeZone, Utc};
use clap::{Args, Subcommand};
use uuid::Uuid;

use shiftboard::board::Board;

use super::{parse_date, OutputFormat};

#[derive(Args)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub command: NoteSubcommand,
}

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// List the notes of one day
    List {
        /// Staff id
        staff: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a note to one day
    Add {
        /// Staff id
        staff: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Note text
        text: String,
    },

    /// Remove one of your own notes
    Remove {
        /// Staff id
        staff: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Note id (UUID)
        id: Uuid,
    },
}

impl NoteCommand {
    pub async fn run(&self, board: &Board) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            NoteSubcommand::List {
                staff,
                date,
                format,
            } => {
                let date = parse_date(date)?;
                let day = board
                    .schedule()
                    .day(staff, date.year(), date.month(), date.day())
                    .await;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&day)?);
                    }
                    OutputFormat::Text => {
                        println!("{} on {}: {}", staff, date, day.status);
                        if day.notes.is_empty() {
                            println!("No notes");
                        }
                        for note in &day.notes {
                            let written = Utc
                                .timestamp_millis_opt(note.timestamp)
                                .single()
                                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                                .unwrap_or_default();
                            println!("  {}  {} ({}): {}", note.id, note.author, written, note.text);
                        }
                    }
                }
                Ok(())
            }

            NoteSubcommand::Add { staff, date, text } => {
                let date = parse_date(date)?;
                let note = board.add_note(staff, date, text).await?;
                println!("Added note {}", note.id);
                Ok(())
            }

            NoteSubcommand::Remove { staff, date, id } => {
                let date = parse_date(date)?;
                board.delete_note(staff, date, *id).await?;
                println!("Removed note {}", id);
                Ok(())
            }
        }
    }
}
