use clap::{Args, Subcommand};
use serde_json::json;

use shiftboard::board::Board;
use shiftboard::models::{DayRecord, ShiftStatus};

use super::{parse_date, parse_month, OutputFormat};

#[derive(Args)]
pub struct ScheduleCommand {
    #[command(subcommand)]
    pub command: ScheduleSubcommand,
}

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Show a month of the board
    Show {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Only this staff id
        #[arg(long)]
        staff: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Set one day's status
    Set {
        /// Staff id
        staff: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Status: work, rest, vacation, training, unavailable, none
        status: ShiftStatus,
    },

    /// Delete stored schedules of staff no longer on the roster (admin only)
    Prune,
}

impl ScheduleCommand {
    pub async fn run(&self, board: &Board) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ScheduleSubcommand::Show {
                month,
                staff,
                format,
            } => {
                let (year, month) = parse_month(month.as_deref())?;
                print_month(board, year, month, staff.as_deref(), format).await
            }

            ScheduleSubcommand::Set {
                staff,
                date,
                status,
            } => {
                let date = parse_date(date)?;
                board.set_status(staff, date, *status).await?;
                println!("{} on {}: {}", staff, date, status);
                Ok(())
            }

            ScheduleSubcommand::Prune => {
                if !board.auth().is_admin().await {
                    return Err("Pruning schedules requires the administrator role".into());
                }
                let removed = board.schedule().prune_orphans().await?;
                println!("Removed {} orphaned schedule(s)", removed);
                Ok(())
            }
        }
    }
}

fn cell(day: &DayRecord) -> String {
    let marker = if day.notes.is_empty() { " " } else { "*" };
    format!("{}{}", day.status.label(), marker)
}

/// Prints one month for every visible staff member.
pub async fn print_month(
    board: &Board,
    year: i32,
    month: u32,
    staff: Option<&str>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let nurses: Vec<_> = board
        .visible_nurses()
        .await
        .into_iter()
        .filter(|n| staff.map_or(true, |id| n.id == id))
        .collect();

    let mut rows = Vec::with_capacity(nurses.len());
    for nurse in nurses {
        let days = board.schedule().month(&nurse.id, year, month).await;
        rows.push((nurse, days));
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = rows
                .iter()
                .map(|(nurse, days)| json!({ "staff_id": nurse.id, "name": nurse.name, "days": days }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "year": year, "month": month, "staff": rows }))?
            );
        }
        OutputFormat::Text => {
            println!("{}-{:02}", year, month);
            if rows.is_empty() {
                println!("No staff found");
                return Ok(());
            }

            let days_in_month = rows[0].1.len();
            let header: String = (1..=days_in_month).map(|d| format!("{:<3}", d)).collect();
            println!("{:<20} {}", "NAME", header.trim_end());
            println!("{}", "-".repeat(21 + days_in_month * 3));

            for (nurse, days) in &rows {
                let name = if nurse.name.chars().count() > 20 {
                    format!("{}...", nurse.name.chars().take(17).collect::<String>())
                } else {
                    nurse.name.clone()
                };
                let cells: String = days.iter().map(|d| format!("{} ", cell(d))).collect();
                println!("{:<20} {}", name, cells.trim_end());
            }

            println!(
                "\nW work  R rest  V vacation  T training  U unavailable  . none  * has notes"
            );
        }
    }
    Ok(())
}
