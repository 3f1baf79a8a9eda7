mod config_cmd;
mod note;
mod schedule;
mod staff;
mod watch;

pub use config_cmd::ConfigCommand;
pub use note::NoteCommand;
pub use schedule::ScheduleCommand;
pub use staff::StaffCommand;
pub use watch::WatchCommand;

use chrono::{Datelike, Local, NaiveDate};
use clap::ValueEnum;

use shiftboard::board::Board;

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Connects, bootstraps and signs in with the configured account.
pub async fn open_session(board: &Board, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    board.ensure_reachable(config.probe_timeout()).await?;
    board.start().await?;

    let secret = config.secret.value.as_deref().ok_or(
        "No secret configured. Set SHIFTBOARD_SECRET or add 'secret' to the config file.",
    )?;
    let user = board.sign_in(&config.username.value, secret).await?;
    tracing::debug!("Session opened for {}", user);
    Ok(())
}

/// Parses `YYYY-MM`, defaulting to the current month.
pub fn parse_month(month: Option<&str>) -> Result<(i32, u32), Box<dyn std::error::Error>> {
    match month {
        Some(m) => {
            let date = NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .map_err(|_| format!("Invalid month '{}'. Use YYYY-MM format.", m))?;
            Ok((date.year(), date.month()))
        }
        None => {
            let today = Local::now().date_naive();
            Ok((today.year(), today.month()))
        }
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD format.", date).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(Some("2024-02")).unwrap(), (2024, 2));
        assert!(parse_month(Some("2024-13")).is_err());
        assert!(parse_month(Some("feb")).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
    }
}
