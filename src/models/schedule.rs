use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Work,
    Rest,
    Vacation,
    Training,
    Unavailable,
    #[default]
    None,
}

impl ShiftStatus {
    pub const ALL: [ShiftStatus; 6] = [
        ShiftStatus::Work,
        ShiftStatus::Rest,
        ShiftStatus::Vacation,
        ShiftStatus::Training,
        ShiftStatus::Unavailable,
        ShiftStatus::None,
    ];

    /// One-character cell label for table output.
    pub fn label(&self) -> &'static str {
        match self {
            ShiftStatus::Work => "W",
            ShiftStatus::Rest => "R",
            ShiftStatus::Vacation => "V",
            ShiftStatus::Training => "T",
            ShiftStatus::Unavailable => "U",
            ShiftStatus::None => ".",
        }
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftStatus::Work => write!(f, "work"),
            ShiftStatus::Rest => write!(f, "rest"),
            ShiftStatus::Vacation => write!(f, "vacation"),
            ShiftStatus::Training => write!(f, "training"),
            ShiftStatus::Unavailable => write!(f, "unavailable"),
            ShiftStatus::None => write!(f, "none"),
        }
    }
}

impl FromStr for ShiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        ShiftStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == wanted)
            .ok_or_else(|| {
                let options: Vec<String> = ShiftStatus::ALL.iter().map(|st| st.to_string()).collect();
                format!("Invalid status '{}'. Valid options: {}", s, options.join(", "))
            })
    }
}

/// A text note attached to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub text: String,
    /// Display name of the author at the time of writing.
    pub author: String,
    pub author_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Note {
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: author.into(),
            author_id: author_id.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// One day's status plus its notes, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayRecord {
    pub status: ShiftStatus,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl DayRecord {
    pub fn new(status: ShiftStatus) -> Self {
        Self {
            status,
            notes: Vec::new(),
        }
    }

    /// Same notes, new status.
    pub fn with_status(&self, status: ShiftStatus) -> Self {
        Self {
            status,
            notes: self.notes.clone(),
        }
    }

    /// Same status, `note` appended.
    pub fn with_note(&self, note: Note) -> Self {
        let mut notes = self.notes.clone();
        notes.push(note);
        Self {
            status: self.status,
            notes,
        }
    }

    /// Same status, note `note_id` removed.
    ///
    /// Only the note's author may remove it.
    pub fn without_note(&self, note_id: Uuid, requester_id: &str) -> Result<Self, Error> {
        let note = self
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .ok_or_else(|| Error::Validation(format!("Note not found: {}", note_id)))?;

        if note.author_id != requester_id {
            return Err(Error::Permission(format!(
                "note {} can only be deleted by its author",
                note_id
            )));
        }

        Ok(Self {
            status: self.status,
            notes: self
                .notes
                .iter()
                .filter(|n| n.id != note_id)
                .cloned()
                .collect(),
        })
    }
}

/// Number of calendar days in `month` (1-based) of `year`; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => (end - start).num_days() as u32,
        _ => 0,
    }
}

/// Pads with default records or truncates so the result has one record per day.
pub fn normalize_month(mut days: Vec<DayRecord>, year: i32, month: u32) -> Vec<DayRecord> {
    days.resize_with(days_in_month(year, month) as usize, DayRecord::default);
    days
}

/// Identity of one staff member's month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey {
    pub year: i32,
    pub month: u32,
    pub staff_id: String,
}

impl ScheduleKey {
    pub fn new(year: i32, month: u32, staff_id: impl Into<String>) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(format!(
                "Invalid month {}. Expected 1-12.",
                month
            )));
        }
        let staff_id = staff_id.into();
        if staff_id.is_empty() {
            return Err(Error::Validation("Staff id cannot be empty".to_string()));
        }
        Ok(Self {
            year,
            month,
            staff_id,
        })
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.staff_id)
    }
}

impl FromStr for ScheduleKey {
    type Err = Error;

    /// Splits on the first two dashes; the staff id keeps any further dashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validation(format!("Invalid schedule key '{}'", s));

        let mut parts = s.splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let staff_id = parts.next().ok_or_else(invalid)?;

        Self::new(year, month, staff_id)
    }
}

/// Persisted form of a staff member's month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub key: String,
    pub year: i32,
    pub month: u32,
    pub staff_id: String,
    pub schedule: Vec<DayRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleRow {
    pub fn new(key: &ScheduleKey, schedule: Vec<DayRecord>) -> Self {
        Self {
            key: key.to_string(),
            year: key.year,
            month: key.month,
            staff_id: key.staff_id.clone(),
            schedule,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn schedule_key(&self) -> ScheduleKey {
        ScheduleKey {
            year: self.year,
            month: self.month,
            staff_id: self.staff_id.clone(),
        }
    }

    /// Checks that `key` is the canonical form of the structured columns.
    pub fn validate_key(&self) -> Result<ScheduleKey, Error> {
        let parsed: ScheduleKey = self.key.parse()?;
        if parsed != self.schedule_key() || parsed.to_string() != self.key {
            return Err(Error::Validation(format!(
                "Schedule key '{}' does not match {}",
                self.key,
                self.schedule_key()
            )));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(ShiftStatus::from_str("WORK").unwrap(), ShiftStatus::Work);
        assert_eq!(
            ShiftStatus::from_str("unavailable").unwrap(),
            ShiftStatus::Unavailable
        );
        assert!(ShiftStatus::from_str("sleeping").is_err());
    }

    #[test]
    fn test_status_json() {
        let json = serde_json::to_string(&ShiftStatus::Vacation).unwrap();
        assert_eq!(json, "\"vacation\"");
    }

    #[test]
    fn test_default_day_record() {
        let day = DayRecord::default();
        assert_eq!(day.status, ShiftStatus::None);
        assert!(day.notes.is_empty());
    }

    #[test]
    fn test_day_record_without_notes_field_deserializes() {
        let day: DayRecord = serde_json::from_str(r#"{"status":"rest"}"#).unwrap();
        assert_eq!(day.status, ShiftStatus::Rest);
        assert!(day.notes.is_empty());
    }

    #[test]
    fn test_status_change_keeps_notes() {
        let day = DayRecord::new(ShiftStatus::Work).with_note(Note::new("late", "alice", "a"));
        let changed = day.with_status(ShiftStatus::Rest);

        assert_eq!(changed.status, ShiftStatus::Rest);
        assert_eq!(changed.notes, day.notes);
        assert_eq!(day.status, ShiftStatus::Work);
    }

    #[test]
    fn test_notes_keep_insertion_order() {
        let day = DayRecord::default()
            .with_note(Note::new("first", "alice", "a"))
            .with_note(Note::new("second", "bob", "b"));

        let texts: Vec<&str> = day.notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_notes_created_together_have_distinct_ids() {
        let first = Note::new("same", "alice", "a");
        let second = Note::new("same", "alice", "a");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_author_can_remove_note() {
        let note = Note::new("swap with bob", "alice", "a");
        let id = note.id;
        let day = DayRecord::new(ShiftStatus::Work).with_note(note);

        let updated = day.without_note(id, "a").unwrap();
        assert!(updated.notes.is_empty());
        assert_eq!(updated.status, ShiftStatus::Work);
    }

    #[test]
    fn test_other_user_cannot_remove_note() {
        let note = Note::new("mine", "alice", "a");
        let id = note.id;
        let day = DayRecord::default().with_note(note);

        let result = day.without_note(id, "b");
        assert!(matches!(result, Err(Error::Permission(_))));
        assert_eq!(day.notes.len(), 1);
    }

    #[test]
    fn test_remove_unknown_note() {
        let day = DayRecord::default();
        assert!(matches!(
            day.without_note(Uuid::new_v4(), "a"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 13), 0);
    }

    #[test]
    fn test_normalize_month_pads_and_truncates() {
        let padded = normalize_month(vec![DayRecord::new(ShiftStatus::Work)], 2025, 2);
        assert_eq!(padded.len(), 28);
        assert_eq!(padded[0].status, ShiftStatus::Work);
        assert_eq!(padded[27], DayRecord::default());

        let truncated = normalize_month(vec![DayRecord::default(); 31], 2025, 4);
        assert_eq!(truncated.len(), 30);
    }

    #[test]
    fn test_schedule_key_format_and_parse() {
        let key = ScheduleKey::new(2025, 3, "nurse-7").unwrap();
        assert_eq!(key.to_string(), "2025-3-nurse-7");

        let parsed: ScheduleKey = "2025-3-nurse-7".parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_schedule_key_rejects_bad_input() {
        assert!(ScheduleKey::new(2025, 0, "n1").is_err());
        assert!(ScheduleKey::new(2025, 1, "").is_err());
        assert!("2025-x-n1".parse::<ScheduleKey>().is_err());
        assert!("2025-3".parse::<ScheduleKey>().is_err());
    }

    #[test]
    fn test_schedule_row_carries_structured_key() {
        let key = ScheduleKey::new(2025, 1, "112").unwrap();
        let row = ScheduleRow::new(&key, vec![DayRecord::default()]);

        assert_eq!(row.key, "2025-1-112");
        assert_eq!(row.staff_id, "112");
        assert_eq!(row.schedule_key(), key);
        assert_eq!(row.validate_key().unwrap(), key);
    }

    #[test]
    fn test_mislabelled_schedule_row_is_rejected() {
        let key = ScheduleKey::new(2024, 1, "a").unwrap();

        let mut padded = ScheduleRow::new(&key, Vec::new());
        padded.key = "2024-01-a".to_string();
        assert!(matches!(padded.validate_key(), Err(Error::Validation(_))));

        let mut foreign = ScheduleRow::new(&key, Vec::new());
        foreign.key = "1999-9-zzz".to_string();
        assert!(matches!(foreign.validate_key(), Err(Error::Validation(_))));

        let mut bad_month = ScheduleRow::new(&key, Vec::new());
        bad_month.month = 13;
        bad_month.key = "2024-13-a".to_string();
        assert!(bad_month.validate_key().is_err());
    }

    #[test]
    fn test_schedule_key_days() {
        assert_eq!(ScheduleKey::new(2024, 2, "a").unwrap().days(), 29);
        assert_eq!(ScheduleKey::new(2025, 12, "a").unwrap().days(), 31);
    }
}
