//! Weekly teaching schedule entries.
//!
//! # Invariants
//! - `(user_id, subject_id, day_of_week, start_time)` is unique in the store.
//! - New entries use canonical weekday names and `HH:MM` 24h times.
//!   `end_time` may be earlier than `start_time` for slots past midnight.
//! - Stored rows may carry legacy day values; they sort after Sunday.

use super::subject::SubjectId;
use super::user::UserId;
use super::{require, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub type ScheduleId = i64;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Case-insensitive parse of a full weekday name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(value))
    }

    /// Monday = 1 ... Sunday = 7.
    pub fn ordinal(self) -> u8 {
        self as u8 + 1
    }
}

/// Sort key for a stored day value; unrecognized values sort last.
pub fn day_sort_key(day_of_week: &str) -> u8 {
    Weekday::parse(day_of_week).map_or(8, Weekday::ordinal)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

impl NewSchedule {
    /// Validates the entry and returns its canonical weekday.
    pub fn validate(&self) -> Result<Weekday, ValidationError> {
        require("day_of_week", &self.day_of_week)?;
        let day = Weekday::parse(&self.day_of_week)
            .ok_or_else(|| ValidationError::InvalidDay(self.day_of_week.clone()))?;
        check_time("start_time", &self.start_time)?;
        check_time("end_time", &self.end_time)?;
        Ok(day)
    }
}

fn check_time(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if TIME_RE.is_match(value.trim()) {
        return Ok(());
    }
    Err(ValidationError::InvalidTime {
        field,
        value: value.to_string(),
    })
}
