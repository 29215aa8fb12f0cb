//! Domain model for users, subjects, schedules and attendance.
//!
//! # Responsibility
//! - Define the records the repository layer reads and writes.
//! - Own input validation that does not need the store.
//!
//! # Invariants
//! - Identifiers are SQLite integer row ids.
//! - Attendance keeps its user back-reference and its snapshot fields as
//!   separate types.

pub mod attendance;
pub mod schedule;
pub mod subject;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field missing or blank.
    EmptyField(&'static str),
    /// `day_of_week` is not one of the seven weekday names.
    InvalidDay(String),
    /// Time is not `HH:MM` (24h).
    InvalidTime { field: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` is required"),
            Self::InvalidDay(value) => write!(f, "invalid day of week `{value}`"),
            Self::InvalidTime { field, value } => {
                write!(f, "`{field}` must be HH:MM, got `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Fails with `EmptyField` when `value` is blank after trimming.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// Treats blank optional text as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
