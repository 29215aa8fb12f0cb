//! Attendance events.
//!
//! # Responsibility
//! - Separate the weak user back-reference from the point-in-time snapshot.
//!
//! # Invariants
//! - `UserRef` may dangle or be empty; display never depends on it.
//! - `AttendanceSnapshot` fields are copies taken when the record was made.
//!   Only a user full-name change rewrites `full_name`.

use super::user::UserId;
use super::{non_blank, require, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;

pub type AttendanceRecordId = i64;

/// Subject label stored when neither `subject` nor `department` is given.
pub const DEFAULT_SUBJECT_LABEL: &str = "General";

/// Weak back-reference to the recording user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserRef(Option<UserId>);

impl UserRef {
    pub fn new(user_id: Option<UserId>) -> Self {
        Self(user_id)
    }

    pub fn id(self) -> Option<UserId> {
        self.0
    }
}

/// Values copied into the record at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSnapshot {
    pub full_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub id: AttendanceRecordId,
    #[serde(rename = "user_id")]
    pub user: UserRef,
    #[serde(flatten)]
    pub snapshot: AttendanceSnapshot,
    /// Attendance state such as "Present"; unrelated to `User::status`.
    pub status: String,
    /// Client-supplied event time.
    pub timestamp: String,
    pub created_at: Option<String>,
}

/// Dashboard row: a record joined with whatever the user row still says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub username: Option<String>,
    /// Employment status of the linked user, `"Unknown"` when unlinked.
    pub user_status: String,
}

/// Input for marking attendance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkAttendance {
    /// Matched exactly against `users.full_name`.
    pub full_name: String,
    pub subject: Option<String>,
    /// Deprecated alias for `subject`, read only when `subject` is absent.
    pub department: Option<String>,
    pub status: String,
    pub timestamp: String,
}

impl MarkAttendance {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("full_name", &self.full_name)?;
        require("status", &self.status)?;
        require("timestamp", &self.timestamp)
    }

    pub fn resolved_subject(&self) -> &str {
        non_blank(self.subject.as_deref())
            .or_else(|| non_blank(self.department.as_deref()))
            .unwrap_or(DEFAULT_SUBJECT_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AttendanceStats {
    pub total_users: u64,
    pub total_attendance: u64,
    pub today_attendance: u64,
    /// Today's records per employment status of linked users.
    pub status_breakdown: BTreeMap<String, u64>,
}
