//! Attendance repository.
//!
//! # Responsibility
//! - Record attendance against a user resolved by full name.
//! - Serve the dashboard feed and daily statistics.
//!
//! # Invariants
//! - Records keep their snapshot even after the user row is gone.
//! - `user_status` is `"Unknown"` exactly when the record has no live user.

use super::{count_to_u64, RepoError, RepoResult};
use crate::db::Store;
use crate::model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceRecordId, AttendanceSnapshot, AttendanceStats,
    MarkAttendance, UserRef,
};
use crate::model::user::{effective_status, UserId};
use log::{info, warn};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

const UNKNOWN_USER_STATUS: &str = "Unknown";

const ENTRY_SELECT_SQL: &str = "SELECT
    a.id,
    a.user_id,
    a.full_name,
    a.subject,
    a.status,
    a.timestamp,
    a.created_at,
    u.id AS linked_user_id,
    u.username,
    u.status AS user_status
FROM attendance_records a
LEFT JOIN users u ON u.id = a.user_id";

pub trait AttendanceRepository {
    fn mark_attendance(&self, mark: &MarkAttendance) -> RepoResult<AttendanceRecordId>;
    fn get_attendance(&self, id: AttendanceRecordId) -> RepoResult<Option<AttendanceEntry>>;
    /// Dashboard feed, newest timestamp first.
    fn list_attendance(&self) -> RepoResult<Vec<AttendanceEntry>>;
    /// Deletes every record and returns how many were removed.
    fn clear_attendance(&self) -> RepoResult<usize>;
    fn statistics(&self) -> RepoResult<AttendanceStats>;
}

pub struct SqliteAttendanceRepository<'a> {
    store: &'a Store,
}

impl<'a> SqliteAttendanceRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn mark_attendance(&self, mark: &MarkAttendance) -> RepoResult<AttendanceRecordId> {
        mark.validate()?;
        let full_name = mark.full_name.trim();
        let now = self.store.clock().now();

        let conn = self.store.connect()?;
        let user_id: Option<UserId> = conn
            .query_row(
                "SELECT id FROM users WHERE full_name = ?1 ORDER BY id ASC LIMIT 1;",
                [full_name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(user_id) = user_id else {
            warn!("event=attendance_mark module=repo status=error error_code=user_not_found");
            return Err(RepoError::UserNotFound(full_name.to_string()));
        };

        conn.execute(
            "INSERT INTO attendance_records (
                user_id,
                full_name,
                subject,
                status,
                timestamp,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user_id,
                full_name,
                mark.resolved_subject(),
                mark.status.trim(),
                mark.timestamp.trim(),
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(
            "event=attendance_mark module=repo status=ok record_id={} user_id={}",
            id, user_id
        );
        Ok(id)
    }

    fn get_attendance(&self, id: AttendanceRecordId) -> RepoResult<Option<AttendanceEntry>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&format!("{ENTRY_SELECT_SQL} WHERE a.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn list_attendance(&self) -> RepoResult<Vec<AttendanceEntry>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{ENTRY_SELECT_SQL} ORDER BY a.timestamp DESC, a.id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn clear_attendance(&self) -> RepoResult<usize> {
        let conn = self.store.connect()?;
        let removed = conn.execute("DELETE FROM attendance_records;", [])?;
        info!("event=attendance_clear module=repo status=ok removed={removed}");
        Ok(removed)
    }

    fn statistics(&self) -> RepoResult<AttendanceStats> {
        let today = self.store.clock().today();
        let conn = self.store.connect()?;

        let total_users: i64 =
            conn.query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        let total_attendance: i64 =
            conn.query_row("SELECT COUNT(*) FROM attendance_records;", [], |row| {
                row.get(0)
            })?;
        let today_attendance: i64 = conn.query_row(
            "SELECT COUNT(*) FROM attendance_records WHERE DATE(timestamp) = ?1;",
            [&today],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT u.status, COUNT(*)
             FROM attendance_records a
             JOIN users u ON u.id = a.user_id
             WHERE DATE(a.timestamp) = ?1
             GROUP BY u.status;",
        )?;
        let mut rows = stmt.query([&today])?;
        let mut status_breakdown = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let status = effective_status(row.get(0)?);
            let count = count_to_u64(row.get(1)?, "status_breakdown")?;
            // NULL and "Full Time" fold into one bucket.
            *status_breakdown.entry(status).or_insert(0) += count;
        }

        Ok(AttendanceStats {
            total_users: count_to_u64(total_users, "total_users")?,
            total_attendance: count_to_u64(total_attendance, "total_attendance")?,
            today_attendance: count_to_u64(today_attendance, "today_attendance")?,
            status_breakdown,
        })
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<AttendanceEntry> {
    let linked: Option<UserId> = row.get("linked_user_id")?;
    let user_status = match linked {
        Some(_) => effective_status(row.get("user_status")?),
        None => UNKNOWN_USER_STATUS.to_string(),
    };

    Ok(AttendanceEntry {
        record: AttendanceRecord {
            id: row.get("id")?,
            user: UserRef::new(row.get("user_id")?),
            snapshot: AttendanceSnapshot {
                full_name: row.get("full_name")?,
                subject: row.get("subject")?,
            },
            status: row.get("status")?,
            timestamp: row.get("timestamp")?,
            created_at: row.get("created_at")?,
        },
        username: row.get("username")?,
        user_status,
    })
}
