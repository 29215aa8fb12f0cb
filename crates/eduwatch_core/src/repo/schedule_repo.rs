//! Weekly schedule repository.
//!
//! # Invariants
//! - New rows store the canonical weekday name and trimmed `HH:MM` times.
//! - Slot uniqueness is arbitrated by the store's UNIQUE constraint.
//! - Listing order is weekday ordinal, then start time, then id.

use super::{
    ensure_subject_exists, ensure_user_exists, is_unique_violation, RepoError, RepoResult,
};
use crate::db::Store;
use crate::model::schedule::{day_sort_key, NewSchedule, Schedule, ScheduleId};
use crate::model::user::UserId;
use log::{info, warn};
use rusqlite::{params, Row, TransactionBehavior};

pub trait ScheduleRepository {
    fn add_schedule(&self, entry: &NewSchedule) -> RepoResult<ScheduleId>;
    fn list_schedules_for_user(&self, user_id: UserId) -> RepoResult<Vec<Schedule>>;
    fn delete_schedule(&self, id: ScheduleId) -> RepoResult<()>;
}

pub struct SqliteScheduleRepository<'a> {
    store: &'a Store,
}

impl<'a> SqliteScheduleRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn add_schedule(&self, entry: &NewSchedule) -> RepoResult<ScheduleId> {
        let day = entry.validate()?;
        let now = self.store.clock().now();

        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_user_exists(&tx, entry.user_id)?;
        ensure_subject_exists(&tx, entry.subject_id)?;

        let inserted = tx.execute(
            "INSERT INTO schedules (
                user_id,
                subject_id,
                day_of_week,
                start_time,
                end_time,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.user_id,
                entry.subject_id,
                day.as_str(),
                entry.start_time.trim(),
                entry.end_time.trim(),
                now,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                warn!(
                    "event=schedule_add module=repo status=error error_code=schedule_conflict user_id={}",
                    entry.user_id
                );
                return Err(RepoError::ScheduleConflict);
            }
            Err(err) => return Err(err.into()),
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=schedule_add module=repo status=ok schedule_id={} user_id={}",
            id, entry.user_id
        );
        Ok(id)
    }

    fn list_schedules_for_user(&self, user_id: UserId) -> RepoResult<Vec<Schedule>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(
            "SELECT
                id,
                user_id,
                subject_id,
                day_of_week,
                start_time,
                end_time,
                created_at
             FROM schedules
             WHERE user_id = ?1
             ORDER BY start_time ASC, id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut schedules = Vec::new();
        while let Some(row) = rows.next()? {
            schedules.push(parse_schedule_row(row)?);
        }

        // Stable: rows within one day keep the SQL order.
        schedules.sort_by_key(|schedule| day_sort_key(&schedule.day_of_week));
        Ok(schedules)
    }

    fn delete_schedule(&self, id: ScheduleId) -> RepoResult<()> {
        let conn = self.store.connect()?;
        let deleted = conn.execute("DELETE FROM schedules WHERE id = ?1;", [id])?;
        if deleted == 0 {
            return Err(RepoError::ScheduleNotFound(id));
        }
        info!("event=schedule_delete module=repo status=ok schedule_id={id}");
        Ok(())
    }
}

fn parse_schedule_row(row: &Row<'_>) -> RepoResult<Schedule> {
    Ok(Schedule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject_id: row.get(2)?,
        day_of_week: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        created_at: row.get(6)?,
    })
}
