//! User-to-subject assignments.
//!
//! Users with no assignment may use the whole catalog.

use super::subject_repo::{query_subjects, SUBJECT_SELECT_SQL};
use super::{ensure_subject_exists, ensure_user_exists, RepoResult};
use crate::db::Store;
use crate::model::subject::{Subject, SubjectId};
use crate::model::user::UserId;
use log::info;
use rusqlite::{params, TransactionBehavior};

pub trait AssignmentRepository {
    /// Replaces the user's assignment set. Duplicate ids are ignored.
    fn set_user_subjects(&self, user_id: UserId, subject_ids: &[SubjectId]) -> RepoResult<()>;
    fn assigned_subjects(&self, user_id: UserId) -> RepoResult<Vec<Subject>>;
    /// Assigned subjects, or the full catalog when none are assigned.
    fn available_subjects_for_user(&self, user_id: UserId) -> RepoResult<Vec<Subject>>;
}

pub struct SqliteAssignmentRepository<'a> {
    store: &'a Store,
}

impl<'a> SqliteAssignmentRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn set_user_subjects(&self, user_id: UserId, subject_ids: &[SubjectId]) -> RepoResult<()> {
        let now = self.store.clock().now();
        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_user_exists(&tx, user_id)?;
        for subject_id in subject_ids {
            ensure_subject_exists(&tx, *subject_id)?;
        }

        tx.execute("DELETE FROM user_subjects WHERE user_id = ?1;", [user_id])?;
        let mut assigned = 0usize;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO user_subjects (user_id, subject_id, created_at)
                 VALUES (?1, ?2, ?3);",
            )?;
            for subject_id in subject_ids {
                assigned += insert.execute(params![user_id, subject_id, now])?;
            }
        }
        tx.commit()?;

        info!(
            "event=assignment_set module=repo status=ok user_id={} assigned={}",
            user_id, assigned
        );
        Ok(())
    }

    fn assigned_subjects(&self, user_id: UserId) -> RepoResult<Vec<Subject>> {
        let conn = self.store.connect()?;
        query_subjects(
            &conn,
            &format!(
                "{SUBJECT_SELECT_SQL}
                 JOIN user_subjects us ON us.subject_id = subjects.id
                 WHERE us.user_id = ?1
                 ORDER BY subjects.name ASC, subjects.id ASC;"
            ),
            [user_id],
        )
    }

    fn available_subjects_for_user(&self, user_id: UserId) -> RepoResult<Vec<Subject>> {
        let assigned = self.assigned_subjects(user_id)?;
        if !assigned.is_empty() {
            return Ok(assigned);
        }
        let conn = self.store.connect()?;
        query_subjects(
            &conn,
            &format!("{SUBJECT_SELECT_SQL} ORDER BY subjects.name ASC, subjects.id ASC;"),
            [],
        )
    }
}
