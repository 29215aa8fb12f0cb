//! Subject catalog repository.
//!
//! # Invariants
//! - Subject names are unique.
//! - Deleting a subject removes its assignments in the same transaction;
//!   schedules follow through the `ON DELETE CASCADE` foreign key.

use super::{is_unique_violation, RepoError, RepoResult};
use crate::db::Store;
use crate::model::require;
use crate::model::subject::{Subject, SubjectId};
use log::info;
use rusqlite::{params, Connection, Row, TransactionBehavior};

pub(crate) const SUBJECT_SELECT_SQL: &str = "SELECT
    subjects.id,
    subjects.name,
    subjects.description,
    subjects.created_at
FROM subjects";

pub trait SubjectRepository {
    fn create_subject(&self, name: &str, description: Option<&str>) -> RepoResult<SubjectId>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
    /// Full catalog ordered by name.
    fn list_subjects(&self) -> RepoResult<Vec<Subject>>;
    fn delete_subject(&self, id: SubjectId) -> RepoResult<()>;
}

pub struct SqliteSubjectRepository<'a> {
    store: &'a Store,
}

impl<'a> SqliteSubjectRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl SubjectRepository for SqliteSubjectRepository<'_> {
    fn create_subject(&self, name: &str, description: Option<&str>) -> RepoResult<SubjectId> {
        require("name", name)?;
        let name = name.trim();
        let now = self.store.clock().now();

        let conn = self.store.connect()?;
        let inserted = conn.execute(
            "INSERT INTO subjects (name, description, created_at) VALUES (?1, ?2, ?3);",
            params![name, description, now],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateSubjectName(name.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        let id = conn.last_insert_rowid();
        info!("event=subject_create module=repo status=ok subject_id={id}");
        Ok(id)
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&format!("{SUBJECT_SELECT_SQL} WHERE subjects.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_row(row)?));
        }
        Ok(None)
    }

    fn list_subjects(&self) -> RepoResult<Vec<Subject>> {
        let conn = self.store.connect()?;
        query_subjects(
            &conn,
            &format!("{SUBJECT_SELECT_SQL} ORDER BY subjects.name ASC, subjects.id ASC;"),
            [],
        )
    }

    fn delete_subject(&self, id: SubjectId) -> RepoResult<()> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let assignments = tx.execute("DELETE FROM user_subjects WHERE subject_id = ?1;", [id])?;
        let deleted = tx.execute("DELETE FROM subjects WHERE id = ?1;", [id])?;
        if deleted == 0 {
            return Err(RepoError::SubjectNotFound(id));
        }
        tx.commit()?;

        info!(
            "event=subject_delete module=repo status=ok subject_id={} removed_assignments={}",
            id, assignments
        );
        Ok(())
    }
}

/// Runs a subject query whose select list is `SUBJECT_SELECT_SQL`.
pub(crate) fn query_subjects<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Subject>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut subjects = Vec::new();
    while let Some(row) = rows.next()? {
        subjects.push(parse_subject_row(row)?);
    }
    Ok(subjects)
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}
