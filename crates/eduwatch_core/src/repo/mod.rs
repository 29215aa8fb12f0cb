//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Enforce relational invariants the schema alone cannot (existence checks
//!   before writes, assignment cleanup, snapshot sync).
//! - Map store failures to semantic error kinds.
//!
//! # Invariants
//! - Every operation opens its own connection and drops it before returning.
//! - Multi-row mutations run inside one transaction.
//! - Raw SQLite text never appears in `RepoError`'s `Display`.

pub mod assignment_repo;
pub mod attendance_repo;
pub mod schedule_repo;
pub mod subject_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::schedule::ScheduleId;
use crate::model::subject::SubjectId;
use crate::model::user::UserId;
use crate::model::ValidationError;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Semantic repository error.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    DuplicateUsername(String),
    DuplicateSubjectName(String),
    /// Lookup key that matched no user (id, username or full name).
    UserNotFound(String),
    SubjectNotFound(SubjectId),
    ScheduleNotFound(ScheduleId),
    ScheduleConflict,
    InvalidCredentials,
    /// Persisted row cannot be converted to a valid model.
    InvalidData(String),
    /// Connection-level or unexpected store failure.
    Store(DbError),
}

/// Error kind exposed across the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    DuplicateUsername,
    DuplicateSubjectName,
    UserNotFound,
    SubjectNotFound,
    ScheduleNotFound,
    ScheduleConflict,
    InvalidCredentials,
    /// The store schema could not be brought to the current version.
    MigrationError,
    StoreUnavailable,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::DuplicateUsername(_) => ErrorKind::DuplicateUsername,
            Self::DuplicateSubjectName(_) => ErrorKind::DuplicateSubjectName,
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::SubjectNotFound(_) => ErrorKind::SubjectNotFound,
            Self::ScheduleNotFound(_) => ErrorKind::ScheduleNotFound,
            Self::ScheduleConflict => ErrorKind::ScheduleConflict,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::Store(DbError::Migration(_) | DbError::UnsupportedSchemaVersion { .. }) => {
                ErrorKind::MigrationError
            }
            Self::InvalidData(_) | Self::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateUsername(username) => write!(f, "username already exists: {username}"),
            Self::DuplicateSubjectName(name) => write!(f, "subject already exists: {name}"),
            Self::UserNotFound(key) => write!(f, "user not found: {key}"),
            Self::SubjectNotFound(id) => write!(f, "subject not found: {id}"),
            Self::ScheduleNotFound(id) => write!(f, "schedule not found: {id}"),
            Self::ScheduleConflict => write!(f, "schedule entry already exists for this slot"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::Store(DbError::Migration(_) | DbError::UnsupportedSchemaVersion { .. }) => {
                write!(f, "store schema migration failed")
            }
            Self::InvalidData(_) | Self::Store(_) => write!(f, "store unavailable"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(DbError::Sqlite(value))
    }
}

/// Whether `err` is a UNIQUE / PRIMARY KEY constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

pub(crate) fn ensure_user_exists(conn: &Connection, user_id: UserId) -> RepoResult<()> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE id = ?1;", [user_id], |row| {
            row.get(0)
        })
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::UserNotFound(user_id.to_string())),
    }
}

pub(crate) fn ensure_subject_exists(conn: &Connection, subject_id: SubjectId) -> RepoResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM subjects WHERE id = ?1;",
            [subject_id],
            |row| row.get(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::SubjectNotFound(subject_id)),
    }
}

pub(crate) fn count_to_u64(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` for {column}")))
}
