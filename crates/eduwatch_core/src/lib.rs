//! Persistence core for EduWatch attendance and scheduling.
//! This crate owns the schema, its migrations and every data access rule.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod startup;

pub use auth::{PasswordHasher, Sha256PasswordHasher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CoreConfig;
pub use db::{open_store, DbError, DbResult, Store};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::ValidationError;
pub use repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
pub use repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
pub use repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
pub use repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{ErrorKind, RepoError, RepoResult};
pub use seed::{seed_defaults, SeedReport};
pub use startup::{bootstrap, Bootstrapped};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
