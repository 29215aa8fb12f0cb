//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply each pending migration in its own transaction.
//! - Bring legacy stores of any historical shape to the canonical schema.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every step inspects the live schema, so re-running it is a no-op.
//! - A rename-via-copy step precedes the additive and removal steps of the
//!   same column pair.

mod steps;

pub use steps::{live_columns, Step};

use crate::db::schema::{ATTENDANCE_RECORDS, SUBJECTS, USERS};
use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// One registered schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub step: Step,
}

/// Result of ensuring one migration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step changed the schema or data.
    Applied,
    /// The live schema already had the change.
    AlreadyCurrent,
}

impl StepOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyCurrent => "current",
        }
    }
}

/// Schema reconciliation failure. The failing step was rolled back.
#[derive(Debug)]
pub struct MigrationError {
    pub version: u32,
    pub name: &'static str,
    pub source: rusqlite::Error,
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "migration {} `{}` failed: {}",
            self.version, self.name, self.source
        )
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Outcome of one `apply_migrations` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Per-step outcomes for migrations that were pending.
    pub steps: Vec<(u32, StepOutcome)>,
}

impl MigrationReport {
    /// Number of steps that changed the store.
    pub fn applied_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|(_, outcome)| *outcome == StepOutcome::Applied)
            .count()
    }
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_base_tables",
        step: Step::CreateTables,
    },
    Migration {
        version: 2,
        name: "users_add_status",
        step: Step::AddColumn {
            table: &USERS,
            column: "status",
        },
    },
    Migration {
        version: 3,
        name: "users_add_updated_at",
        step: Step::AddColumn {
            table: &USERS,
            column: "updated_at",
        },
    },
    Migration {
        version: 4,
        name: "attendance_subject_from_department",
        step: Step::RenameViaCopy {
            table: &ATTENDANCE_RECORDS,
            legacy: "department",
            canonical: "subject",
        },
    },
    Migration {
        version: 5,
        name: "attendance_add_subject",
        step: Step::AddColumn {
            table: &ATTENDANCE_RECORDS,
            column: "subject",
        },
    },
    Migration {
        version: 6,
        name: "attendance_drop_department",
        step: Step::Rebuild {
            table: &ATTENDANCE_RECORDS,
            merges: &[("subject", "department")],
        },
    },
    Migration {
        version: 7,
        name: "subjects_drop_time_columns",
        step: Step::Rebuild {
            table: &SUBJECTS,
            merges: &[],
        },
    },
];

/// Returns every registered migration in apply order.
pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Foreign key enforcement is switched off for the pass because
/// copy-and-swap drops parent tables, and switched back on afterwards.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let mut report = MigrationReport {
        from_version: current_version,
        to_version: current_version,
        steps: Vec::new(),
    };
    if current_version == latest {
        return Ok(report);
    }

    info!(
        "event=db_migrate module=db status=start from_version={} latest={}",
        current_version, latest
    );
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let result = run_pending(conn, current_version, &mut report);
    let restored = conn.execute_batch("PRAGMA foreign_keys = ON;");
    result?;
    restored?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} applied={}",
        report.from_version,
        report.to_version,
        report.applied_count()
    );
    Ok(report)
}

fn run_pending(
    conn: &mut Connection,
    current_version: u32,
    report: &mut MigrationReport,
) -> DbResult<()> {
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        let outcome = ensure_step(conn, migration)?;
        report.steps.push((migration.version, outcome));
        report.to_version = migration.version;
    }
    Ok(())
}

/// Ensures one migration step inside its own transaction.
///
/// `PRAGMA user_version` is raised to the step version when lower, never
/// lowered, so the step can be re-run against an up-to-date store.
pub fn ensure_step(
    conn: &mut Connection,
    migration: &Migration,
) -> Result<StepOutcome, MigrationError> {
    let started_at = Instant::now();
    match run_step_transaction(conn, migration) {
        Ok(outcome) => {
            info!(
                "event=migration_step module=db status={} version={} name={} duration_ms={}",
                outcome.as_str(),
                migration.version,
                migration.name,
                started_at.elapsed().as_millis()
            );
            Ok(outcome)
        }
        Err(err) => {
            error!(
                "event=migration_step module=db status=error version={} name={} duration_ms={} error={}",
                migration.version,
                migration.name,
                started_at.elapsed().as_millis(),
                err
            );
            Err(MigrationError {
                version: migration.version,
                name: migration.name,
                source: err,
            })
        }
    }
}

fn run_step_transaction(
    conn: &mut Connection,
    migration: &Migration,
) -> rusqlite::Result<StepOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = steps::apply_step(&tx, migration.step)?;
    let version: u32 = tx.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if migration.version > version {
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    Ok(outcome)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
