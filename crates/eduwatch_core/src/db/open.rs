//! Store bootstrap and connection factory.
//!
//! # Responsibility
//! - Open the SQLite file and apply schema migrations before handing it out.
//! - Produce short-lived, configured connections for repository calls.
//!
//! # Invariants
//! - `Store` values exist only for fully migrated databases.
//! - Connections from `Store::connect` have `foreign_keys=ON`.

use super::migrations::{apply_migrations, MigrationReport};
use super::{DbError, DbResult};
use crate::clock::{Clock, SystemClock};
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to a migrated SQLite store.
///
/// Cheap to clone. Holds no open connection; every repository operation
/// opens its own and drops it before returning.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    clock: Arc<dyn Clock + Send + Sync>,
    migrations: MigrationReport,
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("schema_version", &self.migrations.to_version)
            .finish()
    }
}

impl Store {
    /// Replaces the time source used to stamp `created_at`/`updated_at`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Report of the migration pass that produced this store.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migrations
    }

    /// Opens a fresh connection for one repository operation.
    pub fn connect(&self) -> DbResult<Connection> {
        let conn = Connection::open(&self.path).map_err(DbError::Open)?;
        configure(&conn).map_err(DbError::Open)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(DbError::Open)?;
        Ok(conn)
    }
}

/// Opens the SQLite database file at `path` and applies all pending
/// migrations.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
///
/// # Errors
/// - `DbError::Open` when the file cannot be opened.
/// - `DbError::UnsupportedSchemaVersion` for stores written by a newer binary.
/// - `DbError::Migration` when a step fails; that step is rolled back.
pub fn open_store(path: impl AsRef<Path>) -> DbResult<Store> {
    let path = path.as_ref().to_path_buf();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start");

    match migrate(&path) {
        Ok(migrations) => {
            info!(
                "event=db_open module=db status=ok duration_ms={} schema_version={}",
                started_at.elapsed().as_millis(),
                migrations.to_version
            );
            Ok(Store {
                path,
                clock: Arc::new(SystemClock),
                migrations,
            })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                error_code(&err),
                err
            );
            Err(err)
        }
    }
}

fn migrate(path: &Path) -> DbResult<MigrationReport> {
    let mut conn = Connection::open(path).map_err(DbError::Open)?;
    configure(&conn).map_err(DbError::Open)?;
    apply_migrations(&mut conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Open(_) => "db_open_failed",
        DbError::Sqlite(_) => "db_bootstrap_failed",
        DbError::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        DbError::Migration(_) => "db_migration_failed",
    }
}
