//! Process startup sequence: migrate, then seed.

use crate::db::migrations::MigrationReport;
use crate::db::{open_store, Store};
use crate::repo::RepoResult;
use crate::seed::{seed_defaults, SeedReport};
use log::info;
use std::path::Path;

#[derive(Debug)]
pub struct Bootstrapped {
    pub store: Store,
    pub migrations: MigrationReport,
    pub seed: SeedReport,
}

/// Opens and migrates the store at `path`, then seeds default rows.
///
/// # Errors
/// Any migration failure is returned as `RepoError::Store` and must be
/// treated as fatal by the caller.
pub fn bootstrap(path: impl AsRef<Path>) -> RepoResult<Bootstrapped> {
    let store = open_store(path)?;
    let migrations = store.migration_report().clone();
    let seed = seed_defaults(&store)?;

    info!(
        "event=startup module=core status=ok schema_version={} migrations_applied={} users_seeded={} subjects_seeded={}",
        migrations.to_version,
        migrations.applied_count(),
        seed.users_inserted,
        seed.subjects_inserted
    );
    Ok(Bootstrapped {
        store,
        migrations,
        seed,
    })
}
