//! Store bootstrap entry point.
//!
//! # Responsibility
//! - Load `.env`, start logging, migrate and seed the configured store.
//! - Exit non-zero when the store cannot be brought to the current schema.

use eduwatch_core::{bootstrap, init_logging, CoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = CoreConfig::from_env();

    if let Err(err) = init_logging(&config.log_level, config.log_target()) {
        eprintln!("eduwatch: logging disabled: {err}");
    }

    match bootstrap(&config.db_path) {
        Ok(ready) => {
            println!("eduwatch_core version={}", eduwatch_core::core_version());
            println!("store={}", ready.store.path().display());
            println!(
                "schema_version={} (from {}, {} step(s) applied)",
                ready.migrations.to_version,
                ready.migrations.from_version,
                ready.migrations.applied_count()
            );
            println!(
                "seeded users={} subjects={}",
                ready.seed.users_inserted, ready.seed.subjects_inserted
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=startup module=core status=error error_code=bootstrap_failed");
            eprintln!("eduwatch: startup failed: {err}");
            if let Some(source) = std::error::Error::source(&err) {
                eprintln!("  caused by: {source}");
            }
            ExitCode::FAILURE
        }
    }
}
