//! Schema reconciliation steps.
//!
//! # Responsibility
//! - Inspect the live schema and apply one kind of change when it is missing.
//!
//! # Invariants
//! - Every step is a no-op (`AlreadyCurrent`) when its change is present.
//! - Steps never commit; the caller owns the surrounding transaction.

use super::StepOutcome;
use crate::db::schema::{TableDef, TABLES};
use log::info;
use rusqlite::Connection;

/// One kind of schema change, parameterized by the registry.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Create every registry table and index that does not exist yet.
    CreateTables,
    /// Add one registry column when missing.
    AddColumn {
        table: &'static TableDef,
        column: &'static str,
    },
    /// Add `canonical` and backfill it from `legacy` where still NULL.
    RenameViaCopy {
        table: &'static TableDef,
        legacy: &'static str,
        canonical: &'static str,
    },
    /// Copy-and-swap the table into its registry shape, dropping columns the
    /// registry does not declare. `merges` lists `(canonical, legacy)` pairs
    /// folded together canonical-first.
    Rebuild {
        table: &'static TableDef,
        merges: &'static [(&'static str, &'static str)],
    },
}

pub(super) fn apply_step(conn: &Connection, step: Step) -> rusqlite::Result<StepOutcome> {
    match step {
        Step::CreateTables => create_tables(conn),
        Step::AddColumn { table, column } => add_column(conn, table, column),
        Step::RenameViaCopy {
            table,
            legacy,
            canonical,
        } => rename_via_copy(conn, table, legacy, canonical),
        Step::Rebuild { table, merges } => rebuild(conn, table, merges),
    }
}

fn create_tables(conn: &Connection) -> rusqlite::Result<StepOutcome> {
    let mut outcome = StepOutcome::AlreadyCurrent;
    for table in TABLES {
        if !table_exists(conn, table.name)? {
            conn.execute_batch(&table.create_sql(table.name, true))?;
            info!(
                "event=migration_create_table module=db status=applied table={}",
                table.name
            );
            outcome = StepOutcome::Applied;
        }
        if create_indexes(conn, table)? {
            outcome = StepOutcome::Applied;
        }
    }
    Ok(outcome)
}

fn add_column(
    conn: &Connection,
    table: &TableDef,
    column: &'static str,
) -> rusqlite::Result<StepOutcome> {
    let definition = table
        .column(column)
        .ok_or_else(|| rusqlite::Error::InvalidColumnName(column.to_string()))?;

    if live_columns(conn, table.name)?.iter().any(|name| name == column) {
        return Ok(StepOutcome::AlreadyCurrent);
    }

    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {};",
        table.name,
        definition.add_column_sql()
    ))?;
    Ok(StepOutcome::Applied)
}

fn rename_via_copy(
    conn: &Connection,
    table: &TableDef,
    legacy: &'static str,
    canonical: &'static str,
) -> rusqlite::Result<StepOutcome> {
    let definition = table
        .column(canonical)
        .ok_or_else(|| rusqlite::Error::InvalidColumnName(canonical.to_string()))?;

    let live = live_columns(conn, table.name)?;
    let has_legacy = live.iter().any(|name| name == legacy);
    let has_canonical = live.iter().any(|name| name == canonical);
    if !has_legacy || has_canonical {
        return Ok(StepOutcome::AlreadyCurrent);
    }

    // Added nullable so unset rows stay distinguishable from populated ones.
    conn.execute_batch(&format!(
        "ALTER TABLE {table} ADD COLUMN {canonical} {sql_type};
         UPDATE {table} SET {canonical} = {legacy} WHERE {canonical} IS NULL;",
        table = table.name,
        sql_type = definition.sql_type,
    ))?;
    Ok(StepOutcome::Applied)
}

fn rebuild(
    conn: &Connection,
    table: &TableDef,
    merges: &[(&'static str, &'static str)],
) -> rusqlite::Result<StepOutcome> {
    let live = live_columns(conn, table.name)?;
    let canonical = table.column_names();
    let extras: Vec<&str> = live
        .iter()
        .map(String::as_str)
        .filter(|name| !canonical.iter().any(|column| column == name))
        .collect();
    if extras.is_empty() {
        return Ok(StepOutcome::AlreadyCurrent);
    }

    let mut targets = Vec::new();
    let mut sources = Vec::new();
    for column in table.columns {
        let mut candidates: Vec<&str> = Vec::new();
        if live.iter().any(|name| name == column.name) {
            candidates.push(column.name);
        }
        if let Some(legacy) = merges
            .iter()
            .find(|(target, _)| *target == column.name)
            .map(|(_, legacy)| *legacy)
            .filter(|legacy| live.iter().any(|name| name == legacy))
        {
            candidates.push(legacy);
        }
        if candidates.is_empty() {
            // Not present in the live table; the column default fills it.
            continue;
        }
        if column.not_null {
            if let Some(literal) = column.default.and_then(|default| default.constant()) {
                candidates.push(literal);
            }
        }

        let source = if candidates.len() == 1 {
            candidates[0].to_string()
        } else {
            format!("COALESCE({})", candidates.join(", "))
        };
        targets.push(column.name);
        sources.push(source);
    }

    let replacement = format!("{}__rebuild", table.name);
    conn.execute_batch(&table.create_sql(&replacement, false))?;
    conn.execute_batch(&format!(
        "INSERT INTO {replacement} ({targets})
         SELECT {sources}
         FROM {table};
         DROP TABLE {table};
         ALTER TABLE {replacement} RENAME TO {table};",
        targets = targets.join(", "),
        sources = sources.join(", "),
        table = table.name,
    ))?;
    create_indexes(conn, table)?;

    info!(
        "event=migration_rebuild module=db status=applied table={} dropped_columns={}",
        table.name,
        extras.join(",")
    );
    Ok(StepOutcome::Applied)
}

/// Creates declared indexes whose columns exist; returns whether any was new.
fn create_indexes(conn: &Connection, table: &TableDef) -> rusqlite::Result<bool> {
    let live = live_columns(conn, table.name)?;
    let mut created = false;
    for index in table.indexes {
        if !index
            .columns
            .iter()
            .all(|column| live.iter().any(|name| name == column))
        {
            continue;
        }
        if !index_exists(conn, index.name)? {
            conn.execute_batch(&index.create_sql(table.name))?;
            created = true;
        }
    }
    Ok(created)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn index_exists(conn: &Connection, index: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'index' AND name = ?1
        );",
        [index],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns live column names of `table` in physical order.
///
/// Empty when the table does not exist.
pub fn live_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}
