//! Default accounts and subject catalog.
//!
//! # Invariants
//! - Seeding is idempotent: rows are keyed on their unique column and never
//!   overwritten.
//! - Account passwords are stored as SHA-256 hex digests.

use crate::db::Store;
use crate::repo::RepoResult;
use log::info;
use rusqlite::{params, TransactionBehavior};

struct SeedUser {
    username: &'static str,
    password_digest: &'static str,
    full_name: &'static str,
    email: &'static str,
    contact_number: &'static str,
    address: &'static str,
    status: &'static str,
    is_admin: bool,
}

const DEFAULT_USERS: &[SeedUser] = &[
    SeedUser {
        username: "admin",
        password_digest: "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9",
        full_name: "System Administrator",
        email: "admin@eduwatch.com",
        contact_number: "+1234567890",
        address: "Admin Office",
        status: "Full Time",
        is_admin: true,
    },
    SeedUser {
        username: "outis",
        password_digest: "96cae35ce8a9b0244178bf28e4966c2ce1b8385723a96a6b838858cdd6ca0a1e",
        full_name: "Nathaniel Saclolo",
        email: "nathaniel@eduwatch.com",
        contact_number: "+0987654321",
        address: "Circulo Verde, Quezon",
        status: "Full Time",
        is_admin: false,
    },
];

const DEFAULT_SUBJECTS: &[(&str, &str)] = &[
    ("Mathematics", "Mathematics and Algebra"),
    ("English", "English Language and Literature"),
    ("Science", "General Science"),
    ("History", "World and Local History"),
    ("Computer Science", "Programming and Information Technology"),
    ("Physics", "Physics and Applied Sciences"),
    ("Chemistry", "Chemistry and Laboratory Sciences"),
    ("Biology", "Biology and Life Sciences"),
    ("Geography", "Physical and Human Geography"),
    ("Literature", "Literature and Reading"),
    ("Art", "Visual Arts and Creative Expression"),
    ("Music", "Music Theory and Performance"),
    ("Physical Education", "Sports and Physical Fitness"),
    ("Economics", "Economics and Business Studies"),
    ("Psychology", "Psychology and Human Behavior"),
];

/// Rows actually inserted by one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_inserted: usize,
    pub subjects_inserted: usize,
}

/// Number of subjects in the default catalog.
pub fn default_subject_count() -> usize {
    DEFAULT_SUBJECTS.len()
}

/// Inserts the default accounts and subjects that are not present yet.
pub fn seed_defaults(store: &Store) -> RepoResult<SeedReport> {
    let now = store.clock().now();
    let mut conn = store.connect()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = SeedReport::default();

    {
        let mut insert_user = tx.prepare(
            "INSERT OR IGNORE INTO users (
                username,
                password,
                full_name,
                email,
                contact_number,
                address,
                status,
                is_admin,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9);",
        )?;
        for user in DEFAULT_USERS {
            report.users_inserted += insert_user.execute(params![
                user.username,
                user.password_digest,
                user.full_name,
                user.email,
                user.contact_number,
                user.address,
                user.status,
                user.is_admin,
                now,
            ])?;
        }

        let mut insert_subject = tx.prepare(
            "INSERT OR IGNORE INTO subjects (name, description, created_at)
             VALUES (?1, ?2, ?3);",
        )?;
        for (name, description) in DEFAULT_SUBJECTS {
            report.subjects_inserted += insert_subject.execute(params![name, description, now])?;
        }
    }
    tx.commit()?;

    info!(
        "event=seed_defaults module=seed status=ok users_inserted={} subjects_inserted={}",
        report.users_inserted, report.subjects_inserted
    );
    Ok(report)
}
