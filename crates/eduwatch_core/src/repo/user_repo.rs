//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Registration, credential checks, profile and admin edits.
//! - Keep attendance `full_name` snapshots in step with user renames.
//!
//! # Invariants
//! - Passwords are hashed before any SQL touches them.
//! - Unknown user and wrong password produce the same error and both hash.
//! - A full-name change and its attendance rewrite commit together.

use super::{is_unique_violation, RepoError, RepoResult};
use crate::auth::PasswordHasher;
use crate::db::Store;
use crate::model::non_blank;
use crate::model::user::{
    effective_status, AdminUserUpdate, NewUser, ProfileUpdate, User, UserId,
};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    id,
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
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, new_user: &NewUser) -> RepoResult<UserId>;
    fn authenticate(&self, username: &str, password: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// All users, newest first.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn update_profile(&self, current_username: &str, update: &ProfileUpdate) -> RepoResult<()>;
    fn admin_update_user(&self, id: UserId, update: &AdminUserUpdate) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'a> {
    store: &'a Store,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> SqliteUserRepository<'a> {
    pub fn new(store: &'a Store, hasher: &'a dyn PasswordHasher) -> Self {
        Self { store, hasher }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new_user: &NewUser) -> RepoResult<UserId> {
        new_user.validate()?;
        let username = new_user.username.trim();
        let digest = self.hasher.hash(&new_user.password);
        let now = self.store.clock().now();

        let conn = self.store.connect()?;
        let inserted = conn.execute(
            "INSERT INTO users (
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
            params![
                username,
                digest,
                new_user.full_name.trim(),
                new_user.email.as_deref(),
                new_user.contact_number.as_deref(),
                new_user.address.as_deref(),
                new_user.resolved_status(),
                new_user.is_admin,
                now,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateUsername(username.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        let id = conn.last_insert_rowid();
        info!("event=user_create module=repo status=ok user_id={id}");
        Ok(id)
    }

    fn authenticate(&self, username: &str, password: &str) -> RepoResult<User> {
        let conn = self.store.connect()?;
        match load_user_by_username(&conn, username.trim())? {
            Some(user) if self.hasher.verify(password, &user.password) => Ok(user),
            Some(_) => {
                warn!("event=user_authenticate module=repo status=denied");
                Err(RepoError::InvalidCredentials)
            }
            None => {
                // Same work as the mismatch path.
                let _ = self.hasher.verify(password, "");
                warn!("event=user_authenticate module=repo status=denied");
                Err(RepoError::InvalidCredentials)
            }
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let conn = self.store.connect()?;
        load_user_by_id(&conn, id)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let conn = self.store.connect()?;
        load_user_by_username(&conn, username.trim())
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn update_profile(&self, current_username: &str, update: &ProfileUpdate) -> RepoResult<()> {
        update.validate()?;
        let new_username = update.new_username.trim();
        let full_name = update.full_name.trim();
        let now = self.store.clock().now();

        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_user_by_username(&tx, current_username.trim())?
            .ok_or_else(|| RepoError::UserNotFound(current_username.to_string()))?;

        if new_username != current.username && username_taken(&tx, new_username, current.id)? {
            return Err(RepoError::DuplicateUsername(new_username.to_string()));
        }

        let status = non_blank(update.status.as_deref()).unwrap_or(current.status.as_str());
        let updated = tx.execute(
            "UPDATE users
             SET
                username = ?1,
                full_name = ?2,
                email = ?3,
                contact_number = ?4,
                address = ?5,
                status = ?6,
                updated_at = ?7
             WHERE id = ?8;",
            params![
                new_username,
                full_name,
                update.email.as_deref(),
                update.contact_number.as_deref(),
                update.address.as_deref(),
                status,
                now,
                current.id,
            ],
        );
        match updated {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateUsername(new_username.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        let synced = sync_attendance_full_name(&tx, current.id, &current.full_name, full_name)?;
        tx.commit()?;

        info!(
            "event=user_update_profile module=repo status=ok user_id={} renamed_username={} synced_records={}",
            current.id,
            new_username != current.username,
            synced
        );
        Ok(())
    }

    fn admin_update_user(&self, id: UserId, update: &AdminUserUpdate) -> RepoResult<()> {
        update.validate()?;
        let full_name = update.full_name.trim();
        let now = self.store.clock().now();

        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current =
            load_user_by_id(&tx, id)?.ok_or_else(|| RepoError::UserNotFound(id.to_string()))?;

        let status = non_blank(update.status.as_deref()).unwrap_or(current.status.as_str());
        tx.execute(
            "UPDATE users
             SET
                full_name = ?1,
                email = ?2,
                contact_number = ?3,
                address = ?4,
                status = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                full_name,
                update.email.as_deref(),
                update.contact_number.as_deref(),
                update.address.as_deref(),
                status,
                now,
                id,
            ],
        )?;

        let synced = sync_attendance_full_name(&tx, id, &current.full_name, full_name)?;
        tx.commit()?;

        info!(
            "event=user_admin_update module=repo status=ok user_id={} synced_records={}",
            id, synced
        );
        Ok(())
    }
}

/// Rewrites attendance snapshots after a full-name change.
///
/// Returns the number of rewritten records; zero when the name is unchanged.
fn sync_attendance_full_name(
    conn: &Connection,
    user_id: UserId,
    old_full_name: &str,
    new_full_name: &str,
) -> RepoResult<usize> {
    if old_full_name == new_full_name {
        return Ok(0);
    }
    let changed = conn.execute(
        "UPDATE attendance_records SET full_name = ?1 WHERE user_id = ?2;",
        params![new_full_name, user_id],
    )?;
    Ok(changed)
}

fn username_taken(conn: &Connection, username: &str, except_id: UserId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1 AND id != ?2;",
            params![username, except_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn load_user_by_id(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn load_user_by_username(conn: &Connection, username: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
    let mut rows = stmt.query([username])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let is_admin = match row.get::<_, Option<i64>>("is_admin")? {
        None | Some(0) => false,
        Some(1) => true,
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_admin value `{other}` in users.is_admin"
            )));
        }
    };

    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        contact_number: row.get("contact_number")?,
        address: row.get("address")?,
        status: effective_status(row.get("status")?),
        is_admin,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
