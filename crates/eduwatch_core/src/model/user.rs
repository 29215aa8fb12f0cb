//! User identity and employment metadata.
//!
//! # Invariants
//! - `username` is unique across the store.
//! - `password` holds a digest, never clear text, and is never serialized.
//! - A NULL or blank employment status reads as `"Full Time"`.

use super::{non_blank, require, ValidationError};
use serde::Serialize;

pub type UserId = i64;

pub const DEFAULT_USER_STATUS: &str = "Full Time";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    /// Employment category, e.g. "Full Time" or "Part Time".
    pub status: String,
    pub is_admin: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Registration input. `password` is clear text and hashed before storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
    pub is_admin: bool,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("full_name", &self.full_name)
    }

    pub fn resolved_status(&self) -> &str {
        non_blank(self.status.as_deref()).unwrap_or(DEFAULT_USER_STATUS)
    }
}

/// Self-service profile edit.
///
/// Contact fields are written as given; `status` keeps the stored value when
/// `None` or blank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub new_username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("new_username", &self.new_username)?;
        require("full_name", &self.full_name)
    }
}

/// Administrator edit of another user's record. Username is not editable here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminUserUpdate {
    pub full_name: String,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
}

impl AdminUserUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("full_name", &self.full_name)
    }
}

/// Maps a stored status column to its effective value.
pub(crate) fn effective_status(stored: Option<String>) -> String {
    match stored {
        Some(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_USER_STATUS.to_string(),
    }
}
