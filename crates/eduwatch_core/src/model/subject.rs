//! Teachable subjects.

use serde::Serialize;

pub type SubjectId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Unique across the catalog.
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
}
