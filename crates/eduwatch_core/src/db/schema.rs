//! Canonical schema registry.
//!
//! # Responsibility
//! - Declare the target shape of every table the store owns.
//! - Render DDL fragments the migration engine reconciles the live store to.
//!
//! # Invariants
//! - `TABLES` is ordered so referenced tables come before referencing ones.
//! - Column order inside a `TableDef` is the physical order used by
//!   copy-and-swap rebuilds.

/// Default value clause for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// Raw SQL literal, e.g. `'Full Time'` or `0`.
    Literal(&'static str),
    /// `CURRENT_TIMESTAMP`. Not allowed by SQLite in `ADD COLUMN`.
    CurrentTimestamp,
}

impl ColumnDefault {
    fn sql(self) -> &'static str {
        match self {
            Self::Literal(value) => value,
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }

    /// Returns the literal when this default may appear in `ADD COLUMN`.
    pub fn constant(self) -> Option<&'static str> {
        match self {
            Self::Literal(value) => Some(value),
            Self::CurrentTimestamp => None,
        }
    }
}

/// Foreign key target for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    /// `ON DELETE` action, e.g. `CASCADE` or `SET NULL`.
    pub on_delete: Option<&'static str>,
}

/// One canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    const fn id() -> Self {
        let mut column = Self::new("id", "INTEGER");
        column.primary_key = true;
        column
    }

    const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    const fn references(
        mut self,
        table: &'static str,
        on_delete: Option<&'static str>,
    ) -> Self {
        self.references = Some(ForeignKey {
            table,
            column: "id",
            on_delete,
        });
        self
    }

    const fn created_at(name: &'static str) -> Self {
        Self::new(name, "TIMESTAMP").default(ColumnDefault::CurrentTimestamp)
    }

    /// Renders the full column definition used by `CREATE TABLE`.
    pub fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default.sql());
        }
        if let Some(fk) = self.references {
            sql.push_str(&format!(" REFERENCES {} ({})", fk.table, fk.column));
            if let Some(action) = fk.on_delete {
                sql.push_str(" ON DELETE ");
                sql.push_str(action);
            }
        }
        sql
    }

    /// Renders the clause accepted by `ALTER TABLE ... ADD COLUMN`.
    ///
    /// SQLite rejects non-constant defaults and `NOT NULL` without a default
    /// there, so both are relaxed; a later rebuild restores the full shape.
    pub fn add_column_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        let constant_default = self.default.and_then(ColumnDefault::constant);
        if self.not_null && constant_default.is_some() {
            sql.push_str(" NOT NULL");
        }
        if let Some(value) = constant_default {
            sql.push_str(" DEFAULT ");
            sql.push_str(value);
        }
        if let Some(fk) = self.references {
            sql.push_str(&format!(" REFERENCES {} ({})", fk.table, fk.column));
            if let Some(action) = fk.on_delete {
                sql.push_str(" ON DELETE ");
                sql.push_str(action);
            }
        }
        sql
    }
}

/// Secondary index declared for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl IndexDef {
    pub fn create_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
            self.name,
            table_name,
            self.columns.join(", ")
        )
    }
}

/// One canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Composite `UNIQUE (...)` constraints.
    pub unique_together: &'static [&'static [&'static str]],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    /// Renders `CREATE TABLE` for this table under `table_name`.
    ///
    /// Rebuilds render the canonical shape under a temporary name, so the
    /// name is a parameter instead of always `self.name`.
    pub fn create_sql(&self, table_name: &str, if_not_exists: bool) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("    {}", column.definition_sql()))
            .collect();
        for group in self.unique_together {
            parts.push(format!("    UNIQUE ({})", group.join(", ")));
        }
        format!(
            "CREATE TABLE {}{} (\n{}\n);",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            table_name,
            parts.join(",\n")
        )
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("username", "TEXT").not_null().unique(),
        ColumnDef::new("password", "TEXT").not_null(),
        ColumnDef::new("full_name", "TEXT").not_null(),
        ColumnDef::new("email", "TEXT"),
        ColumnDef::new("contact_number", "TEXT"),
        ColumnDef::new("address", "TEXT"),
        ColumnDef::new("status", "TEXT").default(ColumnDefault::Literal("'Full Time'")),
        ColumnDef::new("is_admin", "BOOLEAN").default(ColumnDefault::Literal("0")),
        ColumnDef::created_at("created_at"),
        ColumnDef::created_at("updated_at"),
    ],
    unique_together: &[],
    indexes: &[],
};

pub const SUBJECTS: TableDef = TableDef {
    name: "subjects",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("name", "TEXT").not_null().unique(),
        ColumnDef::new("description", "TEXT"),
        ColumnDef::created_at("created_at"),
    ],
    unique_together: &[],
    indexes: &[],
};

pub const ATTENDANCE_RECORDS: TableDef = TableDef {
    name: "attendance_records",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "INTEGER").references("users", Some("SET NULL")),
        ColumnDef::new("full_name", "TEXT").not_null(),
        ColumnDef::new("subject", "TEXT")
            .not_null()
            .default(ColumnDefault::Literal("'General'")),
        ColumnDef::new("status", "TEXT").not_null(),
        ColumnDef::new("timestamp", "TIMESTAMP").not_null(),
        ColumnDef::created_at("created_at"),
    ],
    unique_together: &[],
    indexes: &[IndexDef {
        name: "idx_attendance_records_user_id",
        columns: &["user_id"],
    }],
};

pub const SCHEDULES: TableDef = TableDef {
    name: "schedules",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "INTEGER")
            .not_null()
            .references("users", Some("CASCADE")),
        ColumnDef::new("subject_id", "INTEGER")
            .not_null()
            .references("subjects", Some("CASCADE")),
        ColumnDef::new("day_of_week", "TEXT").not_null(),
        ColumnDef::new("start_time", "TEXT").not_null(),
        ColumnDef::new("end_time", "TEXT").not_null(),
        ColumnDef::created_at("created_at"),
    ],
    unique_together: &[&["user_id", "subject_id", "day_of_week", "start_time"]],
    indexes: &[IndexDef {
        name: "idx_schedules_subject_id",
        columns: &["subject_id"],
    }],
};

pub const USER_SUBJECTS: TableDef = TableDef {
    name: "user_subjects",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", "INTEGER").references("users", None),
        ColumnDef::new("subject_id", "INTEGER").references("subjects", None),
        ColumnDef::created_at("created_at"),
    ],
    unique_together: &[&["user_id", "subject_id"]],
    indexes: &[IndexDef {
        name: "idx_user_subjects_subject_id",
        columns: &["subject_id"],
    }],
};

/// All canonical tables, referenced tables first.
pub const TABLES: &[TableDef] = &[USERS, SUBJECTS, ATTENDANCE_RECORDS, SCHEDULES, USER_SUBJECTS];

/// Looks up a canonical table by name.
pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|table| table.name == name)
}

#[cfg(test)]
mod tests {
    use super::{table, ATTENDANCE_RECORDS, SCHEDULES, TABLES, USERS};

    #[test]
    fn every_table_has_integer_primary_key_first() {
        for table in TABLES {
            let first = table.columns.first().expect("table has columns");
            assert_eq!(first.name, "id");
            assert!(first.primary_key);
        }
    }

    #[test]
    fn create_sql_renders_composite_unique_constraint() {
        let sql = SCHEDULES.create_sql("schedules", true);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS schedules ("));
        assert!(sql.contains("UNIQUE (user_id, subject_id, day_of_week, start_time)"));
        assert!(sql.contains("REFERENCES subjects (id) ON DELETE CASCADE"));
    }

    #[test]
    fn add_column_sql_drops_non_constant_defaults() {
        let updated_at = USERS.column("updated_at").expect("column declared");
        assert_eq!(updated_at.add_column_sql(), "updated_at TIMESTAMP");

        let status = USERS.column("status").expect("column declared");
        assert_eq!(status.add_column_sql(), "status TEXT DEFAULT 'Full Time'");

        let subject = ATTENDANCE_RECORDS.column("subject").expect("column declared");
        assert_eq!(
            subject.add_column_sql(),
            "subject TEXT NOT NULL DEFAULT 'General'"
        );
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(table("users").map(|t| t.name), Some("users"));
        assert!(table("departments").is_none());
    }
}
