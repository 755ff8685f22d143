//! `SQLite` schema definitions for rollcall.

/// SQL statement to create the members table.
///
/// Photo and signature are stored inline as `data:` URIs.
pub const CREATE_MEMBERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial_number TEXT NOT NULL DEFAULT '',
    photo TEXT,
    name TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    neighborhood TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    department TEXT NOT NULL DEFAULT '',
    cellphone TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    birth_date TEXT,
    marital_status TEXT,
    baptism_date TEXT,
    church TEXT NOT NULL DEFAULT '',
    time_in_church TEXT NOT NULL DEFAULT '',
    member_group TEXT,
    signature TEXT,
    update_date TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Index for name lookups.
pub const CREATE_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_members_name ON members(name)
";

/// Index for group filtering and counts.
pub const CREATE_GROUP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_members_group ON members(member_group)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MEMBERS_TABLE,
    CREATE_NAME_INDEX,
    CREATE_GROUP_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_table_columns() {
        for column in [
            "id INTEGER PRIMARY KEY AUTOINCREMENT",
            "photo TEXT",
            "signature TEXT",
            "member_group TEXT",
            "update_date TEXT NOT NULL",
            "created_at TEXT NOT NULL",
        ] {
            assert!(CREATE_MEMBERS_TABLE.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_schema_statements_in_order() {
        assert_eq!(SCHEMA_STATEMENTS.first(), Some(&CREATE_MEMBERS_TABLE));
        assert!(SCHEMA_STATEMENTS.iter().all(|stmt| !stmt.trim().is_empty()));
    }
}
