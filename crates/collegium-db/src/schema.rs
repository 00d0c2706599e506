//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings in record keys. Enums are stored as
//! strings with ASSERT constraints for validation.
//!
//! The `member` reference on `transition_request` is a union type
//! `record<member> | string`. New writes always produce the record
//! link; the string arm keeps the legacy corrupt form representable so
//! that reconciliation can find and repair it.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Members
-- =======================================================================
DEFINE TABLE member SCHEMAFULL;
DEFINE FIELD full_name ON TABLE member TYPE string;
DEFINE FIELD email ON TABLE member TYPE string;
DEFINE FIELD role ON TABLE member TYPE string \
    ASSERT $value IN ['Student', 'Doctor', 'GlobalNetwork'];
DEFINE FIELD region ON TABLE member TYPE string;
DEFINE FIELD specialty ON TABLE member TYPE option<string>;
DEFINE FIELD license_number ON TABLE member TYPE option<string>;
DEFINE FIELD admission_year ON TABLE member TYPE option<int>;
DEFINE FIELD year_of_study ON TABLE member TYPE option<int>;
DEFINE FIELD created_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_email ON TABLE member COLUMNS email UNIQUE;

-- =======================================================================
-- Transition requests
-- =======================================================================
DEFINE TABLE transition_request SCHEMAFULL;
DEFINE FIELD member ON TABLE transition_request \
    TYPE record<member> | string;
DEFINE FIELD region ON TABLE transition_request TYPE string;
DEFINE FIELD specialty ON TABLE transition_request TYPE string;
DEFINE FIELD license_number ON TABLE transition_request TYPE string;
DEFINE FIELD status ON TABLE transition_request TYPE string \
    ASSERT $value IN ['Pending', 'Completed', 'Failed'];
DEFINE FIELD created_at ON TABLE transition_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_request_status ON TABLE transition_request \
    COLUMNS status;
DEFINE INDEX idx_request_member ON TABLE transition_request \
    COLUMNS member;
";

/// Apply any migrations newer than the recorded schema version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
