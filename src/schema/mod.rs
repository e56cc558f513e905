//! Versioned schema steps for the target store and the legacy source.
//!
//! Steps are:
//! - **Idempotent**: `IF NOT EXISTS` everywhere, so retries are safe
//! - **Forward-only**: no down steps, write a compensating step instead
//! - **Version-tracked**: per-database version in `docshift_schema_version`
//!
//! `docshift init` runs both registers.

mod traits;

pub mod legacy;
pub mod target;

pub use traits::{Register, SchemaStep};

use crate::db::{QueryExt, SqlClient, SqlExecutor, Transaction as _};
use crate::error::AppError;

/// Result of running one register.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaResult {
    pub database: &'static str,
    pub previous_version: u32,
    pub current_version: u32,
    pub applied_steps: Vec<String>,
}

const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS docshift_schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_steps TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);

INSERT INTO docshift_schema_version (id, version)
VALUES (1, 0)
ON CONFLICT (id) DO NOTHING;
"#;

/// Apply every pending step of `register` on `client`.
pub async fn run_register<C>(client: &C, register: &Register) -> Result<SchemaResult, AppError>
where
    C: SqlClient,
{
    ensure_schema_version_table(client).await?;

    let previous_version = get_schema_version(client).await?;
    let applied = register.run_pending(client, previous_version).await?;

    let mut current_version = previous_version;
    for (version, step_id) in &applied {
        update_schema_version(client, *version, step_id).await?;
        current_version = *version;
    }

    Ok(SchemaResult {
        database: register.name(),
        previous_version,
        current_version,
        applied_steps: applied.into_iter().map(|(_, id)| id).collect(),
    })
}

async fn ensure_schema_version_table<C: SqlClient>(client: &C) -> Result<(), AppError> {
    let txn = client.begin().await?;
    txn.execute_sql(CREATE_SCHEMA_VERSION_TABLE).await?;
    txn.commit().await?;
    Ok(())
}

/// Returns 0 on a fresh database.
async fn get_schema_version<C: SqlClient>(client: &C) -> Result<u32, AppError> {
    let row = client
        .query("SELECT version FROM docshift_schema_version WHERE id = 1")
        .fetch_one()
        .await?;

    Ok(row.and_then(|r| r.int("version")).unwrap_or(0) as u32)
}

async fn update_schema_version<C: SqlClient>(
    client: &C,
    version: u32,
    step_id: &str,
) -> Result<(), AppError> {
    client
        .query(
            "UPDATE docshift_schema_version
             SET version = $1,
                 applied_steps = array_append(applied_steps, $2),
                 last_applied_at = NOW()
             WHERE id = 1",
        )
        .bind(version)
        .bind(step_id)
        .run()
        .await?;
    Ok(())
}
