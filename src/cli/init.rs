//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::db::backends::postgres::PostgresClient;
use crate::schema::{legacy, run_register, target, Register, SchemaResult};

use super::{print_report, App};

impl App {
    /// Run the init command to apply pending schema steps.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;

        tracing::info!("Connecting to target database");
        let target_client = PostgresClient::connect(&config.target.uri, config.target.pool_size).await?;
        let target_result = apply(&target_client, &target::create_register()).await?;

        tracing::info!("Connecting to legacy database");
        let legacy_client = PostgresClient::connect(&config.legacy.uri, config.legacy.pool_size).await?;
        let legacy_result = apply(&legacy_client, &legacy::create_register()).await?;

        print_report(&[target_result, legacy_result])
    }
}

async fn apply(client: &PostgresClient, register: &Register) -> Result<SchemaResult> {
    let result = run_register(client, register).await?;

    if result.applied_steps.is_empty() {
        tracing::info!(
            database = result.database,
            version = result.current_version,
            "Schema up to date"
        );
    } else {
        tracing::info!(
            database = result.database,
            from = result.previous_version,
            to = result.current_version,
            applied = ?result.applied_steps,
            "Applied schema steps"
        );
    }
    Ok(result)
}
