//! Check command handler.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

use crate::config::Config;
use crate::db::backends::postgres::PostgresClient;

use super::{print_report, App};

impl App {
    /// Run the check command: ping the legacy and target databases.
    pub async fn run_check(&self) -> Result<()> {
        let config = Config::load()?;

        let mut failures = 0;
        let mut status = serde_json::Map::new();
        for (name, db) in [("legacy", &config.legacy), ("target", &config.target)] {
            let outcome = match PostgresClient::connect(&db.uri, db.pool_size).await {
                Ok(client) => client.ping().await,
                Err(e) => Err(e),
            };
            let value = match outcome {
                Ok(()) => {
                    tracing::info!(database = name, "Reachable");
                    json!("ok")
                }
                Err(e) => {
                    tracing::error!(database = name, code = e.code(), error = %e, "Unreachable");
                    failures += 1;
                    json!(e.to_string())
                }
            };
            status.insert(name.to_string(), value);
        }

        print_report(&status)?;
        if failures > 0 {
            return Err(eyre!("{} database(s) unreachable", failures));
        }
        Ok(())
    }
}
