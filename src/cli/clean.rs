//! Clean command handler.

use color_eyre::Result;
use serde_json::json;

use crate::config::Config;
use crate::context::Context;
use crate::migrators::BatchRunner;
use crate::models::EntityKind;

use super::{print_report, App, CleanScope};

impl App {
    /// Run the clean command.
    pub async fn run_clean(&self, kind: EntityKind, scope: CleanScope) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::connect(config).await?;
        let runner = BatchRunner::for_kind(kind, &ctx);

        match scope {
            CleanScope::Single { id } => {
                let removed = runner.clean_single(id).await?;
                tracing::info!(kind = %kind, legacy_id = id, removed = ?removed, "Cleaned record");
                print_report(&json!({ "kind": kind, "legacyId": id, "removed": removed }))
            }
            CleanScope::All => {
                let report = runner.clean_all().await?;
                tracing::info!(
                    kind = %kind,
                    documents = report.documents,
                    mappings = report.mappings,
                    "Cleaned kind"
                );
                print_report(&report)
            }
        }
    }
}
