//! Migrate command handler.

use std::collections::BTreeMap;

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::legacy::IdRange;
use crate::migrators::{BatchReport, BatchRunner};
use crate::models::EntityKind;

use super::{print_report, App, MigrateScope, MigrateTarget};

impl App {
    /// Run the migrate command.
    pub async fn run_migrate(&self, target: MigrateTarget, scope: Option<MigrateScope>) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::connect(config).await?;

        match (target, scope) {
            (MigrateTarget::Everything, None) => migrate_everything(&ctx).await,
            (MigrateTarget::Everything, Some(_)) => {
                Err(eyre!("`migrate everything` does not take a scope"))
            }
            (MigrateTarget::Kind(kind), None) => Err(eyre!(
                "missing scope for `migrate {}`: use single, many or all",
                kind
            )),
            (MigrateTarget::Kind(kind), Some(scope)) => {
                let runner = BatchRunner::for_kind(kind, &ctx);
                match scope {
                    MigrateScope::Single { id } => print_report(&runner.migrate_one(id).await),
                    MigrateScope::Many { start, end } => {
                        let range = IdRange { start, end };
                        print_report(&batch_or_null(kind, runner.migrate_many(range).await))
                    }
                    MigrateScope::All => {
                        print_report(&batch_or_null(kind, runner.migrate_all().await))
                    }
                }
            }
        }
    }
}

/// Migrates every kind in dependency order; a failed kind does not stop the rest.
async fn migrate_everything(ctx: &Context) -> Result<()> {
    let mut reports: BTreeMap<&'static str, Option<BatchReport>> = BTreeMap::new();
    for kind in EntityKind::MIGRATION_ORDER {
        tracing::info!(kind = %kind, "Migrating kind");
        let runner = BatchRunner::for_kind(kind, ctx);
        reports.insert(kind.as_str(), batch_or_null(kind, runner.migrate_all().await));
    }
    print_report(&reports)
}

fn batch_or_null(
    kind: EntityKind,
    result: Result<BatchReport, crate::error::AppError>,
) -> Option<BatchReport> {
    match result {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(kind = %kind, code = e.code(), error = %e, "Batch failed");
            None
        }
    }
}
