//! Per-kind migrators and the sequential batch runner.
//!
//! Every kind runs the same cycle for one legacy record:
//!
//! ```text
//! START → CHECK_PAST_MIGRATION → [CLEAN_PAST] → FETCH_DEPENDENCIES
//!       → TRANSDUCE → PERSIST → REMAP → DONE
//! ```
//!
//! Any failure moves the record to FAILED. The batch runner logs it and
//! continues with the next record.

mod article;
mod company;
mod issue;
mod live;
mod past;
pub mod tables;
mod tag;
mod user;

pub use article::ArticleMigrator;
pub use company::CompanyMigrator;
pub use issue::IssueMigrator;
pub use live::LiveMigrator;
pub use tag::TagMigrator;
pub use user::UserMigrator;

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::context::{AppLegacy, Context};
use crate::error::AppError;
use crate::legacy::IdRange;
use crate::media::MediaCleanup;
use crate::models::EntityKind;
use crate::FromRef;

// ============================================================================
// Stages and reports
// ============================================================================

/// Where a single-record migration currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    Start,
    CheckPastMigration,
    CleanPast,
    FetchDependencies,
    Transduce,
    Persist,
    Remap,
    Done,
    Failed,
}

impl MigrationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStage::Start => "start",
            MigrationStage::CheckPastMigration => "check-past-migration",
            MigrationStage::CleanPast => "clean-past",
            MigrationStage::FetchDependencies => "fetch-dependencies",
            MigrationStage::Transduce => "transduce",
            MigrationStage::Persist => "persist",
            MigrationStage::Remap => "remap",
            MigrationStage::Done => "done",
            MigrationStage::Failed => "failed",
        }
    }

    /// Logs entry into this stage under the current record span.
    pub fn enter(self) -> Self {
        tracing::info!(stage = %self, "Stage");
        self
    }
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one successful record migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub kind: EntityKind,
    pub legacy_id: i64,
    pub new_id: String,
    /// Target ID removed by CLEAN_PAST, if the record was migrated before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,
    pub media_ids: Vec<String>,
}

/// Outcome of cleaning every migrated record of one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub kind: EntityKind,
    pub documents: u64,
    pub mappings: u64,
    pub media: MediaCleanup,
}

// ============================================================================
// Migrator trait
// ============================================================================

/// Migration of one entity kind.
#[async_trait]
pub trait EntityMigrator: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Runs the full cycle for one legacy record.
    async fn migrate_single(&self, legacy_id: i64) -> Result<MigrationReport, AppError>;

    /// Removes the target document, its media and side effects, then clears
    /// the mapping. Returns the removed target ID.
    async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError>;

    /// Removes every migrated document of this kind and resets all mappings.
    async fn clean_all(&self) -> Result<CleanReport, AppError>;
}

/// Builds the migrator for `kind` from the application context.
pub fn migrator_for(kind: EntityKind, ctx: &Context) -> Box<dyn EntityMigrator> {
    match kind {
        EntityKind::User => Box::new(UserMigrator::from_ref(ctx)),
        EntityKind::Article => Box::new(ArticleMigrator::from_ref(ctx)),
        EntityKind::Company => Box::new(CompanyMigrator::from_ref(ctx)),
        EntityKind::Issue => Box::new(IssueMigrator::from_ref(ctx)),
        EntityKind::Tag => Box::new(TagMigrator::from_context(ctx, false)),
        EntityKind::AdminTag => Box::new(TagMigrator::from_context(ctx, true)),
        EntityKind::LiveRecord => Box::new(LiveMigrator::from_ref(ctx)),
    }
}

// ============================================================================
// Batch runner
// ============================================================================

/// One report slot per listed record; `None` marks a failed record.
pub type BatchReport = Vec<Option<MigrationReport>>;

/// Runs a migrator over many records, strictly one after another.
pub struct BatchRunner {
    migrator: Box<dyn EntityMigrator>,
    legacy: AppLegacy,
}

impl BatchRunner {
    pub fn new(migrator: Box<dyn EntityMigrator>, legacy: AppLegacy) -> Self {
        Self { migrator, legacy }
    }

    pub fn for_kind(kind: EntityKind, ctx: &Context) -> Self {
        Self::new(migrator_for(kind, ctx), ctx.legacy.clone())
    }

    pub fn kind(&self) -> EntityKind {
        self.migrator.kind()
    }

    /// Migrates one record. Failures are logged and yield `None`.
    pub async fn migrate_one(&self, legacy_id: i64) -> Option<MigrationReport> {
        let kind = self.kind();
        let span = tracing::info_span!("migrate", kind = %kind, legacy_id);

        async {
            match self.migrator.migrate_single(legacy_id).await {
                Ok(report) => {
                    MigrationStage::Done.enter();
                    Some(report)
                }
                Err(e) => {
                    tracing::error!(
                        stage = %MigrationStage::Failed,
                        code = e.code(),
                        error = %e,
                        "Record skipped"
                    );
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Migrates every listed record in `range`.
    ///
    /// Only a failure to list IDs fails the batch.
    pub async fn migrate_many(&self, range: IdRange) -> Result<BatchReport, AppError> {
        let ids = self.legacy.list_ids(self.kind(), range).await?;
        Ok(self.run(&ids).await)
    }

    /// Cleans every past migration of this kind, then migrates all records.
    pub async fn migrate_all(&self) -> Result<BatchReport, AppError> {
        let ids = self.legacy.list_ids(self.kind(), IdRange::all()).await?;
        let cleaned = self.migrator.clean_all().await?;
        tracing::info!(
            kind = %self.kind(),
            documents = cleaned.documents,
            mappings = cleaned.mappings,
            "Cleaned past migrations"
        );
        Ok(self.run(&ids).await)
    }

    pub async fn clean_single(&self, legacy_id: i64) -> Result<Option<String>, AppError> {
        self.migrator.clean_single(legacy_id).await
    }

    pub async fn clean_all(&self) -> Result<CleanReport, AppError> {
        self.migrator.clean_all().await
    }

    async fn run(&self, ids: &[i64]) -> BatchReport {
        let total = ids.len();
        tracing::info!(kind = %self.kind(), total, "Starting batch");

        let mut reports = Vec::with_capacity(total);
        let mut failed = 0usize;
        for &legacy_id in ids {
            let report = self.migrate_one(legacy_id).await;
            if report.is_none() {
                failed += 1;
            }
            reports.push(report);
        }

        tracing::info!(kind = %self.kind(), total, failed, "Finished batch");
        reports
    }
}
