//! Schema step trait and registry.

use futures::future::BoxFuture;

use crate::db::{SqlClient, SqlExecutor, Transaction as _};
use crate::error::AppError;

/// One versioned, forward-only schema change.
///
/// Uses BoxFuture to avoid `'static` requirements from `#[async_trait]`.
pub trait SchemaStep: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered set of schema steps for one database.
pub struct Register {
    name: &'static str,
    steps: Vec<Box<dyn SchemaStep>>,
}

impl Register {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn register(mut self, step: impl SchemaStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SchemaStep> {
        self.steps.iter().map(|s| s.as_ref())
    }

    /// Run all steps above `current_version`, each in its own transaction.
    ///
    /// Returns the applied `(version, id)` pairs in order.
    pub async fn run_pending<C>(
        &self,
        client: &C,
        current_version: u32,
    ) -> Result<Vec<(u32, String)>, AppError>
    where
        C: SqlClient,
    {
        let mut applied = vec![];

        for step in &self.steps {
            if step.version() <= current_version {
                continue;
            }

            tracing::info!(
                "Applying {} schema step {} (v{}): {}",
                self.name,
                step.id(),
                step.version(),
                step.description()
            );

            let txn = client.begin().await?;
            match step.up(&txn).await {
                Ok(()) => txn.commit().await?,
                Err(e) => {
                    tracing::error!("{} schema step {} failed: {}", self.name, step.id(), e);
                    txn.rollback().await?;
                    return Err(e);
                }
            }

            applied.push((step.version(), step.id().to_string()));
        }

        Ok(applied)
    }
}
