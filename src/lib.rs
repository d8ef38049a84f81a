pub mod aggregate;
pub mod date_util;
pub mod error;
pub mod import;
pub mod model;
pub mod query;
pub mod storage;

pub use aggregate::{
    aggregate_by_day, aggregate_by_project, aggregate_by_user, histogram_by_work_type, snapshot,
    DailySummary, ProjectSummary, Snapshot, UserSummary,
};
pub use error::{Error, Result};
pub use import::{ImportOptions, ImportReport, ImportStatus};
pub use model::{TaskRecord, TaskStatus};
pub use query::builder::QueryBuilder;
pub use query::range::DateRange;
pub use storage::Database;

// Re-exported for the binary's status command.
pub use storage::repository::WarehouseStats;

use storage::repository;

/// Main entry point for the task-report warehouse.
pub struct TaskPulse {
    db: Database,
}

impl TaskPulse {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Import a JSON export file of task reports.
    pub async fn import_file(
        &self,
        path: impl AsRef<std::path::Path>,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        import::import_file(&self.db, path, options).await
    }

    /// Warehouse stats for the status command.
    pub async fn stats(&self) -> Result<WarehouseStats> {
        self.db
            .reader()
            .call(|conn| repository::warehouse_stats(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
