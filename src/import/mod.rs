use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::TaskRecord;
use crate::storage::{repository, Database};

/// Options controlling an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and validate without writing anything.
    pub dry_run: bool,
}

/// Report returned after an import run completes.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub source: String,
    pub status: ImportStatus,
    pub records_read: u64,
    pub records_imported: u64,
    pub records_skipped: u64,
    pub error: Option<String>,
}

impl ImportReport {
    /// Create an ImportReport with the appropriate status derived from counts.
    pub fn from_counts(
        source: String,
        records_read: u64,
        records_imported: u64,
        records_skipped: u64,
    ) -> Self {
        let status = if records_read > 0 && records_imported == 0 {
            ImportStatus::Failed
        } else if records_skipped > 0 {
            ImportStatus::PartialFailure
        } else {
            ImportStatus::Success
        };
        let error = if records_skipped > 0 {
            Some(format!("{records_skipped} records skipped"))
        } else {
            None
        };
        Self {
            source,
            status,
            records_read,
            records_imported,
            records_skipped,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    Success,
    PartialFailure,
    Failed,
}

impl ImportStatus {
    fn as_job_status(&self) -> &'static str {
        match self {
            ImportStatus::Success => "success",
            ImportStatus::PartialFailure => "partial",
            ImportStatus::Failed => "failed",
        }
    }
}

/// Import a JSON export file into the warehouse.
///
/// The file must hold a JSON array of task-report objects. Records that
/// cannot be deserialized (missing `id`/`empId`, unparseable `date`) are
/// skipped with a warning and counted in `records_skipped`; malformed
/// optional fields never cost a record. Re-importing the same file is
/// idempotent since records replace by id.
pub async fn import_file(
    db: &Database,
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let path = path.as_ref();
    let source = path.display().to_string();

    let raw = std::fs::read_to_string(path)?;

    let job_id = if options.dry_run {
        None
    } else {
        let source = source.clone();
        Some(
            db.writer()
                .call(move |conn| repository::insert_import_job(conn, &source))
                .await?,
        )
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            let message = format!("not a JSON array of task reports: {e}");
            if let Some(job_id) = job_id {
                let msg = message.clone();
                db.writer()
                    .call(move |conn| {
                        repository::update_import_job(conn, job_id, "failed", 0, 0, 0, Some(&msg))
                    })
                    .await?;
            }
            return Err(Error::Import {
                source_path: source,
                message,
            });
        }
    };

    let records_read = values.len() as u64;
    let mut tasks: Vec<TaskRecord> = Vec::with_capacity(values.len());
    let mut records_skipped = 0u64;

    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<TaskRecord>(value) {
            Ok(task) if task.id.is_empty() || task.emp_id.is_empty() => {
                log::warn!("{source}: record {i} has an empty id or empId, skipping");
                records_skipped += 1;
            }
            Ok(task) => tasks.push(task),
            Err(e) => {
                log::warn!("{source}: record {i} skipped: {e}");
                records_skipped += 1;
            }
        }
    }

    let records_imported = tasks.len() as u64;

    if !options.dry_run && !tasks.is_empty() {
        db.writer()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for task in &tasks {
                    repository::upsert_task_report(&tx, task)?;
                }
                tx.commit()?;
                Ok::<(), rusqlite::Error>(())
            })
            .await?;
    }

    let report = ImportReport::from_counts(source, records_read, records_imported, records_skipped);
    log::info!(
        "{}: read {}, imported {}, skipped {}",
        report.source,
        report.records_read,
        report.records_imported,
        report.records_skipped
    );

    if let Some(job_id) = job_id {
        let status = report.status.as_job_status();
        let (read, imported, skipped) = (records_read, records_imported, records_skipped);
        let error = report.error.clone();
        db.writer()
            .call(move |conn| {
                repository::update_import_job(
                    conn,
                    job_id,
                    status,
                    read,
                    imported,
                    skipped,
                    error.as_deref(),
                )
            })
            .await?;
    }

    Ok(report)
}
