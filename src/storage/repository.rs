use rusqlite::{params, Connection, OptionalExtension};

use crate::date_util::date_key;
use crate::model::TaskRecord;

// ── Task reports ───────────────────────────────────────────────────

/// Insert or replace a task report. Re-importing a record with the same id
/// overwrites the previous row, which makes imports idempotent.
pub fn upsert_task_report(conn: &Connection, task: &TaskRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO task_reports (
            task_id, emp_id, emp_name, team_name, project_name,
            status, time_spent, percentage_completion, work_type,
            task_date, date_key, task_description, imported_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, datetime('now'))
        ON CONFLICT(task_id) DO UPDATE SET
            emp_id=excluded.emp_id, emp_name=excluded.emp_name,
            team_name=excluded.team_name, project_name=excluded.project_name,
            status=excluded.status, time_spent=excluded.time_spent,
            percentage_completion=excluded.percentage_completion,
            work_type=excluded.work_type, task_date=excluded.task_date,
            date_key=excluded.date_key, task_description=excluded.task_description,
            imported_at=excluded.imported_at",
        params![
            task.id,
            task.emp_id,
            task.emp_name,
            task.team_name,
            task.project_name,
            task.status,
            task.time_spent,
            task.percentage_completion,
            task.work_type,
            task.date.to_rfc3339(),
            date_key(&task.date),
            task.task_description,
        ],
    )?;
    Ok(())
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Import jobs ────────────────────────────────────────────────────

pub fn insert_import_job(conn: &Connection, source: &str) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO import_jobs (source, status, started_at)
         VALUES (?1, 'running', datetime('now'))",
        params![source],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_import_job(
    conn: &Connection,
    job_id: i64,
    status: &str,
    records_read: u64,
    records_imported: u64,
    records_skipped: u64,
    error_message: Option<&str>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE import_jobs SET
            status = ?2, completed_at = datetime('now'),
            records_read = ?3, records_imported = ?4, records_skipped = ?5,
            error_message = ?6
         WHERE id = ?1",
        params![
            job_id,
            status,
            records_read as i64,
            records_imported as i64,
            records_skipped as i64,
            error_message,
        ],
    )?;
    Ok(())
}

// ── Warehouse stats ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WarehouseStats {
    pub task_reports: i64,
    pub users: i64,
    pub projects: i64,
    pub first_date_key: Option<String>,
    pub last_date_key: Option<String>,
    pub last_import_at: Option<String>,
}

pub fn warehouse_stats(conn: &Connection) -> Result<WarehouseStats, rusqlite::Error> {
    let (task_reports, users, projects, first_date_key, last_date_key) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT emp_id),
                COUNT(DISTINCT project_name), MIN(date_key), MAX(date_key)
         FROM task_reports",
        [],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )?;

    let last_import_at: Option<String> = conn
        .query_row(
            "SELECT MAX(completed_at) FROM import_jobs WHERE status != 'running'",
            [],
            |row| row.get(0),
        )
        .ok()
        .flatten();

    Ok(WarehouseStats {
        task_reports,
        users,
        projects,
        first_date_key,
        last_date_key,
        last_import_at,
    })
}
