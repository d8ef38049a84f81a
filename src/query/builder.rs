use crate::date_util::parse_report_date;
use crate::error::Result;
use crate::model::TaskRecord;
use crate::query::range::DateRange;
use crate::storage::Database;

/// Builder for fetching task collections with optional filters.
///
/// This is the data-access seam the aggregation engine sits behind: callers
/// describe a `(date range, filter set)` here, execute it, and hand the
/// resulting collection to the engine. The engine itself never filters.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    emp_id: Option<String>,
    project_name: Option<String>,
    team_name: Option<String>,
    status: Option<String>,
    work_type: Option<String>,
    min_completion: Option<i64>,
    max_completion: Option<i64>,
    date_after: Option<String>,
    date_before: Option<String>,
    limit: Option<u32>,
    order_by: Option<String>,
    order_desc: bool,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emp(mut self, emp_id: &str) -> Self {
        self.emp_id = Some(emp_id.to_string());
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.project_name = Some(name.to_string());
        self
    }

    pub fn team(mut self, name: &str) -> Self {
        self.team_name = Some(name.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn work_type(mut self, label: &str) -> Self {
        self.work_type = Some(label.to_string());
        self
    }

    pub fn min_completion(mut self, pct: i64) -> Self {
        self.min_completion = Some(pct);
        self
    }

    pub fn max_completion(mut self, pct: i64) -> Self {
        self.max_completion = Some(pct);
        self
    }

    pub fn date_after(mut self, date_key: &str) -> Self {
        self.date_after = Some(date_key.to_string());
        self
    }

    pub fn date_before(mut self, date_key: &str) -> Self {
        self.date_before = Some(date_key.to_string());
        self
    }

    /// Apply a [`DateRange`]'s bounds as the date filter.
    pub fn range(mut self, range: &DateRange) -> Self {
        if let Some((start, end)) = range.bounds() {
            self.date_after = Some(start.format("%Y-%m-%d").to_string());
            self.date_before = Some(end.format("%Y-%m-%d").to_string());
        }
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    pub fn descending(mut self) -> Self {
        self.order_desc = true;
        self
    }

    /// Build and execute the query, returning task records.
    pub async fn tasks(self, db: &Database) -> Result<Vec<TaskRecord>> {
        let builder = self;
        db.reader()
            .call(move |conn| {
                let (sql, params) = builder.build_sql();
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(param_refs.as_slice(), |row| {
                    let date_str: String = row.get(9)?;
                    let date = parse_report_date(&date_str).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            9,
                            rusqlite::types::Type::Text,
                            format!("unrecognized timestamp: {date_str}").into(),
                        )
                    })?;
                    Ok(TaskRecord {
                        id: row.get(0)?,
                        emp_id: row.get(1)?,
                        emp_name: row.get(2)?,
                        team_name: row.get(3)?,
                        project_name: row.get(4)?,
                        status: row.get(5)?,
                        time_spent: row.get(6)?,
                        percentage_completion: row.get(7)?,
                        work_type: row.get(8)?,
                        date,
                        task_description: row.get(10)?,
                    })
                })?;
                let result: std::result::Result<Vec<TaskRecord>, _> = rows.collect();
                result
            })
            .await
            .map_err(|e| crate::error::Error::Database(e.to_string()))
    }

    /// Build and execute the query, returning a count of matching records.
    pub async fn count(self, db: &Database) -> Result<u64> {
        let builder = self;
        db.reader()
            .call(move |conn| {
                let (inner_sql, params) = builder.build_sql();
                let sql = format!("SELECT COUNT(*) FROM ({inner_sql})");
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
                Ok::<u64, rusqlite::Error>(count as u64)
            })
            .await
            .map_err(|e| crate::error::Error::Database(e.to_string()))
    }

    /// Build and execute the query, returning results as JSON.
    pub async fn to_json(self, db: &Database) -> Result<String> {
        let rows = self.tasks(db).await?;
        serde_json::to_string_pretty(&rows).map_err(|e| crate::error::Error::Other(e.to_string()))
    }

    /// Build and execute the query, returning results as CSV.
    pub async fn to_csv(self, db: &Database) -> Result<String> {
        let rows = self.tasks(db).await?;
        let mut out = String::new();
        out.push_str("task_id,emp_id,emp_name,team_name,project_name,status,time_spent,percentage_completion,work_type,date,task_description\n");
        for row in &rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{}\n",
                csv_escape(&row.id),
                csv_escape(&row.emp_id),
                csv_escape(row.emp_name.as_deref().unwrap_or("")),
                csv_escape(row.team_name.as_deref().unwrap_or("")),
                csv_escape(row.project_name.as_deref().unwrap_or("")),
                csv_escape(&row.status),
                csv_escape(row.time_spent.as_deref().unwrap_or("")),
                row.percentage_completion
                    .map_or(String::new(), |p| p.to_string()),
                csv_escape(row.work_type.as_deref().unwrap_or("")),
                row.date.to_rfc3339(),
                csv_escape(row.task_description.as_deref().unwrap_or("")),
            ));
        }
        Ok(out)
    }

    fn build_sql(&self) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut wheres = Vec::new();
        let mut param_idx = 1;

        let select = "SELECT task_id, emp_id, emp_name, team_name, project_name,
                status, time_spent, percentage_completion, work_type,
                task_date, task_description
            FROM task_reports";

        if let Some(ref emp) = self.emp_id {
            wheres.push(format!("emp_id = ?{param_idx}"));
            params.push(Box::new(emp.clone()));
            param_idx += 1;
        }
        if let Some(ref name) = self.project_name {
            wheres.push(format!("project_name = ?{param_idx}"));
            params.push(Box::new(name.clone()));
            param_idx += 1;
        }
        if let Some(ref name) = self.team_name {
            wheres.push(format!("team_name = ?{param_idx}"));
            params.push(Box::new(name.clone()));
            param_idx += 1;
        }
        if let Some(ref status) = self.status {
            wheres.push(format!("status = ?{param_idx}"));
            params.push(Box::new(status.clone()));
            param_idx += 1;
        }
        if let Some(ref label) = self.work_type {
            wheres.push(format!("work_type = ?{param_idx}"));
            params.push(Box::new(label.clone()));
            param_idx += 1;
        }
        if let Some(pct) = self.min_completion {
            wheres.push(format!("percentage_completion >= ?{param_idx}"));
            params.push(Box::new(pct));
            param_idx += 1;
        }
        if let Some(pct) = self.max_completion {
            wheres.push(format!("percentage_completion <= ?{param_idx}"));
            params.push(Box::new(pct));
            param_idx += 1;
        }
        if let Some(ref date) = self.date_after {
            wheres.push(format!("date_key >= ?{param_idx}"));
            params.push(Box::new(date.clone()));
            param_idx += 1;
        }
        if let Some(ref date) = self.date_before {
            wheres.push(format!("date_key <= ?{param_idx}"));
            params.push(Box::new(date.clone()));
            param_idx += 1;
        }

        let mut sql = select.to_string();
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }

        let order_field = self.order_by.as_deref().unwrap_or("task_date");
        let order_dir = if self.order_desc { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {order_field} {order_dir}, task_id"));

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT ?{param_idx}"));
            params.push(Box::new(limit));
        }

        (sql, params)
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
