use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

/// Per-user performance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub emp_id: String,
    pub emp_name: String,
    pub total_tasks: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub on_hold: u64,
    pub total_hours: f64,
    /// Mean of reported completion percentages over all tasks, 0-100.
    pub avg_completion: i64,
    pub avg_hours_per_task: f64,
    /// Share of tasks with status `Completed`, as a whole percent.
    pub completion_rate: i64,
    pub num_projects: u64,
    pub work_types: HashMap<String, u64>,
}

/// Per-project performance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_name: String,
    pub total_tasks: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub on_hold: u64,
    pub total_hours: f64,
    pub avg_completion: i64,
    pub avg_hours_per_task: f64,
    pub completion_rate: i64,
    pub num_users: u64,
    pub num_teams: u64,
    pub work_types: HashMap<String, u64>,
}

/// Per-day trend point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Short display label for charts, e.g. `Jan 5`.
    pub label: String,
    pub total_tasks: u64,
    pub completed: u64,
    pub hours: f64,
    pub avg_completion: i64,
}

/// All four aggregate views over one task collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub users: Vec<UserSummary>,
    pub projects: Vec<ProjectSummary>,
    pub daily: Vec<DailySummary>,
    pub work_types: HashMap<String, u64>,
}
