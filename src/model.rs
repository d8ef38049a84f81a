use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::date_util::parse_report_date;

/// Closed set of task statuses recognized by the status tallies.
///
/// Records carry the raw status string; anything outside this set counts
/// toward task totals but toward none of the per-status counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    InProgress,
    OnHold,
}

impl TaskStatus {
    /// Exact-match parse. Returns `None` for unrecognized strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Completed" => Some(TaskStatus::Completed),
            "In Progress" => Some(TaskStatus::InProgress),
            "On Hold" => Some(TaskStatus::OnHold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "Completed",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::OnHold => "On Hold",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged unit of work, as exported by the tracking service.
///
/// Field values originate from user-entered data; everything optional is
/// genuinely optional in the wild, and `percentageCompletion` arrives as a
/// number or a numeric string depending on the export version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub emp_id: String,
    #[serde(default)]
    pub emp_name: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    pub status: String,
    /// Logged time as `H:MM`, e.g. `2:30`.
    #[serde(default)]
    pub time_spent: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_int")]
    pub percentage_completion: Option<i64>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(deserialize_with = "de_report_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub task_description: Option<String>,
}

impl TaskRecord {
    /// Display name for the owning user: `empName` when present and
    /// non-empty, otherwise a label synthesized from `empId`.
    pub fn display_name(&self) -> String {
        match self.emp_name.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("User {}", self.emp_id),
        }
    }
}

/// Accept an integer, a float, or a numeric string; anything else becomes
/// `None` rather than a deserialization error.
fn de_lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

fn de_report_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_report_date(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date: {s}")))
}
