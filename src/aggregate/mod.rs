//! Aggregation engine: pure, synchronous folds over a task collection.
//!
//! Each function recomputes from scratch on every call; nothing here holds
//! state between runs, performs I/O, or mutates its input. Callers fetch a
//! fresh collection from the query layer and hand it to whichever views they
//! need.

pub mod types;

pub use types::*;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::date_util::short_label;
use crate::model::{TaskRecord, TaskStatus};

/// Parse a logged duration `H:MM` into fractional hours.
///
/// Absent, empty, or malformed input contributes zero rather than an error;
/// tasks with no logged time are a legitimate and common case.
pub fn parse_time_spent(raw: Option<&str>) -> f64 {
    let Some(s) = raw else { return 0.0 };
    let Some((h, m)) = s.trim().split_once(':') else {
        return 0.0;
    };
    match (h.parse::<u32>(), m.parse::<u32>()) {
        (Ok(hours), Ok(minutes)) => hours as f64 + minutes as f64 / 60.0,
        _ => 0.0,
    }
}

/// Shared per-group accumulator. Both keyed aggregations and the daily trend
/// fold tasks through this, so the "use the value if present, else contribute
/// zero" rules behave identically everywhere.
#[derive(Debug, Default)]
struct Tally {
    total_tasks: u64,
    completed: u64,
    in_progress: u64,
    on_hold: u64,
    total_hours: f64,
    completion_sum: i64,
    work_types: HashMap<String, u64>,
}

impl Tally {
    fn absorb(&mut self, task: &TaskRecord) {
        self.total_tasks += 1;
        match TaskStatus::parse(&task.status) {
            Some(TaskStatus::Completed) => self.completed += 1,
            Some(TaskStatus::InProgress) => self.in_progress += 1,
            Some(TaskStatus::OnHold) => self.on_hold += 1,
            // Unrecognized statuses still count toward the total.
            None => {}
        }
        self.total_hours += parse_time_spent(task.time_spent.as_deref());
        if let Some(pct) = task.percentage_completion {
            self.completion_sum += pct;
        }
        if let Some(wt) = task.work_type.as_deref().filter(|s| !s.is_empty()) {
            *self.work_types.entry(wt.to_string()).or_insert(0) += 1;
        }
    }

    /// Mean completion percentage. The divisor is the full task count, not
    /// the count of tasks that reported a percentage.
    fn avg_completion(&self) -> i64 {
        ratio_rounded(self.completion_sum, self.total_tasks)
    }

    fn completion_rate(&self) -> i64 {
        ratio_rounded(self.completed as i64 * 100, self.total_tasks)
    }

    fn avg_hours_per_task(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        round1(self.total_hours / self.total_tasks as f64)
    }
}

fn ratio_rounded(numerator: i64, denominator: u64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64).round() as i64
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Group tasks by owning user and fold into [`UserSummary`] rows.
///
/// Result is sorted descending by task count; ties keep first-seen order.
pub fn aggregate_by_user(tasks: &[TaskRecord]) -> Vec<UserSummary> {
    #[derive(Default)]
    struct UserAccum {
        emp_name: String,
        tally: Tally,
        projects: HashSet<String>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, UserAccum> = HashMap::new();

    for task in tasks {
        let accum = groups.entry(task.emp_id.clone()).or_insert_with(|| {
            order.push(task.emp_id.clone());
            UserAccum {
                emp_name: task.display_name(),
                ..Default::default()
            }
        });
        accum.tally.absorb(task);
        if let Some(p) = task.project_name.as_deref().filter(|s| !s.is_empty()) {
            accum.projects.insert(p.to_string());
        }
    }

    let mut summaries: Vec<UserSummary> = order
        .into_iter()
        .filter_map(|emp_id| {
            groups.remove(&emp_id).map(|accum| UserSummary {
                emp_id,
                emp_name: accum.emp_name,
                total_tasks: accum.tally.total_tasks,
                completed: accum.tally.completed,
                in_progress: accum.tally.in_progress,
                on_hold: accum.tally.on_hold,
                total_hours: accum.tally.total_hours,
                avg_completion: accum.tally.avg_completion(),
                avg_hours_per_task: accum.tally.avg_hours_per_task(),
                completion_rate: accum.tally.completion_rate(),
                num_projects: accum.projects.len() as u64,
                work_types: accum.tally.work_types,
            })
        })
        .collect();
    summaries.sort_by(|a, b| b.total_tasks.cmp(&a.total_tasks));
    summaries
}

/// Group tasks by project and fold into [`ProjectSummary`] rows.
///
/// Tasks with an absent or empty `project_name` contribute to no bucket.
/// Sort rules match [`aggregate_by_user`].
pub fn aggregate_by_project(tasks: &[TaskRecord]) -> Vec<ProjectSummary> {
    #[derive(Default)]
    struct ProjectAccum {
        tally: Tally,
        users: HashSet<String>,
        teams: HashSet<String>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, ProjectAccum> = HashMap::new();

    for task in tasks {
        let Some(project) = task.project_name.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let accum = groups.entry(project.to_string()).or_insert_with(|| {
            order.push(project.to_string());
            ProjectAccum::default()
        });
        accum.tally.absorb(task);
        accum.users.insert(task.emp_id.clone());
        if let Some(team) = task.team_name.as_deref().filter(|s| !s.is_empty()) {
            accum.teams.insert(team.to_string());
        }
    }

    let mut summaries: Vec<ProjectSummary> = order
        .into_iter()
        .filter_map(|project_name| {
            groups.remove(&project_name).map(|accum| ProjectSummary {
                project_name,
                total_tasks: accum.tally.total_tasks,
                completed: accum.tally.completed,
                in_progress: accum.tally.in_progress,
                on_hold: accum.tally.on_hold,
                total_hours: accum.tally.total_hours,
                avg_completion: accum.tally.avg_completion(),
                avg_hours_per_task: accum.tally.avg_hours_per_task(),
                completion_rate: accum.tally.completion_rate(),
                num_users: accum.users.len() as u64,
                num_teams: accum.teams.len() as u64,
                work_types: accum.tally.work_types,
            })
        })
        .collect();
    summaries.sort_by(|a, b| b.total_tasks.cmp(&a.total_tasks));
    summaries
}

/// Group tasks by calendar day (time-of-day discarded) and fold into
/// [`DailySummary`] rows, ascending by date.
///
/// Downstream trend charts assume chronological order, so the sort is on the
/// underlying date, never the display label.
pub fn aggregate_by_day(tasks: &[TaskRecord]) -> Vec<DailySummary> {
    let mut groups: HashMap<NaiveDate, Tally> = HashMap::new();
    for task in tasks {
        groups.entry(task.date.date_naive()).or_default().absorb(task);
    }

    let mut days: Vec<(NaiveDate, Tally)> = groups.into_iter().collect();
    days.sort_by_key(|(date, _)| *date);
    days.into_iter()
        .map(|(date, tally)| DailySummary {
            date,
            label: short_label(date),
            total_tasks: tally.total_tasks,
            completed: tally.completed,
            hours: tally.total_hours,
            avg_completion: tally.avg_completion(),
        })
        .collect()
}

/// Count tasks per work-type label. Tasks with an absent or empty
/// `work_type` are skipped. No ordering guarantee on the output.
pub fn histogram_by_work_type(tasks: &[TaskRecord]) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for task in tasks {
        if let Some(wt) = task.work_type.as_deref().filter(|s| !s.is_empty()) {
            *counts.entry(wt.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Compute all four views over one collection.
pub fn snapshot(tasks: &[TaskRecord]) -> Snapshot {
    Snapshot {
        users: aggregate_by_user(tasks),
        projects: aggregate_by_project(tasks),
        daily: aggregate_by_day(tasks),
        work_types: histogram_by_work_type(tasks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(
        id: &str,
        emp_id: &str,
        status: &str,
        day: u32,
        time_spent: Option<&str>,
        pct: Option<i64>,
        project: Option<&str>,
        work_type: Option<&str>,
    ) -> TaskRecord {
        TaskRecord {
            id: id.to_string(),
            emp_id: emp_id.to_string(),
            emp_name: None,
            team_name: None,
            project_name: project.map(String::from),
            status: status.to_string(),
            time_spent: time_spent.map(String::from),
            percentage_completion: pct,
            work_type: work_type.map(String::from),
            date: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            task_description: None,
        }
    }

    // ========== parse_time_spent ==========

    #[test]
    fn test_parse_time_spent_basic() {
        assert_eq!(parse_time_spent(Some("2:30")), 2.5);
        assert_eq!(parse_time_spent(Some("0:45")), 0.75);
        assert_eq!(parse_time_spent(Some("10:00")), 10.0);
        assert_eq!(parse_time_spent(Some("0:00")), 0.0);
    }

    #[test]
    fn test_parse_time_spent_absent_or_malformed() {
        assert_eq!(parse_time_spent(None), 0.0);
        assert_eq!(parse_time_spent(Some("")), 0.0);
        assert_eq!(parse_time_spent(Some("90")), 0.0);
        assert_eq!(parse_time_spent(Some("two:thirty")), 0.0);
        assert_eq!(parse_time_spent(Some("-1:30")), 0.0);
    }

    // ========== empty input (scenario A) ==========

    #[test]
    fn test_empty_input_all_views() {
        let tasks: Vec<TaskRecord> = Vec::new();
        assert!(aggregate_by_user(&tasks).is_empty());
        assert!(aggregate_by_project(&tasks).is_empty());
        assert!(aggregate_by_day(&tasks).is_empty());
        assert!(histogram_by_work_type(&tasks).is_empty());
    }

    // ========== single task (scenario B) ==========

    #[test]
    fn test_single_task_all_views() {
        let tasks = vec![task(
            "T1",
            "U1",
            "Completed",
            1,
            Some("2:30"),
            Some(80),
            Some("P1"),
            Some("Full-day"),
        )];

        let users = aggregate_by_user(&tasks);
        assert_eq!(users.len(), 1);
        let u = &users[0];
        assert_eq!(u.emp_id, "U1");
        assert_eq!(u.emp_name, "User U1");
        assert_eq!(u.total_tasks, 1);
        assert_eq!(u.completed, 1);
        assert_eq!(u.total_hours, 2.5);
        assert_eq!(u.avg_completion, 80);
        assert_eq!(u.completion_rate, 100);
        assert_eq!(u.avg_hours_per_task, 2.5);
        assert_eq!(u.num_projects, 1);
        assert_eq!(u.work_types.get("Full-day"), Some(&1));

        let projects = aggregate_by_project(&tasks);
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.project_name, "P1");
        assert_eq!(p.total_tasks, 1);
        assert_eq!(p.completed, 1);
        assert_eq!(p.total_hours, 2.5);
        assert_eq!(p.avg_completion, 80);
        assert_eq!(p.completion_rate, 100);
        assert_eq!(p.num_users, 1);

        let daily = aggregate_by_day(&tasks);
        assert_eq!(daily.len(), 1);
        let d = &daily[0];
        assert_eq!(d.date.to_string(), "2024-01-01");
        assert_eq!(d.label, "Jan 1");
        assert_eq!(d.total_tasks, 1);
        assert_eq!(d.completed, 1);
        assert_eq!(d.hours, 2.5);
        assert_eq!(d.avg_completion, 80);

        let hist = histogram_by_work_type(&tasks);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.get("Full-day"), Some(&1));
    }

    // ========== sparse fields (scenario C) ==========

    #[test]
    fn test_sparse_completion_divides_by_total() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, Some("2:00"), Some(80), None, None),
            task("T2", "U1", "On Hold", 2, None, None, None, None),
        ];
        let users = aggregate_by_user(&tasks);
        assert_eq!(users.len(), 1);
        let u = &users[0];
        assert_eq!(u.total_tasks, 2);
        assert_eq!(u.on_hold, 1);
        assert_eq!(u.total_hours, 2.0);
        // 80 / 2 tasks, not 80 / 1 reported value
        assert_eq!(u.avg_completion, 40);
        assert_eq!(u.completion_rate, 50);
        assert_eq!(u.avg_hours_per_task, 1.0);
    }

    // ========== missing project (scenario E) ==========

    #[test]
    fn test_missing_project_excluded_from_project_view_only() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, None, None, None),
            task("T2", "U2", "Completed", 1, None, None, Some("P1"), None),
            task("T3", "U3", "Completed", 1, None, None, Some(""), None),
        ];
        assert_eq!(aggregate_by_user(&tasks).len(), 3);
        assert_eq!(aggregate_by_day(&tasks)[0].total_tasks, 3);

        let projects = aggregate_by_project(&tasks);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].total_tasks, 1);
    }

    // ========== status handling ==========

    #[test]
    fn test_unrecognized_status_counts_total_only() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, None, None, None),
            task("T2", "U1", "Cancelled", 1, None, None, None, None),
            task("T3", "U1", "In Progress", 1, None, None, None, None),
        ];
        let u = &aggregate_by_user(&tasks)[0];
        assert_eq!(u.total_tasks, 3);
        assert_eq!(u.completed, 1);
        assert_eq!(u.in_progress, 1);
        assert_eq!(u.on_hold, 0);
        // completion_rate still divides by the full total
        assert_eq!(u.completion_rate, 33);
    }

    // ========== rounding ==========

    #[test]
    fn test_avg_completion_rounds_half_up() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, Some(50), None, None),
            task("T2", "U1", "Completed", 1, None, Some(25), None, None),
        ];
        // 75 / 2 = 37.5 -> 38
        assert_eq!(aggregate_by_user(&tasks)[0].avg_completion, 38);
    }

    #[test]
    fn test_completion_rate_rounding() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, None, None, None),
            task("T2", "U1", "Completed", 1, None, None, None, None),
            task("T3", "U1", "In Progress", 1, None, None, None, None),
        ];
        // 2/3 = 66.67 -> 67
        assert_eq!(aggregate_by_user(&tasks)[0].completion_rate, 67);
    }

    #[test]
    fn test_avg_hours_one_decimal() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, Some("1:00"), None, None, None),
            task("T2", "U1", "Completed", 1, Some("0:30"), None, None, None),
            task("T3", "U1", "Completed", 1, Some("0:30"), None, None, None),
        ];
        // 2.0 / 3 = 0.666... -> 0.7
        assert_eq!(aggregate_by_user(&tasks)[0].avg_hours_per_task, 0.7);
    }

    // ========== ordering ==========

    #[test]
    fn test_user_sort_descending_stable_ties() {
        let tasks = vec![
            task("T1", "alpha", "Completed", 1, None, None, None, None),
            task("T2", "beta", "Completed", 1, None, None, None, None),
            task("T3", "gamma", "Completed", 1, None, None, None, None),
            task("T4", "beta", "Completed", 2, None, None, None, None),
            task("T5", "alpha", "Completed", 2, None, None, None, None),
        ];
        let users = aggregate_by_user(&tasks);
        let ids: Vec<&str> = users.iter().map(|u| u.emp_id.as_str()).collect();
        // alpha and beta tie at 2; alpha was seen first
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_daily_sorted_ascending_by_date() {
        let tasks = vec![
            task("T1", "U1", "Completed", 20, None, None, None, None),
            task("T2", "U1", "Completed", 5, None, None, None, None),
            task("T3", "U1", "Completed", 12, None, None, None, None),
        ];
        let daily = aggregate_by_day(&tasks);
        let dates: Vec<String> = daily.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-01-12", "2024-01-20"]);
    }

    #[test]
    fn test_daily_discards_time_of_day() {
        let mut early = task("T1", "U1", "Completed", 3, None, None, None, None);
        early.date = Utc.with_ymd_and_hms(2024, 1, 3, 0, 5, 0).unwrap();
        let mut late = task("T2", "U2", "In Progress", 3, None, None, None, None);
        late.date = Utc.with_ymd_and_hms(2024, 1, 3, 23, 55, 0).unwrap();

        let daily = aggregate_by_day(&[early, late]);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].total_tasks, 2);
    }

    // ========== distinct counting ==========

    #[test]
    fn test_distinct_projects_users_teams() {
        let mut t1 = task("T1", "U1", "Completed", 1, None, None, Some("P1"), None);
        t1.team_name = Some("Core".to_string());
        let mut t2 = task("T2", "U2", "Completed", 1, None, None, Some("P1"), None);
        t2.team_name = Some("Core".to_string());
        let mut t3 = task("T3", "U1", "Completed", 2, None, None, Some("P2"), None);
        t3.team_name = Some("Infra".to_string());

        let users = aggregate_by_user(&[t1.clone(), t2.clone(), t3.clone()]);
        let u1 = users.iter().find(|u| u.emp_id == "U1").unwrap();
        assert_eq!(u1.num_projects, 2);

        let projects = aggregate_by_project(&[t1, t2, t3]);
        let p1 = projects.iter().find(|p| p.project_name == "P1").unwrap();
        assert_eq!(p1.num_users, 2);
        assert_eq!(p1.num_teams, 1);
    }

    // ========== histogram ==========

    #[test]
    fn test_histogram_counts_and_skips_empty() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, None, None, Some("Full-day")),
            task("T2", "U1", "Completed", 1, None, None, None, Some("Half-day")),
            task("T3", "U2", "Completed", 1, None, None, None, Some("Full-day")),
            task("T4", "U2", "Completed", 1, None, None, None, None),
            task("T5", "U2", "Completed", 1, None, None, None, Some("")),
        ];
        let hist = histogram_by_work_type(&tasks);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.get("Full-day"), Some(&2));
        assert_eq!(hist.get("Half-day"), Some(&1));
    }

    // ========== conservation & idempotence ==========

    #[test]
    fn test_totals_conserved_across_views() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, Some("1:15"), Some(90), Some("P1"), Some("Full-day")),
            task("T2", "U2", "On Hold", 2, None, None, None, None),
            task("T3", "U1", "Nonsense", 2, Some("0:45"), Some(10), Some("P2"), Some("Half-day")),
            task("T4", "U3", "In Progress", 3, None, Some(55), Some("P1"), None),
        ];

        let users = aggregate_by_user(&tasks);
        let user_total: u64 = users.iter().map(|u| u.total_tasks).sum();
        assert_eq!(user_total, tasks.len() as u64);

        let daily = aggregate_by_day(&tasks);
        let daily_total: u64 = daily.iter().map(|d| d.total_tasks).sum();
        assert_eq!(daily_total, tasks.len() as u64);

        // One task has no project, so the project view covers strictly fewer
        let projects = aggregate_by_project(&tasks);
        let project_total: u64 = projects.iter().map(|p| p.total_tasks).sum();
        assert_eq!(project_total, 3);
    }

    #[test]
    fn test_idempotent_over_same_input() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, Some("2:30"), Some(80), Some("P1"), Some("Full-day")),
            task("T2", "U2", "In Progress", 2, Some("0:45"), None, Some("P2"), None),
            task("T3", "U1", "On Hold", 3, None, Some(20), None, Some("Half-day")),
        ];
        assert_eq!(snapshot(&tasks), snapshot(&tasks));
    }

    #[test]
    fn test_bounds_on_percent_fields() {
        let tasks = vec![
            task("T1", "U1", "Completed", 1, None, Some(0), None, None),
            task("T2", "U1", "Completed", 1, None, Some(100), None, None),
            task("T3", "U2", "In Progress", 2, None, Some(37), None, None),
        ];
        for u in aggregate_by_user(&tasks) {
            assert!((0..=100).contains(&u.avg_completion));
            assert!((0..=100).contains(&u.completion_rate));
        }
    }
}
