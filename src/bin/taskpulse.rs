use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskpulse::{DateRange, QueryBuilder, TaskPulse, TaskRecord};

#[derive(Parser)]
#[command(name = "taskpulse", about = "Task-report warehouse and analytics CLI")]
struct Cli {
    /// Database path (default: ~/.taskpulse/taskpulse.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON export of task reports
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Parse and validate without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Query raw task reports with filters
    Query {
        /// Filter by user id
        #[arg(long)]
        emp: Option<String>,
        /// Filter by project name
        #[arg(long)]
        project: Option<String>,
        /// Filter by team name
        #[arg(long)]
        team: Option<String>,
        /// Filter by exact status (Completed, In Progress, On Hold)
        #[arg(long)]
        status: Option<String>,
        /// Filter by work-type label
        #[arg(long)]
        work_type: Option<String>,
        /// Minimum completion percentage
        #[arg(long)]
        min_completion: Option<i64>,
        /// Maximum completion percentage
        #[arg(long)]
        max_completion: Option<i64>,
        /// Date range (e.g. 2024-01, 30d, 2024-01-01..2024-01-31, all)
        #[arg(long, default_value = "all")]
        range: String,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
    /// Compute aggregate reports over the matching task collection
    Report {
        #[command(subcommand)]
        view: ReportView,
    },
    /// Show warehouse status
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ReportView {
    /// Per-user performance summaries
    Users {
        #[command(flatten)]
        scope: ReportScope,
    },
    /// Per-project performance summaries
    Projects {
        #[command(flatten)]
        scope: ReportScope,
    },
    /// Per-day trend
    Daily {
        #[command(flatten)]
        scope: ReportScope,
    },
    /// Work-type histogram
    WorkTypes {
        #[command(flatten)]
        scope: ReportScope,
    },
    /// All four views as one document
    All {
        #[command(flatten)]
        scope: ReportScope,
    },
}

/// Range and filter set handed to the data-access layer. The aggregators
/// themselves see only the fetched collection.
#[derive(Args)]
struct ReportScope {
    /// Date range (e.g. 2024-01, 30d, 2024-01-01..2024-01-31, all)
    #[arg(long, default_value = "all")]
    range: String,
    /// Filter by exact status
    #[arg(long)]
    status: Option<String>,
    /// Filter by work-type label
    #[arg(long)]
    work_type: Option<String>,
    /// Filter by team name
    #[arg(long)]
    team: Option<String>,
    /// Filter by project name
    #[arg(long)]
    project: Option<String>,
    /// Minimum completion percentage
    #[arg(long)]
    min_completion: Option<i64>,
    /// Maximum completion percentage
    #[arg(long)]
    max_completion: Option<i64>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => taskpulse::Database::open_at(path).await?,
        None => taskpulse::Database::open().await?,
    };
    let app = TaskPulse::new(db);

    match cli.command {
        Commands::Import { file, dry_run } => {
            let options = taskpulse::ImportOptions { dry_run };
            let report = app.import_file(&file, &options).await?;
            print_import_report(&report);
        }
        Commands::Query {
            emp,
            project,
            team,
            status,
            work_type,
            min_completion,
            max_completion,
            range,
            limit,
            json,
            csv,
            count,
        } => {
            let range = DateRange::parse(&range)?;
            let mut builder = QueryBuilder::new().range(&range).limit(limit);
            if let Some(ref v) = emp {
                builder = builder.emp(v);
            }
            if let Some(ref v) = project {
                builder = builder.project(v);
            }
            if let Some(ref v) = team {
                builder = builder.team(v);
            }
            if let Some(ref v) = status {
                builder = builder.status(v);
            }
            if let Some(ref v) = work_type {
                builder = builder.work_type(v);
            }
            if let Some(v) = min_completion {
                builder = builder.min_completion(v);
            }
            if let Some(v) = max_completion {
                builder = builder.max_completion(v);
            }

            if count {
                let n = builder.count(app.db()).await?;
                println!("{n}");
            } else if json {
                let output = builder.to_json(app.db()).await?;
                println!("{output}");
            } else if csv {
                let output = builder.to_csv(app.db()).await?;
                print!("{output}");
            } else {
                let rows = builder.tasks(app.db()).await?;
                if rows.is_empty() {
                    println!("No task reports found.");
                } else {
                    for row in &rows {
                        let project = row.project_name.as_deref().unwrap_or("-");
                        let time = row.time_spent.as_deref().unwrap_or("-");
                        println!(
                            "[{}] {} {} | {} | {} | {}",
                            row.date.date_naive(),
                            row.id,
                            row.display_name(),
                            row.status,
                            project,
                            time,
                        );
                    }
                    println!("\n{} task reports", rows.len());
                }
            }
        }
        Commands::Report { view } => {
            handle_report(&app, view).await?;
        }
        Commands::Status => {
            print_status(&app).await?;
        }
        Commands::Config { action } => {
            handle_config(&app, action).await?;
        }
    }

    Ok(())
}

/// Fetch the task collection described by a report scope.
async fn fetch_scope(app: &TaskPulse, scope: &ReportScope) -> anyhow::Result<Vec<TaskRecord>> {
    let range = DateRange::parse(&scope.range)?;
    let mut builder = QueryBuilder::new().range(&range);
    if let Some(ref v) = scope.status {
        builder = builder.status(v);
    }
    if let Some(ref v) = scope.work_type {
        builder = builder.work_type(v);
    }
    if let Some(ref v) = scope.team {
        builder = builder.team(v);
    }
    if let Some(ref v) = scope.project {
        builder = builder.project(v);
    }
    if let Some(v) = scope.min_completion {
        builder = builder.min_completion(v);
    }
    if let Some(v) = scope.max_completion {
        builder = builder.max_completion(v);
    }
    Ok(builder.tasks(app.db()).await?)
}

async fn handle_report(app: &TaskPulse, view: ReportView) -> anyhow::Result<()> {
    match view {
        ReportView::Users { scope } => {
            let tasks = fetch_scope(app, &scope).await?;
            let users = taskpulse::aggregate_by_user(&tasks);
            if scope.json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("No task reports in range.");
            } else {
                println!("Users: {} ({} tasks)", users.len(), tasks.len());
                for u in &users {
                    print_user_row(u);
                }
            }
        }
        ReportView::Projects { scope } => {
            let tasks = fetch_scope(app, &scope).await?;
            let projects = taskpulse::aggregate_by_project(&tasks);
            if scope.json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No task reports with a project in range.");
            } else {
                println!("Projects: {} ({} tasks)", projects.len(), tasks.len());
                for p in &projects {
                    print_project_row(p);
                }
            }
        }
        ReportView::Daily { scope } => {
            let tasks = fetch_scope(app, &scope).await?;
            let daily = taskpulse::aggregate_by_day(&tasks);
            if scope.json {
                println!("{}", serde_json::to_string_pretty(&daily)?);
            } else if daily.is_empty() {
                println!("No task reports in range.");
            } else {
                println!("Daily trend: {} days", daily.len());
                for d in &daily {
                    println!(
                        "  {:<7} tasks: {:<4} done: {:<4} hours: {:<6.1} avg done: {}%",
                        d.label, d.total_tasks, d.completed, d.hours, d.avg_completion
                    );
                }
            }
        }
        ReportView::WorkTypes { scope } => {
            let tasks = fetch_scope(app, &scope).await?;
            let hist = taskpulse::histogram_by_work_type(&tasks);
            if scope.json {
                println!("{}", serde_json::to_string_pretty(&hist)?);
            } else if hist.is_empty() {
                println!("No task reports with a work type in range.");
            } else {
                let mut entries: Vec<(&String, &u64)> = hist.iter().collect();
                entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                println!("Work types: {}", entries.len());
                for (label, count) in entries {
                    println!("  {label:<20} {count}");
                }
            }
        }
        ReportView::All { scope } => {
            let tasks = fetch_scope(app, &scope).await?;
            let snapshot = taskpulse::snapshot(&tasks);
            if scope.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Users: {}", snapshot.users.len());
                for u in &snapshot.users {
                    print_user_row(u);
                }
                println!("\nProjects: {}", snapshot.projects.len());
                for p in &snapshot.projects {
                    print_project_row(p);
                }
                println!("\nDaily trend: {} days", snapshot.daily.len());
                for d in &snapshot.daily {
                    println!(
                        "  {:<7} tasks: {:<4} done: {:<4} hours: {:<6.1} avg done: {}%",
                        d.label, d.total_tasks, d.completed, d.hours, d.avg_completion
                    );
                }
                println!("\nWork types: {}", snapshot.work_types.len());
                let mut entries: Vec<(&String, &u64)> = snapshot.work_types.iter().collect();
                entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (label, count) in entries {
                    println!("  {label:<20} {count}");
                }
            }
        }
    }
    Ok(())
}

fn print_user_row(u: &taskpulse::UserSummary) {
    println!(
        "  {:<10} {:<20} tasks: {:<4} ({} done, {} active, {} hold)  hours: {:<6.1} avg done: {}%  rate: {}%  projects: {}",
        u.emp_id,
        u.emp_name,
        u.total_tasks,
        u.completed,
        u.in_progress,
        u.on_hold,
        u.total_hours,
        u.avg_completion,
        u.completion_rate,
        u.num_projects,
    );
}

fn print_project_row(p: &taskpulse::ProjectSummary) {
    println!(
        "  {:<20} tasks: {:<4} ({} done, {} active, {} hold)  hours: {:<6.1} avg done: {}%  rate: {}%  users: {}  teams: {}",
        p.project_name,
        p.total_tasks,
        p.completed,
        p.in_progress,
        p.on_hold,
        p.total_hours,
        p.avg_completion,
        p.completion_rate,
        p.num_users,
        p.num_teams,
    );
}

async fn print_status(app: &TaskPulse) -> anyhow::Result<()> {
    let stats = app.stats().await?;
    println!("Warehouse Status");
    println!("  Task reports: {}", stats.task_reports);
    println!("  Users:        {}", stats.users);
    println!("  Projects:     {}", stats.projects);
    match (&stats.first_date_key, &stats.last_date_key) {
        (Some(first), Some(last)) => println!("  Date span:    {first} .. {last}"),
        _ => println!("  Date span:    empty"),
    }
    println!(
        "  Last import:  {}",
        stats.last_import_at.as_deref().unwrap_or("never")
    );
    Ok(())
}

async fn handle_config(app: &TaskPulse, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let val = app.config_get(&key).await?;
            match val {
                Some(v) => println!("{key} = {v}"),
                None => println!("{key} is not set"),
            }
        }
        ConfigAction::Set { key, value } => {
            app.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = app.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_import_report(report: &taskpulse::ImportReport) {
    println!("Import: {}", report.source);
    println!("  Status:   {:?}", report.status);
    println!("  Read:     {} records", report.records_read);
    println!("  Imported: {} records", report.records_imported);
    println!("  Skipped:  {} records", report.records_skipped);
    if let Some(ref err) = report.error {
        println!("  Error:    {err}");
    }
}
