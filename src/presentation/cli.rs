use crate::{
    application::{
        count_task_state::use_case::CountTaskStateUseCase,
        task_history::{
            dto::{DEFAULT_HISTORY_DAYS, DailyTotals, HistoryQuery},
            use_case::TaskHistoryUseCase,
        },
    },
    config::Config,
    domain::{
        shared::date_key::DateKey,
        task_state::{entity::TaskStateCount, grouping::GroupingStrategy},
    },
    infrastructure::{
        database::connection::with_connection,
        repositories::sqlx_task_state_repository::SqlxTaskStateRepository,
    },
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "task-state-snapshot")]
#[command(about = "Store daily per-status task counts")]
#[command(version)]
pub struct Cli {
    /// Defaults to `snapshot` for today
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Count tasks by status and replace the day's snapshot
    Snapshot {
        /// Snapshot key as YYYYMMDD (default: today, local time)
        #[arg(long, value_parser = DateKey::parse)]
        date: Option<DateKey>,
        /// `global` or `system_employee` (default: TASK_COUNT_GROUPING)
        #[arg(long)]
        grouping: Option<GroupingStrategy>,
        /// Print stored rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-day totals from stored snapshots
    History {
        /// Number of most recent days to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
        #[arg(long)]
        sys_name: Option<String>,
        #[arg(long)]
        employee: Option<String>,
        /// Print totals as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Snapshot {
            date: None,
            grouping: None,
            json: false,
        }
    }
}

/// Dispatch a parsed command. Each command opens and closes its own connection.
pub async fn run(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Snapshot {
            date,
            grouping,
            json,
        } => {
            let date = date.unwrap_or_else(DateKey::today);
            let grouping = grouping.unwrap_or(config.grouping);
            let rows = handle_snapshot(config, date, grouping).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            Ok(())
        }
        Commands::History {
            days,
            sys_name,
            employee,
            json,
        } => {
            let totals = handle_history(
                config,
                HistoryQuery {
                    days,
                    sys_name,
                    employee,
                },
            )
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                print_history(&totals);
            }
            Ok(())
        }
    }
}

pub async fn handle_snapshot(
    config: &Config,
    date: DateKey,
    grouping: GroupingStrategy,
) -> anyhow::Result<Vec<TaskStateCount>> {
    tracing::info!(datestr = %date, %grouping, "Counting task states");
    let rows = with_connection(&config.database, async |conn, driver| {
        let repository = SqlxTaskStateRepository::new(conn, driver);
        CountTaskStateUseCase::new(Box::new(repository), grouping)
            .execute(date)
            .await
    })
    .await?;
    Ok(rows)
}

pub async fn handle_history(
    config: &Config,
    query: HistoryQuery,
) -> anyhow::Result<Vec<DailyTotals>> {
    let totals = with_connection(&config.database, async |conn, driver| {
        let repository = SqlxTaskStateRepository::new(conn, driver);
        TaskHistoryUseCase::new(Box::new(repository))
            .execute(query)
            .await
    })
    .await?;
    Ok(totals)
}

fn print_history(totals: &[DailyTotals]) {
    println!(
        "{:<10} {:>7} {:>10} {:>11} {:>10} {:>7} {:>10} {:>8} {:>6}",
        "date",
        "total",
        "unfinished",
        "not_started",
        "developing",
        "testing",
        "releasable",
        "finished",
        "closed"
    );
    for day in totals {
        let c = &day.counts;
        println!(
            "{:<10} {:>7} {:>10} {:>11} {:>10} {:>7} {:>10} {:>8} {:>6}",
            day.datestr,
            c.total,
            c.unfinished,
            c.not_started,
            c.developing,
            c.testing,
            c.releasable,
            c.finished,
            c.closed
        );
    }
}
