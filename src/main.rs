//! Finboard main entry point

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use finboard_client::{fetch_all, ApiClient};
use finboard_config::{Config, ConfigError, SortDirection};
use finboard_core::pivot::{by_budget_item, by_category, by_description, per_record};
use finboard_core::time::parse_date;
use finboard_core::{
    export_pivot_csv, CalendarMonth, CoreError, DateRange, DefaultErrorLogger, ErrorContext,
    ErrorLogger, ExportOptions, FetchStatus, FilterState, PagedFetcher, PivotTable, Session,
    SessionContext, SortSpec, TransactionRecord,
};
use finboard_utils::{format_amount, NumberFormat};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;

const DEFAULT_SESSION_PATH: &str = ".finboard/session.json";

#[derive(Parser, Debug)]
#[command(name = "finboard")]
#[command(version)]
#[command(about = "Terminal client for the finance-tracking dashboard", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "finboard.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of transactions
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
        /// Free-text search
        #[arg(long)]
        q: Option<String>,
        /// Category filter, repeatable
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Sort field
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, conflicts_with = "asc")]
        desc: bool,
        #[arg(long)]
        asc: bool,
    },
    /// Print the day-by-day grid of a month
    Pivot {
        /// Month (YYYY-MM)
        #[arg(long)]
        month: CalendarMonth,
        #[arg(long, value_enum, default_value_t = GroupBy::Budget)]
        by: GroupBy,
        #[arg(long, value_enum, default_value_t = ItemRows::Record)]
        items: ItemRows,
    },
    /// Write the day-by-day grid of a month as CSV
    Export {
        /// Month (YYYY-MM)
        #[arg(long)]
        month: CalendarMonth,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = GroupBy::Budget)]
        by: GroupBy,
        #[arg(long, value_enum, default_value_t = ItemRows::Record)]
        items: ItemRows,
    },
    /// Store an access token for later requests
    Login {
        #[arg(long)]
        token: String,
        #[arg(long, default_value = "user")]
        user: String,
        #[arg(long, default_value_t = 0)]
        user_id: i64,
    },
    /// Forget the stored access token
    Logout,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupBy {
    Budget,
    Category,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ItemRows {
    /// One row per record
    Record,
    /// One row per distinct description
    Description,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

fn runtime() -> anyhow::Result<Runtime> {
    Runtime::new().context("failed to start the async runtime")
}

fn run(args: Args) -> anyhow::Result<()> {
    let loaded = Config::load_optional(&args.config);

    // A broken config file still gets logged at the default level
    let level = match &loaded {
        Ok(Some(config)) => config.logging.level.clone(),
        _ => Config::default().logging.level,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match loaded.with_context(|| format!("failed to load {}", args.config.display()))? {
        Some(config) => {
            log::debug!("config loaded from {}", args.config.display());
            config
        }
        None => {
            log::info!("No config file at {}, using defaults", args.config.display());
            Config::default()
        }
    };

    let session_path = config
        .session
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));
    let session = SessionContext::persistent(&session_path)
        .with_context(|| format!("failed to restore session from {}", session_path.display()))?;

    match args.command {
        Command::Login { token, user, user_id } => {
            session.login(Session {
                user_id,
                username: user,
                token,
                role: None,
            })?;
            println!("Logged in. Session stored in {}", session_path.display());
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out.");
        }
        Command::List {
            page,
            per_page,
            q,
            categories,
            from,
            to,
            sort,
            desc,
            asc,
        } => {
            let today = Local::now().date_naive();
            let mut filters = FilterState::from_config(&config, today);
            if let (Some(from), Some(to)) = (from, to) {
                filters.date_range = DateRange::new(parse_date(&from)?, parse_date(&to)?);
            }
            filters.search_text = q.unwrap_or_default();
            filters.categories = categories.into_iter().collect();
            let direction = if asc {
                SortDirection::Asc
            } else if desc {
                SortDirection::Desc
            } else {
                filters.sort.direction
            };
            filters.sort = SortSpec::new(sort.unwrap_or_else(|| filters.sort.field.clone()), direction);
            filters.page_size = per_page.unwrap_or(filters.page_size).max(1);
            filters.current_page = page.max(1);

            runtime()?.block_on(list(&config, session, filters))?;
        }
        Command::Pivot { month, by, items } => {
            let records = runtime()?.block_on(fetch_month(&config, session, month))?;
            let table = build_table(&records, month, by, items);
            print_table(&table, &number_format(&config));
        }
        Command::Export {
            month,
            output,
            by,
            items,
        } => {
            let records = runtime()?.block_on(fetch_month(&config, session, month))?;
            let table = build_table(&records, month, by, items);
            write_csv(&table, &output, &config)?;
            println!("Wrote {} groups to {}", table.groups.len(), output.display());
        }
    }

    Ok(())
}

fn number_format(config: &Config) -> NumberFormat {
    NumberFormat {
        decimal_places: config.currency.decimal_places,
        thousands_separator: config.currency.thousands_separator.clone(),
        decimal_separator: config.currency.decimal_separator.clone(),
    }
}

fn require_login(session: &SessionContext) -> anyhow::Result<()> {
    if !session.is_authenticated() {
        return Err(CoreError::Session {
            message: "not logged in".to_string(),
        }
        .into());
    }
    Ok(())
}

async fn list(config: &Config, session: SessionContext, filters: FilterState) -> anyhow::Result<()> {
    require_login(&session)?;
    let client = ApiClient::from_config(config, session)?;
    let endpoint = Arc::new(client.endpoint(&config.backend.transactions_path));

    let mut fetcher = PagedFetcher::new(endpoint, filters);
    fetcher.load();
    fetcher.settle().await;

    let state = fetcher.snapshot();
    if let FetchStatus::Failure(error) = &state.status {
        return Err(anyhow::Error::new(CoreError::Fetch(error.clone())).context(error.user_message()));
    }

    let format = number_format(config);
    for record in &state.result.rows {
        println!(
            "{:>8}  {}  {:>14} {}  {:<16} {:<16} {}",
            record.id,
            record.date,
            format_amount(record.amount, &format),
            record.currency,
            record.category,
            record.budget_item_name,
            record.description
        );
    }
    let per_page = fetcher.filters().page_size;
    println!(
        "Page {} of {} ({} records)",
        state.result.pagination.current_page,
        state.result.pagination.total_pages(per_page).max(1),
        state.result.pagination.total_items
    );
    Ok(())
}

async fn fetch_month(
    config: &Config,
    session: SessionContext,
    month: CalendarMonth,
) -> anyhow::Result<Vec<TransactionRecord>> {
    require_login(&session)?;
    let client = ApiClient::from_config(config, session)?;
    let endpoint = client.endpoint(&config.backend.transactions_path);

    let mut filters = FilterState::from_config(config, month.first_day());
    filters.date_range = DateRange::for_month(month);
    let records = fetch_all(&endpoint, &filters.to_query())
        .await
        .map_err(CoreError::from)
        .with_context(|| format!("failed to fetch transactions for {}", month))?;
    log::info!("fetched {} records for {}", records.len(), month);
    Ok(records)
}

fn build_table(
    records: &[TransactionRecord],
    month: CalendarMonth,
    by: GroupBy,
    items: ItemRows,
) -> PivotTable {
    match (by, items) {
        (GroupBy::Budget, ItemRows::Record) => PivotTable::build(records, month, by_budget_item, per_record),
        (GroupBy::Budget, ItemRows::Description) => PivotTable::build(records, month, by_budget_item, by_description),
        (GroupBy::Category, ItemRows::Record) => PivotTable::build(records, month, by_category, per_record),
        (GroupBy::Category, ItemRows::Description) => PivotTable::build(records, month, by_category, by_description),
    }
}

fn print_table(table: &PivotTable, format: &NumberFormat) {
    if table.is_empty() {
        println!("No records in {}", table.month);
        return;
    }

    let days = table.active_days();
    let cell = |amount: Decimal| format!("{:>12}", format_amount(amount, format));

    let mut header = format!("{:<32}", table.month.to_string());
    for day in &days {
        header.push_str(&format!("{:>12}", day));
    }
    header.push_str(&format!("{:>14}", "Total"));
    println!("{}", header);

    for group in &table.groups {
        let mut line = format!("{:<32}", truncate(&group.label, 32));
        for day in &days {
            line.push_str(&cell(group.totals_by_day[day]));
        }
        line.push_str(&format!("  {}", cell(group.total)));
        println!("{}", line);

        for child in &group.children {
            let mut line = format!("  {:<30}", truncate(&child.description, 30));
            for day in &days {
                line.push_str(&cell(child.amounts_by_day[day]));
            }
            line.push_str(&format!("  {}", cell(child.total)));
            println!("{}", line);
        }
    }

    let mut footer = format!("{:<32}", "Total");
    for day in &days {
        footer.push_str(&cell(table.totals_by_day[day]));
    }
    footer.push_str(&format!("  {}", cell(table.grand_total)));
    println!("{}", footer);
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn write_csv(table: &PivotTable, output: &Path, config: &Config) -> anyhow::Result<()> {
    let options = ExportOptions {
        decimal_places: config.currency.decimal_places,
        ..ExportOptions::default()
    };
    export_pivot_csv(table, output, &options)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

/// Render a failure for the terminal, with details and suggestions when
/// the cause is one of the workspace error types
fn report(error: &anyhow::Error) -> String {
    for (depth, cause) in error.chain().enumerate() {
        let details = if let Some(core) = cause.downcast_ref::<CoreError>() {
            DefaultErrorLogger.log_error(core, &ErrorContext::new(error.to_string()));
            core.to_details().to_string()
        } else if let Some(config) = cause.downcast_ref::<ConfigError>() {
            log::error!(
                target: "finboard::config",
                "[{}] {} ({})",
                config.code(),
                config,
                config.severity()
            );
            config.to_details().to_string()
        } else {
            continue;
        };

        return if depth == 0 {
            details
        } else {
            format!("{}\n{}", error, details)
        };
    }
    format!("{:#}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_shows_core_error_suggestions() {
        let error = anyhow::Error::new(CoreError::InvalidMonth {
            value: "2025-13".to_string(),
        })
        .context("bad --month");
        let text = report(&error);

        assert!(text.starts_with("bad --month\n"));
        assert!(text.contains("[INVALID_MONTH]"));
        assert!(text.contains("YYYY-MM"));
    }

    #[test]
    fn test_report_shows_config_field() {
        let error = anyhow::Error::new(ConfigError::InvalidValue {
            field: "backend.timeout_secs".to_string(),
            reason: "Timeout must be greater than 0".to_string(),
        });
        let text = report(&error);

        assert!(text.starts_with("[INVALID_VALUE]"));
        assert!(text.contains("Field: backend.timeout_secs"));
    }

    #[test]
    fn test_report_for_fetch_failure_suggests_checking_backend() {
        let error = anyhow::Error::new(CoreError::from(finboard_core::FetchError::network("refused")))
            .context("failed to fetch transactions for 2025-07");
        let text = report(&error);

        assert!(text.contains("[NETWORK_ERROR]"));
        assert!(text.contains("backend.base_url"));
    }

    #[test]
    fn test_report_falls_back_to_chain() {
        let error = anyhow::anyhow!("disk full").context("failed to write out.csv");
        assert_eq!(report(&error), "failed to write out.csv: disk full");
    }

    #[test]
    fn test_config_flag_default() {
        let args = Args::parse_from(["finboard", "logout"]);
        assert_eq!(args.config, PathBuf::from("finboard.yaml"));
    }
}
