//! EZPass Report CLI Application
//!
//! Command-line front end for the ezpass-report library. It adds:
//! - Argument parsing and validation (credentials, report date range)
//! - Optional TOML configuration file
//! - Logging setup
//! - Exit status reflecting failed reports

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, ValueEnum};
use ezpass_report::{
    Credentials, HttpClient, Orchestrator, OutputOrder, ReportKind, ReportRequest, RunSummary,
    StdoutSink,
};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

mod config;

use config::{AppConfig, Overrides};

/// EZPass Report - Print transponders, vehicles and transactions for a toll account
#[derive(Parser, Debug)]
#[command(name = "ezpass-report")]
#[command(about = "Print toll account reports as text tables", long_about = None)]
#[command(version)]
struct Args {
    /// Account username
    #[arg(short, long, env = "EZPASS_USERNAME")]
    username: String,

    /// Account password
    #[arg(short, long, env = "EZPASS_PASSWORD", hide_env_values = true)]
    password: String,

    /// Report start date in YYYYMMDD format
    #[arg(long, value_name = "YYYYMMDD", value_parser = parse_date)]
    start_date: NaiveDate,

    /// Report end date in YYYYMMDD format
    #[arg(long, value_name = "YYYYMMDD", value_parser = parse_date)]
    end_date: NaiveDate,

    /// Base URL of the account API
    #[arg(long, value_name = "URL", env = "EZPASS_BASE_URL")]
    base_url: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Order in which tables are printed
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Print each table as soon as its report arrives
    Completion,
    /// Print Transponders, Vehicles, Transactions in that order (default)
    Fixed,
}

impl From<OrderArg> for OutputOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Completion => OutputOrder::Completion,
            OrderArg::Fixed => OutputOrder::Fixed,
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    ReportRequest::parse_date(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("EZPass Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using report library v{}", ezpass_report::VERSION);

    // An inverted range is a usage error, reported before any network activity
    let request = match ReportRequest::new(args.start_date, args.end_date) {
        Ok(request) => request,
        Err(e) => Args::command()
            .error(clap::error::ErrorKind::ValueValidation, e.to_string())
            .exit(),
    };

    let config = load_app_config(&args)?;
    let base_url = config.base_url()?;
    log::debug!("Account API: {}", base_url);

    let client = HttpClient::new(base_url, config.account.request_timeout())
        .context("Failed to create HTTP client")?;
    let orchestrator = Orchestrator::new(client.clone(), client, config.fetch.clone());

    let credentials = Credentials::new(args.username.as_str(), args.password.as_str());
    let summary = orchestrator
        .run(&credentials, &request, Arc::new(StdoutSink))
        .context("Report run aborted before any report was fetched")?;

    // The library only logs failures at debug level; this is where the user sees them
    let failures = failure_messages(&summary);
    for message in &failures {
        eprintln!("{}", message);
    }
    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} reports failed",
            failures.len(),
            ReportKind::ALL.len()
        );
    }

    Ok(())
}

/// One line per failed report
fn failure_messages(summary: &RunSummary) -> Vec<String> {
    summary
        .failures()
        .map(|(kind, error)| format!("{} report failed: {}", kind, error))
        .collect()
}

/// Load the config file (if any) and apply command-line overrides
fn load_app_config(args: &Args) -> Result<AppConfig> {
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    Ok(config.merge(Overrides {
        base_url: args.base_url.clone(),
        output_order: args.order.map(OutputOrder::from),
    }))
}

/// Log level for the -v / -q flags
fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Initialize logging on stderr; RUST_LOG, when set, refines the flag level
fn init_logging(verbose: u8, quiet: bool) {
    use std::io::Write;

    env_logger::Builder::new()
        .filter_level(log_level(verbose, quiet))
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [&str; 9] = [
        "ezpass-report",
        "-u",
        "driver",
        "-p",
        "secret",
        "--start-date",
        "20240101",
        "--end-date",
        "20240131",
    ];

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_required_arguments() {
        let args = Args::try_parse_from(BASE).unwrap();
        assert_eq!(args.username, "driver");
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(args.end_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(args.order, None);
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let mut argv = BASE.to_vec();
        argv[6] = "2024-01-01";
        let err = Args::try_parse_from(argv).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_missing_dates_are_rejected() {
        let err = Args::try_parse_from(&BASE[..5]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(log_level(0, false), LevelFilter::Info);
        assert_eq!(log_level(1, false), LevelFilter::Debug);
        assert_eq!(log_level(3, false), LevelFilter::Trace);
        assert_eq!(log_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_one_message_per_failed_report() {
        use ezpass_report::{ReportError, ReportOutcome};
        use std::time::Duration;

        let summary: RunSummary = vec![
            ReportOutcome { kind: ReportKind::Transponders, result: Ok(1) },
            ReportOutcome {
                kind: ReportKind::Vehicles,
                result: Err(ReportError::Fetch {
                    kind: ReportKind::Vehicles,
                    message: "server returned status 500".to_string(),
                }),
            },
            ReportOutcome {
                kind: ReportKind::Transactions,
                result: Err(ReportError::TimedOut {
                    kind: ReportKind::Transactions,
                    timeout: Duration::from_millis(50),
                }),
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(
            failure_messages(&summary),
            vec![
                "Vehicles report failed: Failed to fetch Vehicles: server returned status 500"
                    .to_string(),
                "Transactions report failed: Transactions report did not finish within 50ms"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_no_messages_when_every_report_succeeds() {
        use ezpass_report::ReportOutcome;

        let summary: RunSummary = ReportKind::ALL
            .into_iter()
            .map(|kind| ReportOutcome { kind, result: Ok(0) })
            .collect();
        assert!(failure_messages(&summary).is_empty());
    }

    #[test]
    fn test_order_override_reaches_config() {
        let mut argv = BASE.to_vec();
        argv.extend(["--order", "fixed", "--base-url", "https://tolls.example.com"]);
        let args = Args::try_parse_from(argv).unwrap();

        let config = load_app_config(&args).unwrap();
        assert_eq!(config.fetch.output_order, OutputOrder::Fixed);
        assert_eq!(config.base_url().unwrap(), "https://tolls.example.com");
    }
}
