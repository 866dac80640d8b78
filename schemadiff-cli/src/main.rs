//! CLI entry point for the schemadiff tool.
//!
//! Thin glue around schemadiff-core: argument parsing, logging setup, driver
//! selection, Ctrl-C wiring, error printing, and exit codes. The diff itself
//! goes to stdout terminated by a newline; errors go to stderr.

use std::process;

use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use schemadiff_core::{Result, SchemaDiffError, SqliteDriver};

/// Compare two database schemas and generate a migration script.
///
/// The script, applied to the target database, reshapes its schema to match
/// the source while preserving row data where possible.
#[derive(Parser)]
#[command(
    name = "schemadiff",
    about = "Compare database schemas and generate migration scripts",
    version
)]
struct Cli {
    /// Database driver to use. Supported drivers: sqlite3
    #[arg(long, value_name = "NAME", default_value = "sqlite3")]
    driver: String,

    /// Connection URL or path for the source database
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Connection URL or path for the target database
    #[arg(value_name = "TARGET")]
    target: String,

    /// Output the result as JSON
    #[arg(long)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose/debug output
    #[arg(short, long)]
    verbose: bool,
}

/// Shape of the --json report.
#[derive(Serialize)]
struct DiffReport<'a> {
    driver: &'a str,
    diff: &'a str,
    has_changes: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging (suppressed when JSON output is requested)
    let filter = if cli.json || cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&e);
        process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling diff");
            interrupt.cancel();
        }
    });

    let diff = match cli.driver.as_str() {
        "sqlite3" => {
            let driver = SqliteDriver::open(&cli.source, &cli.target)?;
            // Close even when the diff fails; the connections are released on
            // every exit path.
            let diff = driver.diff(&cancel);
            driver.close()?;
            diff?
        }
        other => return Err(SchemaDiffError::UnsupportedDriver(other.to_string())),
    };

    if cli.json {
        let report = DiffReport {
            driver: &cli.driver,
            diff: &diff,
            has_changes: !diff.is_empty(),
        };
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        println!("{}", diff);
    }
    Ok(())
}

/// Map error types to differentiated exit codes.
fn exit_code(error: &SchemaDiffError) -> i32 {
    match error {
        SchemaDiffError::UnsupportedDriver(_) => 2,
        SchemaDiffError::ConnectionFailed { .. }
        | SchemaDiffError::DatabaseError(_)
        | SchemaDiffError::SqliteError(_) => 4,
        SchemaDiffError::Cancelled => 130,
        _ => 1,
    }
}

/// Print a formatted error message with actionable hints to stderr.
fn print_error(error: &SchemaDiffError) {
    eprintln!("{} {}", "ERROR:".red().bold(), error);

    match error {
        SchemaDiffError::ConnectionFailed { .. } => {
            eprintln!(
                "{}",
                "Hint: Verify the database exists and the path or URL is correct.".dimmed()
            );
        }
        SchemaDiffError::UnsupportedDriver(_) => {
            eprintln!(
                "{}",
                "Hint: Omit --driver or pass --driver sqlite3.".dimmed()
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(&SchemaDiffError::UnsupportedDriver("x".into())), 2);
        assert_eq!(
            exit_code(&SchemaDiffError::ConnectionFailed {
                descriptor: "db".into(),
                reason: "gone".into(),
            }),
            4
        );
        assert_eq!(exit_code(&SchemaDiffError::Cancelled), 130);
        assert_eq!(exit_code(&SchemaDiffError::Internal("bug".into())), 1);
    }

    #[test]
    fn test_cli_requires_positionals() {
        use clap::CommandFactory;
        let result = Cli::command().try_get_matches_from(["schemadiff", "source.db"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_driver_defaults_to_sqlite3() {
        let cli = Cli::parse_from(["schemadiff", "a.db", "b.db"]);
        assert_eq!(cli.driver, "sqlite3");
    }
}
