//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `country_backfill` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::process;

use country_backfill::config::{Cli, Command, HistoryArgs};
use country_backfill::initialization::init_logger_with;
use country_backfill::{query_run_history, run_reconcile, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), either in the
    // current directory or next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Reconcile(args) => {
            let config = Config::from(args);
            init_logger_with(config.log_level.clone().into(), config.log_format.clone())
                .context("Failed to initialize logger")?;

            match run_reconcile(config).await {
                Ok(report) => {
                    println!(
                        "Country codes updated for {}: {} of {} row{} ({} without a matching range, {} invalid) in {:.1}s",
                        report.window,
                        report.updated,
                        report.candidates,
                        if report.candidates == 1 { "" } else { "s" },
                        report.unmatched,
                        report.invalid,
                        report.elapsed_seconds
                    );
                    if report.ambiguous > 0 {
                        println!(
                            "{} address(es) matched overlapping ranges - check country_code_lookups",
                            report.ambiguous
                        );
                    }
                    println!("Run {} recorded in {}", report.run_id, report.db_path.display());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("country_backfill error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Command::History(args) => {
            if let Err(e) = print_history(args).await {
                eprintln!("country_backfill error: {:#}", e);
                process::exit(1);
            }
            Ok(())
        }
    }
}

async fn print_history(args: HistoryArgs) -> Result<()> {
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", args.db_path.display()))
        .await
        .with_context(|| format!("Failed to open {}", args.db_path.display()))?;
    let runs = query_run_history(&pool, Some(args.limit))
        .await
        .context("Failed to query run history")?;

    if runs.is_empty() {
        println!("No reconcile runs recorded in {}", args.db_path.display());
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {} -> {}  {:<9}  {} candidates, {} updated, {} unmatched, {} invalid, {} ambiguous, {} stale{}",
            run.run_id,
            format_ms(run.window_start_ms),
            format_ms(run.window_end_ms),
            run.outcome,
            run.candidates,
            run.updated,
            run.unmatched,
            run.invalid,
            run.ambiguous,
            run.stale,
            run.error.map(|e| format!("  ({e})")).unwrap_or_default()
        );
    }
    Ok(())
}

fn format_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}
