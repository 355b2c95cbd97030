//! Nayvote - flags referenda whose text asks voters to reject them.
//!
//! Subcommands:
//! - `classify`: judge a single title/content pair
//! - `process-json`: export saved referendum files to CSV

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use nayvote_app::batch::{process_json_files, BatchConfig, Network, DEFAULT_CONTENT_LIMIT};
use nayvote_core::NayDetector;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Nayvote - detect referenda that request a nay vote
#[derive(Parser, Debug)]
#[command(name = "nayvote", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write logs to a daily rotating file in the data directory
    #[arg(long, global = true)]
    log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a single referendum
    Classify {
        /// Referendum title
        #[arg(long)]
        title: String,

        /// Referendum body as plain text
        #[arg(long, default_value = "")]
        content: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export saved referendum JSON files to CSV
    ProcessJson {
        /// Network to process
        #[arg(long, value_enum, default_value_t = Network::Polkadot)]
        network: Network,

        /// Directory containing referendum_<id>.json files
        /// (default: <output>/<network>/json)
        #[arg(long)]
        json_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "referendum_data")]
        output: PathBuf,

        /// Content characters kept per referendum
        #[arg(long, default_value_t = DEFAULT_CONTENT_LIMIT)]
        content_limit: usize,
    },
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "nayvote", "Nayvote").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging. Console output goes to stderr so stdout stays clean
/// for `--json`.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nayvote={},warn", log_level)));

    if args.log_file {
        if let Some(log_dir) = logs_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(5)
                    .filename_prefix("nayvote")
                    .filename_suffix("log")
                    .build(&log_dir)
                    .ok();

                if let Some(appender) = file_appender {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();

                    tracing::info!("Logging to {:?}", log_dir);
                    return Some(guard);
                }
            }
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        tracing::warn!("File logging unavailable, using console only");
        return None;
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    None
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args);

    let detector = NayDetector::new().context("failed to compile rule tables")?;

    match args.command {
        Command::Classify {
            title,
            content,
            json,
        } => {
            let outcome = detector.detect(&title, &content);
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("is_nay_request: {}", outcome.is_nay_request);
                println!("confidence:     {}", outcome.confidence);
                println!("explanation:    {}", outcome.explanation);
            }
        }
        Command::ProcessJson {
            network,
            json_dir,
            output,
            content_limit,
        } => {
            let config = BatchConfig {
                network,
                json_dir,
                output_dir: output,
                content_limit,
            };
            tracing::info!("Processing existing JSON files for {}...", network);

            let summary = process_json_files(&config, &detector)
                .with_context(|| format!("failed to process {} referenda", network))?;
            tracing::info!(
                written = summary.rows_written,
                skipped = summary.skipped_existing,
                invalid = summary.skipped_invalid_name,
                failed = summary.failed,
                "Export complete"
            );
        }
    }

    Ok(())
}
