//! CLI entry point for the trace rollup engine.
//!
//! Provides subcommands for deriving a single case's rollup from a JSON
//! points file and for deriving a whole directory of case files concurrently.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use trace_rollup::normalize::RawPoint;
use trace_rollup::output::{RollupRow, append_record};
use trace_rollup::service::derive_case;
use trace_rollup::store::MemoryStore;

#[derive(Parser)]
#[command(name = "trace_rollup")]
#[command(about = "Derive stop/anomaly rollups from GPS case traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive one case's rollup from a JSON points file
    Derive {
        /// Path to a JSON array of raw points
        #[arg(value_name = "POINTS_FILE")]
        points: String,

        /// Case identifier used for store keys and the audit row
        #[arg(short, long, default_value = "local")]
        case_id: String,

        /// Optional CSV audit file to append the run summary to
        #[arg(short, long)]
        audit: Option<String>,
    },
    /// Derive every case file in a directory (one <case_id>.json per case)
    DeriveAll {
        /// Directory containing per-case JSON point files
        #[arg(short, long, default_value = "cases")]
        input_dir: String,

        /// Maximum number of concurrent derivations
        #[arg(short = 'n', long, default_value_t = 5)]
        concurrency: usize,

        /// Optional CSV audit file to append run summaries to
        #[arg(short, long)]
        audit: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/trace_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("trace_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Derive {
            points,
            case_id,
            audit,
        } => {
            let store = MemoryStore::new();
            store.seed_points(&case_id, load_points(&points)?);

            let outcome = derive_case(&case_id, &store, &store).await?;

            if let (Some(path), Some(rollup)) = (&audit, &outcome.rollup) {
                append_record(path, &RollupRow::from_rollup(&case_id, rollup))?;
            }

            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::DeriveAll {
            input_dir,
            concurrency,
            audit,
        } => {
            derive_all(&input_dir, concurrency, audit).await?;
        }
    }

    Ok(())
}

/// Reads a JSON array of raw points from disk.
fn load_points(path: &str) -> Result<Vec<RawPoint>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading points file {path}"))?;
    let points = serde_json::from_str(&content)
        .with_context(|| format!("parsing points file {path}"))?;
    Ok(points)
}

/// Derives every `<case_id>.json` file under `input_dir`, bounded by a
/// semaphore to `concurrency` tasks at a time.
#[tracing::instrument(skip(audit), fields(input_dir, concurrency))]
async fn derive_all(input_dir: &str, concurrency: usize, audit: Option<String>) -> Result<()> {
    let mut case_files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            case_files.push((stem.to_string(), path));
        }
    }

    info!(case_count = case_files.len(), "Case files ready for derivation");

    let store = Arc::new(MemoryStore::new());
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));
    let mut tasks = vec![];

    for (case_id, path) in case_files {
        let sem = semaphore.clone();
        let store = store.clone();
        let audit = audit.clone();

        let case_span = tracing::info_span!("derive_case_file", case_id = %case_id);

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire().await.unwrap();

                let points = match load_points(path.to_str().unwrap_or_default()) {
                    Ok(points) => points,
                    Err(e) => {
                        error!(error = %e, "Failed to load case file");
                        return;
                    }
                };
                store.seed_points(&case_id, points);

                match derive_case(&case_id, store.as_ref(), store.as_ref()).await {
                    Ok(outcome) => {
                        if !outcome.success {
                            info!(message = outcome.message.as_deref(), "Case skipped");
                            return;
                        }
                        if let (Some(path), Some(rollup)) = (&audit, &outcome.rollup) {
                            if let Err(e) =
                                append_record(path, &RollupRow::from_rollup(&case_id, rollup))
                            {
                                error!(error = %e, "Failed to append audit row");
                            }
                        }
                        info!("Case derived successfully");
                    }
                    Err(e) => {
                        error!(error = %e, "Derivation failed");
                    }
                }
            }
            .instrument(case_span),
        );

        tasks.push(task);
    }

    // Wait for all tasks to complete
    for task in tasks {
        let _ = task.await;
    }

    info!(input_dir, "Finished deriving all cases");
    Ok(())
}
