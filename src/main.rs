use anyhow::{Context, Result};
use clap::Parser;
use humansize::{format_size, DECIMAL};
use std::future::{self, Future};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s3pull::config::{SyncConfig, DEFAULT_CONFIG_PATH};
use s3pull::error::SyncError;
use s3pull::fs::{S3Provider, S3Store};
use s3pull::sync::{SyncContext, SyncEngine, SyncOutcome, SyncReport};

/// Mirror an S3 prefix into a local directory, fetching only what changed.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Remote prefix (overrides `prefix` from the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// Local root directory (overrides `local_dir` from the config file)
    #[arg(long)]
    local_dir: Option<PathBuf>,

    /// Decide what would be downloaded without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Log skipped objects and directory markers
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    tokio::select! {
        code = run(args) => code,
        _ = wait_for_interrupt(tokio::signal::ctrl_c()) => {
            warn!("Download interrupted by user (Ctrl+C). Exiting gracefully.");
            ExitCode::from(130)
        }
    }
}

/// Resolves once `signal` fires. If the handler cannot be installed the run
/// carries on without one.
async fn wait_for_interrupt<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {}
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            future::pending::<()>().await;
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> ExitCode {
    let config = match SyncConfig::load(&args.config).map_err(SyncError::from) {
        Ok(config) => config.with_overrides(args.prefix.clone(), args.local_dir.clone()),
        Err(e) => return report_error(&e),
    };
    info!("Loaded {:?}", config);

    let engine = match build_engine(config, args.dry_run) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match engine.run().await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &SyncError) -> ExitCode {
    error!("{}", e);
    if matches!(e, SyncError::Credential { .. }) {
        error!("AWS credentials not found or invalid.");
    }
    ExitCode::from(exit_status(e))
}

/// Fatal errors exit 1. A failed listing ends the run but not in error.
fn exit_status(e: &SyncError) -> u8 {
    if e.is_fatal() {
        1
    } else {
        0
    }
}

fn build_engine(config: SyncConfig, dry_run: bool) -> Result<SyncEngine> {
    let store = S3Store::new(
        &config.bucket,
        &config.region,
        &config.access_key,
        &config.secret_key,
        S3Provider::from_endpoint(config.endpoint.as_deref()),
    )
    .context("Failed to create S3 client")?;

    let context = SyncContext::new(Arc::new(store), config.prefix, config.local_dir)
        .with_dry_run(dry_run);
    Ok(SyncEngine::new(context))
}

fn print_summary(report: &SyncReport) {
    let stats = &report.stats;

    match report.outcome() {
        SyncOutcome::NothingFound => {
            info!("No downloadable files found.");
            return;
        }
        SyncOutcome::Completed => {}
        SyncOutcome::CompletedWithFailures => {
            for failed in &report.failures {
                warn!("Failed: {} ({})", failed.key, failed.message);
            }
        }
    }

    if report.dry_run {
        info!(
            "Dry run: {} to download, {} up to date, {} failed ({} objects in {} pages)",
            stats.files_pending, stats.files_skipped, stats.files_failed, stats.files_scanned, stats.pages
        );
    } else {
        info!(
            "Done in {} ms: {} downloaded ({}), {} up to date, {} failed ({} objects in {} pages)",
            stats.duration_ms,
            stats.files_downloaded,
            format_size(stats.bytes_transferred, DECIMAL),
            stats.files_skipped,
            stats.files_failed,
            stats.files_scanned,
            stats.pages
        );
    }
}
