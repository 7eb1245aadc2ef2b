//! Zone occupancy analysis worker binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zonecount_engine::{MembershipMode, DEFAULT_OVERLAP_THRESHOLD};
use zonecount_models::AnalysisRequest;
use zonecount_worker::config::parse_membership;
use zonecount_worker::{AnalysisJob, JobExecutor, WorkerConfig};

/// Analyze pre-computed person detections against zones and counting lines.
#[derive(Parser, Debug)]
#[command(name = "zonecount-worker", version)]
struct Cli {
    /// JSON file with `zones` and `lines`
    #[arg(long, short)]
    request: PathBuf,

    /// Detection logs (JSON lines), one job per file
    #[arg(required = true)]
    detections: Vec<PathBuf>,

    /// Output directory for reports
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Maximum concurrent jobs
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Zone membership test: `centroid` or `box_overlap`
    #[arg(long)]
    membership: Option<String>,

    /// Seconds between progress log lines
    #[arg(long, default_value_t = 2)]
    poll_secs: u64,
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("zonecount=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing()?;

    info!("Starting zonecount-worker");

    let mut config = WorkerConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(n) = cli.max_jobs {
        config.max_concurrent_jobs = n.max(1);
    }
    if let Some(mode) = cli.membership.as_deref() {
        let threshold = match config.membership {
            MembershipMode::BoxOverlap { min_fraction } => min_fraction,
            MembershipMode::Centroid => DEFAULT_OVERLAP_THRESHOLD,
        };
        config.membership = parse_membership(mode, threshold)
            .with_context(|| format!("unknown membership mode '{}'", mode))?;
    }
    info!("Worker config: {:?}", config);

    let raw = std::fs::read_to_string(&cli.request)
        .with_context(|| format!("reading {}", cli.request.display()))?;
    let request: AnalysisRequest =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", cli.request.display()))?;
    request.validate().context("invalid zone or line configuration")?;

    let executor = JobExecutor::new(config);
    let handles: Vec<_> = cli
        .detections
        .into_iter()
        .map(|path| executor.submit(AnalysisJob::from_log(request.clone(), path)))
        .collect();

    let signal_executor = executor.clone();
    let shutdown_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    let registry = executor.registry().clone();
    let poll = Duration::from_secs(cli.poll_secs.max(1));
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll);
        loop {
            interval.tick().await;
            for job in registry.list().iter().filter(|j| !j.is_terminal()) {
                info!(
                    job_id = %job.job_id,
                    stage = %job.stage,
                    percent = job.percent,
                    "{}", job.message
                );
            }
        }
    });

    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(outputs)) => info!(
                json = %outputs.json.display(),
                csv = %outputs.csv.display(),
                "Report written"
            ),
            Ok(Err(e)) => {
                error!("Job failed: {}", e);
                failed += 1;
            }
            Err(e) => {
                error!("Job task aborted: {}", e);
                failed += 1;
            }
        }
    }

    reporter.abort();
    shutdown_handle.abort();

    if failed > 0 {
        bail!("{} job(s) did not complete", failed);
    }
    info!("Worker shutdown complete");
    Ok(())
}
