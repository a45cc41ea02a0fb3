use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use core_runtime::{config::RuntimeConfig, logging::init_logging};
use core_service::{bootstrap, CoreService, DrainReport, QueueWorker};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "transferless")]
#[command(about = "Incremental file transfers between storage remotes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Put every job of the job list on the job queue
    Schedule,
    /// Compile jobs from the job queue into transfers
    Compile(WorkerArgs),
    /// Copy transferred files to their targets
    Synchronize(WorkerArgs),
}

#[derive(Args, Debug)]
struct WorkerArgs {
    /// Drain the queue until it is empty, then exit
    #[arg(long)]
    once: bool,
    /// Messages received per drain (overrides TRANSFERLESS_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Messages handled in parallel (overrides TRANSFERLESS_WORKER_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,
    /// Deliveries after which a failing message is dropped
    #[arg(long)]
    max_deliveries: Option<u32>,
    /// Seconds to wait after finding the queue empty
    #[arg(long)]
    poll_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RuntimeConfig::from_env().context("invalid configuration")?;
    init_logging(config.logging_config()).context("failed to initialize logging")?;

    let service = bootstrap(config).await?;

    match cli.cmd {
        Cmd::Schedule => {
            let report = service.schedule().await?;
            info!(
                scheduled = report.scheduled.len(),
                failed = report.failed.len(),
                "Schedule finished"
            );
            if !report.failed.is_empty() {
                anyhow::bail!("failed to schedule {}", report.failed.join(", "));
            }
        }
        Cmd::Compile(args) => {
            let service = apply_overrides(service, &args)?;
            let worker = service.compile_worker()?;
            drive(worker, args.once).await?;
        }
        Cmd::Synchronize(args) => {
            let service = apply_overrides(service, &args)?;
            drive(service.synchronize_worker(), args.once).await?;
        }
    }

    Ok(())
}

fn apply_overrides(service: CoreService, args: &WorkerArgs) -> anyhow::Result<CoreService> {
    let mut worker = service.worker_config().clone();
    if let Some(batch_size) = args.batch_size {
        worker.batch_size = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        worker.concurrency = concurrency;
    }
    if let Some(max_deliveries) = args.max_deliveries {
        worker.max_deliveries = max_deliveries;
    }
    if let Some(secs) = args.poll_interval_secs {
        worker.poll_interval = Duration::from_secs(secs);
    }

    if worker.batch_size == 0 || worker.concurrency == 0 || worker.max_deliveries == 0 {
        anyhow::bail!("batch size, concurrency and max deliveries must be at least 1");
    }
    Ok(service.with_worker_config(worker))
}

async fn drive(worker: QueueWorker, once: bool) -> anyhow::Result<DrainReport> {
    let report = if once {
        worker.drain_until_empty().await?
    } else {
        worker
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
                info!("Shutdown requested");
            })
            .await?
    };

    info!(
        queue = worker.queue_name(),
        received = report.received,
        succeeded = report.succeeded,
        released = report.released,
        dropped = report.dropped,
        unsettled = report.unsettled,
        "Worker finished"
    );
    Ok(report)
}
