use std::sync::Arc;
use std::time::Duration;

use eyre::eyre;
use tokio::sync::RwLock;
use tracing::{error, info};

use warden::api::{self, SharedStats, WardenStats};
use warden::config::Config;
use warden::driver::RelayDriver;
use warden::metrics;
use warden::types::{ChainRole, PassReport};

fn main() -> eyre::Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;

    // Run the async main
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    let args = parse_args(std::env::args().skip(1))?;

    info!(chain = %args.role, watch = args.watch, "Starting bridge warden");

    let config = Config::load()?;
    info!(
        source_chain_id = config.source.chain_id,
        destination_chain_id = config.destination.chain_id,
        scan_window = config.relay.scan_window,
        "Configuration loaded"
    );

    let driver = RelayDriver::from_config(&config)?;

    if args.watch {
        run_watch_loop(driver, args.role, &config).await
    } else {
        run_once(driver, args.role).await
    }
}

/// Command line arguments: the origin role to scan, plus watch mode.
struct CliArgs {
    role: ChainRole,
    watch: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> eyre::Result<CliArgs> {
    let mut role = None;
    let mut watch = false;

    for arg in args {
        match arg.as_str() {
            "--watch" => watch = true,
            other => {
                if role.is_some() {
                    return Err(eyre!("Unexpected argument '{}'", other));
                }
                role = Some(other.parse::<ChainRole>()?);
            }
        }
    }

    let role = role.ok_or_else(|| eyre!("Usage: bridge-warden <source|destination> [--watch]"))?;
    Ok(CliArgs { role, watch })
}

/// Run a single scan-and-relay pass and exit.
async fn run_once(mut driver: RelayDriver, role: ChainRole) -> eyre::Result<()> {
    let report = driver.run(role).await?;
    info!(
        chain = %role,
        relayed = report.relayed_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "Single pass finished"
    );
    Ok(())
}

/// Run passes on an interval until a shutdown signal arrives.
///
/// A failed pass is logged and the loop keeps going; transient RPC
/// problems should not take the process down.
async fn run_watch_loop(
    mut driver: RelayDriver,
    role: ChainRole,
    config: &Config,
) -> eyre::Result<()> {
    let stats: SharedStats = Arc::new(RwLock::new(WardenStats::new(role)));

    // Start the status/metrics server
    let metrics_addr = config.metrics_addr.clone();
    let server_stats = stats.clone();
    tokio::spawn(async move {
        if let Err(e) = api::start_server(&metrics_addr, server_stats).await {
            error!(error = %e, "Status server error");
        }
    });

    // Setup signal handlers
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    metrics::set_up(true);
    let poll_interval = Duration::from_millis(config.relay.poll_interval_ms);
    info!(
        chain = %role,
        poll_interval_ms = config.relay.poll_interval_ms,
        "Watch mode started"
    );

    loop {
        match driver.run(role).await {
            Ok(report) => update_stats(&stats, &report).await,
            Err(e) => error!(chain = %role, error = %e, "Pass failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested, stopping watch loop");
                break;
            }
        }
    }

    metrics::set_up(false);
    info!("Bridge warden stopped");
    Ok(())
}

async fn update_stats(stats: &SharedStats, report: &PassReport) {
    let mut stats = stats.write().await;
    stats.passes_completed += 1;
    stats.events_relayed += report.relayed_count() as u64;
    stats.events_skipped += report.skipped_count() as u64;
    stats.events_failed += report.failed_count() as u64;
    stats.last_scanned_block = report.to_block;
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,warden=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
