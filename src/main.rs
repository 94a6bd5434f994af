//! wx-logger: London current-conditions sampler.
//!
//! Single-binary Tokio application that:
//! 1. Waits for the next round poll-interval boundary
//! 2. Fetches the aggregated weather.com feed (with retry/backoff)
//! 3. Appends the selected observation to the day's JSONL log
//! 4. Folds it into the day's high-temperature rollup

mod config;
mod cycle;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use cycle::SamplingCycle;
use scheduler::PollScheduler;
use wu_client::{RetryPolicy, WuClient};

/// Weather feed sampler with a daily high watermark
#[derive(Parser)]
#[command(name = "wx-logger", about = "Samples current conditions and tracks the daily high")]
struct Cli {
    /// Run a single cycle immediately and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wx_logger=info,wu_client=info,daily_store=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("wx-logger starting up...");

    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("API key: {}", cfg.redacted_api_key());
    info!(
        "Target: {} geocodes={:?} language={}",
        cfg.target_id, cfg.geocodes, cfg.language
    );
    info!(
        "Timing: every {}m, fetch timeout={}ms, attempts={}",
        cfg.timing.poll_interval_minutes, cfg.timing.fetch_timeout_ms, cfg.timing.fetch_max_attempts
    );
    info!("Output: {} (zone {})", cfg.output_dir, cfg.timezone);

    if let Err(e) = std::fs::create_dir_all(&cfg.output_dir) {
        error!("Failed to create output directory {}: {}", cfg.output_dir, e);
        std::process::exit(1);
    }

    let policy = RetryPolicy::new(
        cfg.timing.fetch_max_attempts,
        Duration::from_millis(cfg.timing.fetch_timeout_ms),
    );
    let client = match WuClient::new(&cfg, policy) {
        Ok(c) => c,
        Err(e) => {
            error!("HTTP client initialization failed: {}", e);
            std::process::exit(1);
        }
    };
    let sampler = Arc::new(SamplingCycle::new(&cfg, client));

    // ── Single-cycle mode ────────────────────────────────────────────
    if cli.once {
        info!("Running single cycle...");
        match sampler.run_once().await {
            Ok(report) => info!("Wrote {}", report.log_path.display()),
            Err(e) => {
                error!("Cycle failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let interval = Duration::from_secs(cfg.timing.poll_interval_minutes.saturating_mul(60));
    let handle = PollScheduler::new(interval).start(move || {
        let sampler = sampler.clone();
        async move { sampler.run_once().await }
    });

    info!("wx-logger is running. Press Ctrl+C to stop.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}; running until killed", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");

    if handle.state().await.phase == scheduler::Phase::Aligning {
        info!("Stopping before the first aligned cycle");
    }
    let state = handle.stop().await;
    info!(
        "wx-logger shut down after {} cycles every {:?} ({} ok, {} failed, {} skipped, last at {:?}).",
        state.cycles_started,
        state.interval,
        state.cycles_completed,
        state.cycles_failed,
        state.cycles_skipped,
        state.last_fired
    );
}
