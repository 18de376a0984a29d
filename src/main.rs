//! Main entry point for the Crypt Queue matchmaking simulator
//!
//! Loads configuration, runs the queue simulation for the configured
//! duration and writes the resulting lobbies to a JSON report.

use anyhow::Result;
use clap::Parser;
use crypt_queue::config::{validate_config, AppConfig};
use crypt_queue::metrics::MetricsCollector;
use crypt_queue::rating::RatingMethod;
use crypt_queue::simulation::Simulation;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Crypt Queue - Party matchmaking simulator for solo, duo and trio lobbies
#[derive(Parser)]
#[command(
    name = "crypt-queue",
    version,
    about = "Simulates party matchmaking into solo, duo and trio dungeon lobbies",
    long_about = "Crypt Queue generates random parties, matchmakes them into lobbies by map, \
                 queue size and gear score rating, starts lobbies once full and cancels them \
                 once their queue time runs out. The final lobbies are written as JSON."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Simulated duration override
    #[arg(long, value_name = "SECONDS", help = "Override simulated duration")]
    duration: Option<u64>,

    /// Max queue time override
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Override how long a lobby may fill before it starts or cancels"
    )]
    max_queue_time: Option<u64>,

    /// Rating method override
    #[arg(long, value_name = "METHOD", help = "Override rating method (max_gs, avg_gs)")]
    rating_method: Option<String>,

    /// Rating threshold override
    #[arg(
        long,
        value_name = "RATING",
        help = "Override maximum rating difference between parties of a lobby"
    )]
    rating_threshold: Option<f64>,

    /// Arrivals per tick override
    #[arg(long, value_name = "COUNT", help = "Override parties generated per tick")]
    arrivals_per_tick: Option<usize>,

    /// Random seed
    #[arg(long, value_name = "SEED", help = "Seed the party generator for reproducible runs")]
    seed: Option<u64>,

    /// Report path override
    #[arg(short, long, value_name = "FILE", help = "Override JSON report path")]
    output: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without simulating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with simulation settings
fn display_startup_banner(config: &AppConfig) {
    info!("🗝️  Crypt Queue Matchmaking Simulator");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Duration: {}s in {}s ticks",
        config.simulation.duration_seconds, config.simulation.tick_seconds
    );
    info!("   Arrivals per tick: {}", config.simulation.arrivals_per_tick);
    match config.simulation.seed {
        Some(seed) => info!("   Seed: {}", seed),
        None => info!("   Seed: random"),
    }
    info!(
        "   Max queue time: {}s",
        config.matchmaking.max_queue_time_seconds
    );
    info!(
        "   Rating: {} (threshold {})",
        config.matchmaking.rating_method, config.matchmaking.rating_threshold
    );
    info!("   Report: {}", config.simulation.output_path.display());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(duration) = args.duration {
        config.simulation.duration_seconds = duration;
    }

    if let Some(max_queue_time) = args.max_queue_time {
        config.matchmaking.max_queue_time_seconds = max_queue_time;
    }

    if let Some(method) = &args.rating_method {
        config.matchmaking.rating_method = method.clone();
    }

    if let Some(threshold) = args.rating_threshold {
        config.matchmaking.rating_threshold = threshold;
    }

    if let Some(arrivals) = args.arrivals_per_tick {
        config.simulation.arrivals_per_tick = arrivals;
    }

    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }

    if let Some(output) = &args.output {
        config.simulation.output_path = output.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Available rating methods: {}", RatingMethod::available().join(", "));
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without simulating");
        return Ok(());
    }

    let metrics = Arc::new(MetricsCollector::new()?);
    let output_path = config.simulation.output_path.clone();
    let simulation = Simulation::new(config, metrics.clone())?;

    let report = match simulation.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            std::process::exit(1);
        }
    };

    report.write_json(&output_path)?;

    info!("✅ Report written to {}", output_path.display());
    info!(
        "   Parties generated: {}, lobbies started: {}, players started: {}",
        report.summary.parties_generated,
        report.summary.lobbies_started,
        report.summary.players_started
    );
    info!(
        "   Parties dropped: {}, lobbies still filling: {}",
        report.summary.parties_dropped, report.summary.lobbies_filling
    );

    match metrics.render() {
        Ok(text) => debug!("Final metrics:\n{}", text),
        Err(e) => error!("Failed to render metrics: {}", e),
    }

    Ok(())
}
