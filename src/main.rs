//! breakwater command-line tool.
//!
//! Validates breaker configuration files and drives a synthetic dependency
//! through a configured breaker, printing every transition as a JSON line.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use breakwater::config::{load_config, BreakerSettings, FileConfig};
use breakwater::observability::{logging, metrics};
use breakwater::{BreakerError, BreakerRegistry, Phase, TransitionReason};

#[derive(Parser)]
#[command(name = "breakwater")]
#[command(about = "Circuit breaker configuration and simulation tool", long_about = None)]
struct Cli {
    /// Configuration file (TOML); built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the resolved breakers
    Check,
    /// Run a synthetic workload through one breaker
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Breaker to drive; created from the defaults if not configured
    #[arg(short, long, default_value = "simulated")]
    breaker: String,

    /// Number of calls to issue
    #[arg(short = 'n', long, default_value_t = 200)]
    calls: u32,

    /// Probability that a call to the dependency fails
    #[arg(short, long, default_value_t = 0.5)]
    failure_rate: f64,

    /// Dependency recovers (stops failing) after this many calls
    #[arg(long)]
    recover_after: Option<u32>,

    /// Concurrent callers
    #[arg(short = 'j', long, default_value_t = 4)]
    concurrency: u32,

    /// Dependency latency per call
    #[arg(long, default_value_t = 10)]
    latency_ms: u64,

    /// Pause between calls of one caller
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Print Prometheus metrics when done
    #[arg(long)]
    metrics: bool,
}

#[derive(Debug)]
struct DependencyDown;

impl std::fmt::Display for DependencyDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dependency unavailable")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Check => check(&config),
        Commands::Simulate(args) => simulate(&config, args).await,
    }
}

fn check(config: &FileConfig) -> Result<(), Box<dyn std::error::Error>> {
    let breakers: Vec<&BreakerSettings> = config.breakers.iter().collect();
    let report = json!({
        "valid": true,
        "observability": config.observability,
        "defaults": config.defaults,
        "breakers": breakers,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn simulate(config: &FileConfig, args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&args.failure_rate) {
        return Err(format!("--failure-rate must be within [0, 1], got {}", args.failure_rate).into());
    }
    if args.concurrency == 0 {
        return Err("--concurrency must be at least 1".into());
    }

    let prometheus = if args.metrics {
        Some(metrics::install_recorder()?)
    } else {
        if config.observability.metrics_enabled {
            metrics::init_metrics(config.observability.metrics_address.parse()?);
        }
        None
    };

    let registry = BreakerRegistry::from_config(config)?.with_listener(Arc::new(
        |name: &str, from: Phase, to: Phase, reason: &TransitionReason| {
            let event = json!({
                "event": "transition",
                "breaker": name,
                "from": from,
                "to": to,
                "detail": reason,
            });
            println!("{}", event);
        },
    ));
    let breaker = registry.get_or_create(&args.breaker);

    tracing::info!(
        breaker = %breaker.name(),
        calls = args.calls,
        failure_rate = args.failure_rate,
        concurrency = args.concurrency,
        "Simulation starting"
    );

    let issued = Arc::new(AtomicU32::new(0));
    let succeeded = Arc::new(AtomicU32::new(0));
    let failed = Arc::new(AtomicU32::new(0));
    let rejected = Arc::new(AtomicU32::new(0));
    let args = Arc::new(args);

    let mut workers = Vec::new();
    for _ in 0..args.concurrency {
        let breaker = breaker.clone();
        let args = args.clone();
        let issued = issued.clone();
        let succeeded = succeeded.clone();
        let failed = failed.clone();
        let rejected = rejected.clone();

        workers.push(tokio::spawn(async move {
            loop {
                let index = issued.fetch_add(1, Ordering::SeqCst);
                if index >= args.calls {
                    break;
                }
                let healthy = args.recover_after.is_some_and(|n| index >= n);
                let latency = Duration::from_millis(args.latency_ms);
                let failure_rate = args.failure_rate;

                let result = breaker
                    .execute(|| async move {
                        tokio::time::sleep(latency).await;
                        if !healthy && fastrand::f64() < failure_rate {
                            Err(DependencyDown)
                        } else {
                            Ok(())
                        }
                    })
                    .await;

                match result {
                    Ok(()) => succeeded.fetch_add(1, Ordering::Relaxed),
                    Err(BreakerError::Open(_)) => rejected.fetch_add(1, Ordering::Relaxed),
                    Err(BreakerError::Call(_)) => failed.fetch_add(1, Ordering::Relaxed),
                };
                tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
            }
        }));
    }

    for worker in workers {
        worker.await?;
    }

    let summary = json!({
        "event": "summary",
        "succeeded": succeeded.load(Ordering::Relaxed),
        "failed": failed.load(Ordering::Relaxed),
        "rejected": rejected.load(Ordering::Relaxed),
        "snapshot": breaker.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }

    tracing::info!("Simulation complete");
    Ok(())
}
