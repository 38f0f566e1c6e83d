//! Metric Sentinel Main Binary
//!
//! Orchestrates the sentinel components:
//! - Detection: shared sliding-window z-score detector
//! - Ingestion: periodic metric simulator
//! - API: REST API server accepting external samples
//! - Line log: per-sample operator log file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metric_sentinel_api::prelude::*;
use metric_sentinel_core::prelude::*;
use metric_sentinel_detection::prelude::*;
use metric_sentinel_ingestion::prelude::*;
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "config/sentinel.yaml";

/// Metric Sentinel CLI arguments
#[derive(Debug, Parser)]
#[clap(name = "sentinel", version, about = "Streaming z-score anomaly detection")]
struct Cli {
    /// Configuration file path
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, env = "SENTINEL_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[clap(long, env = "SENTINEL_LOG_JSON", global = true)]
    log_json: bool,

    /// Dry run mode (validate configuration, don't start services)
    #[clap(long, global = true)]
    dry_run: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the API server and metric simulator (default if no subcommand given)
    Serve {
        /// Don't run the internal metric simulator
        #[clap(long)]
        no_simulator: bool,
    },
    /// Feed recorded values through a fresh detector and print the verdicts
    Replay {
        /// File with one value per line (blank lines and `#` comments ignored)
        #[clap(long)]
        input: PathBuf,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },
    /// Print the effective configuration
    Inspect {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    info!("Starting Metric Sentinel v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli.config)?;

    if cli.dry_run {
        info!("Dry run mode - configuration validated, exiting");
        return Ok(());
    }

    match cli.command {
        Some(Commands::Replay { input, json }) => run_replay_command(&config, &input, json),
        Some(Commands::Inspect { json }) => run_inspect_command(&config, json),
        Some(Commands::Serve { no_simulator }) => run_serve_command(config, no_simulator).await,
        None => run_serve_command(config, false).await,
    }
}

/// Load the configuration file, falling back to defaults when the default
/// path is absent, then apply environment overrides
fn load_config(path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", path);

    let config = if path.exists() {
        Config::from_file(path).context("Failed to load configuration")?
    } else if path == Path::new(DEFAULT_CONFIG_PATH) {
        warn!("No configuration file at {:?}, using defaults", path);
        Config::default()
    } else {
        anyhow::bail!("Configuration file not found: {}", path.display());
    };

    let config = config
        .with_env_overrides()
        .context("Invalid environment override")?;

    info!(
        threshold_z_score = config.detector.threshold_z_score,
        window_size = config.detector.window_size,
        min_observations = config.detector.min_observations,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Run the serve subcommand (default behavior)
async fn run_serve_command(mut config: Config, no_simulator: bool) -> Result<()> {
    if no_simulator {
        config.simulator.enabled = false;
    }

    let sentinel = Sentinel::new(config)?;
    sentinel.run().await
}

/// Run the replay subcommand
fn run_replay_command(config: &Config, input: &Path, json_output: bool) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;
    let values = parse_values(&content)?;

    info!(samples = values.len(), input = ?input, "Replaying samples");

    let detector = AnomalyDetector::new(config.detector.clone());
    let results: Vec<(f64, AnomalyResult)> = values
        .iter()
        .map(|value| (*value, detector.check_anomaly(*value)))
        .collect();
    let stats = detector.stats();

    if json_output {
        let rows: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(i, (value, result))| {
                json!({
                    "index": i,
                    "metric": value,
                    "isAnomaly": result.is_anomaly,
                    "zScore": result.z_score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("\n{}", "=".repeat(60));
        println!("REPLAY RESULTS");
        println!("{}", "=".repeat(60));
        println!("{:<8} {:<16} {:<12} {:<8}", "Index", "Metric", "Z-Score", "Anomaly");
        println!("{}", "-".repeat(60));
        for (i, (value, result)) in results.iter().enumerate() {
            println!(
                "{:<8} {:<16.2} {:<12.2} {:<8}",
                i,
                value,
                result.z_score,
                if result.is_anomaly { "ALERT" } else { "-" }
            );
        }
        println!("{}", "=".repeat(60));
        println!(
            "Samples: {}  Anomalies: {}  Phase: {}",
            stats.observations, stats.anomalies, stats.phase
        );
        println!();
    }

    Ok(())
}

/// Parse one value per line, skipping blank lines and `#` comments
fn parse_values(content: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let value: f64 = line
            .parse()
            .with_context(|| format!("Invalid value on line {}: {:?}", number + 1, line))?;
        if !value.is_finite() {
            anyhow::bail!("Non-finite value on line {}: {:?}", number + 1, line);
        }
        values.push(value);
    }
    Ok(values)
}

/// Run the inspect subcommand
fn run_inspect_command(config: &Config, json_output: bool) -> Result<()> {
    if json_output {
        let value = json!({
            "detector": {
                "thresholdZScore": config.detector.threshold_z_score,
                "windowSize": config.detector.window_size,
                "minObservations": config.detector.min_observations,
            },
            "server": {
                "host": config.server.host,
                "port": config.server.port,
                "requestTimeoutSecs": config.server.request_timeout_secs,
                "maxBodyBytes": config.server.max_body_bytes,
                "enableCors": config.server.enable_cors,
                "corsOrigins": config.server.cors_origins,
            },
            "simulator": {
                "enabled": config.simulator.enabled,
                "intervalMs": config.simulator.interval_ms,
            },
            "logging": {
                "file": config.logging.file,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(60));
    println!("METRIC SENTINEL CONFIGURATION");
    println!("{}", "=".repeat(60));
    println!("DETECTOR:");
    println!("  Z-score threshold:  {}", config.detector.threshold_z_score);
    println!("  Window size:        {}", config.detector.window_size);
    println!("  Min observations:   {}", config.detector.min_observations);
    println!();
    println!("SERVER:");
    println!("  Bind:               {}:{}", config.server.host, config.server.port);
    println!("  Request timeout:    {}s", config.server.request_timeout_secs);
    println!("  Max body:           {} bytes", config.server.max_body_bytes);
    if config.server.enable_cors {
        println!("  CORS:               {}", config.server.cors_origins.join(", "));
    } else {
        println!("  CORS:               disabled");
    }
    println!();
    println!("SIMULATOR:");
    println!("  Enabled:            {}", config.simulator.enabled);
    println!("  Interval:           {}ms", config.simulator.interval_ms);
    println!();
    println!("LINE LOG:");
    println!("  File:               {}", config.logging.file.display());
    println!("{}", "=".repeat(60));

    Ok(())
}

/// Build the event filter: `RUST_LOG` directives plus the CLI level
fn log_filter(level: &str) -> Result<EnvFilter> {
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("Invalid log level: {level}"))?;
    Ok(EnvFilter::from_default_env().add_directive(level.into()))
}

/// Install the global subscriber. Events go to stderr so that `--json`
/// subcommand output on stdout stays machine-readable.
fn init_logging(cli: &Cli) -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(log_filter(&cli.log_level)?);

    if cli.log_json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true),
            )
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_line_number(true),
            )
            .init();
    }

    info!(level = %cli.log_level, json = cli.log_json, "Logging initialized");
    Ok(())
}

/// Main Sentinel orchestrator
struct Sentinel {
    config: Config,
    detector: Arc<AnomalyDetector>,
    line_log: Arc<dyn LineLog>,
}

impl Sentinel {
    /// Create a new Sentinel instance
    fn new(config: Config) -> Result<Self> {
        info!("Initializing Sentinel components...");

        let line_log = FileLineLog::open(&config.logging.file).with_context(|| {
            format!("Failed to open log file {}", config.logging.file.display())
        })?;
        info!(path = %line_log.path().display(), "Line log opened");
        let line_log: Arc<dyn LineLog> = Arc::new(line_log);

        let detector = Arc::new(AnomalyDetector::new(config.detector.clone()));

        info!("All components initialized successfully");

        Ok(Self {
            config,
            detector,
            line_log,
        })
    }

    /// Run the sentinel system until a shutdown signal arrives
    async fn run(self) -> Result<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Run until `shutdown` resolves or the API server stops on its own
    async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        info!("Starting Sentinel services...");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let simulator = if self.config.simulator.enabled {
            let simulator = Simulator::new(
                SystemMetricSimulator::new(),
                Arc::clone(&self.detector),
                Arc::clone(&self.line_log),
                self.config.simulator.interval(),
            );
            Some(tokio::spawn(simulator.run(shutdown_rx.clone())))
        } else {
            info!("Metric simulator disabled");
            None
        };

        let api_config = ApiConfig::from_server_config(&self.config.server)
            .context("Invalid server configuration")?;
        let metric_state = Arc::new(MetricState::new(
            Arc::clone(&self.detector),
            Arc::clone(&self.line_log),
        ));
        let server = ApiServer::new(
            api_config,
            metric_state,
            env!("CARGO_PKG_VERSION").to_string(),
        );

        let mut server_shutdown = shutdown_rx.clone();
        let mut api_server = tokio::spawn(server.serve(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        }));

        let server_exit = tokio::select! {
            _ = shutdown => {
                info!("Initiating graceful shutdown...");
                let _ = shutdown_tx.send(true);
                api_server.await
            }
            exit = &mut api_server => {
                error!("API server stopped unexpectedly, shutting down");
                let _ = shutdown_tx.send(true);
                exit
            }
        };

        let server_result = match server_exit {
            Ok(result) => result.context("API server failed"),
            Err(e) => Err(anyhow::anyhow!("API server task failed: {e}")),
        };
        if let Err(e) = &server_result {
            error!("{:#}", e);
        }

        if let Some(simulator) = simulator {
            match simulator.await {
                Ok(summary) => info!(
                    samples = summary.samples,
                    anomalies = summary.anomalies,
                    "Simulator finished"
                ),
                Err(e) => error!("Simulator task failed: {}", e),
            }
        }

        let stats = self.detector.stats();
        info!(
            observations = stats.observations,
            anomalies = stats.anomalies,
            "Sentinel stopped"
        );

        server_result
    }
}

/// Wait for shutdown signal (SIGTERM or CTRL+C)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
