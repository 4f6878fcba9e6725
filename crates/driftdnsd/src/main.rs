// # driftdnsd - driftdns Daemon
//
// Thin integration layer: all reconciliation logic lives in driftdns-core.
//
// The daemon is responsible for:
// 1. Installing the tracing subscriber
// 2. Loading configuration (JSON file, then environment overrides)
// 3. Building the IP resolver, the Route 53 provider and the Reconciler once
// 4. Running the Scheduler until SIGINT/SIGTERM
//
// ## Configuration
//
// - `DRIFTDNS_CONFIG`: Path to the JSON settings file (default `settings.json`,
//   then `Settings.json`; a missing file is allowed). Both the snake_case
//   layout and the `App` section layout with PascalCase keys are read.
// - `DRIFTDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DRIFTDNS_ACCESS_KEY` / `DRIFTDNS_SECRET_KEY`: AWS credentials
// - `DRIFTDNS_REGION`: AWS region, selects the Route 53 partition
// - `DRIFTDNS_INTERVAL_MS`: Polling interval in milliseconds
// - `DRIFTDNS_DOMAINS`: `ZONE=name` pairs, comma separated
// - `DRIFTDNS_IP_URL`: IP-echo endpoint
// - `DRIFTDNS_SKIP_POLICY`: `halt_pass` or `skip_domain`
//
// ## Example
//
// ```bash
// export DRIFTDNS_ACCESS_KEY=AKIA...
// export DRIFTDNS_SECRET_KEY=...
// export DRIFTDNS_REGION=eu-west-1
// export DRIFTDNS_DOMAINS=Z0123456789ABC=home.example.com.
//
// driftdnsd
// ```

use anyhow::{Context, Result};
use driftdns_core::{ReconcileEvent, Reconciler, ReconcilerConfig, Scheduler};
use driftdns_ip_http::HttpIpResolver;
use driftdns_provider_route53::Route53Provider;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const ENV_CONFIG_PATH: &str = "DRIFTDNS_CONFIG";
const ENV_LOG_LEVEL: &str = "DRIFTDNS_LOG_LEVEL";
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["settings.json", "Settings.json"];

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DriftExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DriftExitCode> for ExitCode {
    fn from(code: DriftExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            value
        ),
    }
}

/// First default settings file present in `dir`, or the first name if none is
fn default_config_path(dir: &Path) -> PathBuf {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| dir.join(DEFAULT_CONFIG_PATHS[0]))
}

/// Load the settings file, apply environment overrides and validate
fn load_config() -> Result<ReconcilerConfig> {
    let path = env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path(Path::new(".")));

    let mut config = ReconcilerConfig::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .apply_env_overrides(|key| env::var(key).ok())
        .context("Invalid environment override")?;
    config.validate()?;

    Ok(config)
}

fn main() -> ExitCode {
    let log_level = match parse_log_level(
        &env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
    ) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DriftExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DriftExitCode::ConfigError.into();
    }

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DriftExitCode::ConfigError.into();
        }
    };

    info!("Starting driftdnsd daemon");
    info!(
        "Configuration loaded: {} domain(s), region {}, interval {:?}",
        config.domains.len(),
        config.region,
        config.interval()
    );
    if config.domains.is_empty() {
        warn!("No domains configured; every pass will be a no-op");
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DriftExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let scheduler = match build_scheduler(&config) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DriftExitCode::ConfigError;
            }
        };

        match wait_for_shutdown_signal() {
            Ok(shutdown) => {
                scheduler.run_until(shutdown).await;
                info!("Shutting down daemon");
                DriftExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DriftExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the long-lived clients and wire them into a scheduler
fn build_scheduler(config: &ReconcilerConfig) -> Result<Scheduler> {
    let ip_resolver = HttpIpResolver::from_config(&config.ip_resolver)?;
    info!("IP resolver: {}", ip_resolver.url());

    let provider = Route53Provider::new(&config.credentials, &config.region)?;
    info!("Route 53 signing region: {}", provider.signing_region());

    for domain in &config.domains {
        info!("Managing {} in zone {}", domain.name, domain.hosted_zone_id);
    }

    let (reconciler, events) = Reconciler::new(Box::new(ip_resolver), Box::new(provider), config)?;
    tokio::spawn(log_events(events));

    Ok(Scheduler::new(
        Arc::new(reconciler),
        config.interval(),
        config.engine.startup_delay(),
    ))
}

async fn log_events(mut events: mpsc::Receiver<ReconcileEvent>) {
    while let Some(event) = events.recv().await {
        debug!(?event, "reconcile event");
    }
}

/// Register SIGTERM/SIGINT handlers and return a future that resolves on
/// the first of them
///
/// Handlers are installed before the scheduler starts so that an early signal
/// is not lost.
#[cfg(unix)]
fn wait_for_shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Fallback for non-Unix platforms: Ctrl-C only
#[cfg(not(unix))]
fn wait_for_shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: Ctrl-C"),
            Err(e) => error!("Failed to wait for Ctrl-C: {}", e),
        }
    })
}
