// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uptime_kuma_controller::{
    config::Config,
    constants::{
        DEFAULT_INITIAL_DELAY_SECS, DEFAULT_RECONCILE_INTERVAL_SECS, EXIT_CODE_CONFIG_ERROR,
        EXIT_CODE_CYCLE_FAILED, METRICS_SERVER_BIND_ADDRESS, TOKIO_WORKER_THREADS,
    },
    ingress::{connect_kube_client, KubeIngressSource},
    kuma::KumaClient,
    metrics,
    reconciler::Reconciler,
    scheduler::{timed_cycle, Scheduler},
};

/// Keep Uptime Kuma monitors in sync with Kubernetes ingress hosts
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "uptime-kuma-controller", version, about, long_about = None)]
struct Args {
    /// Run a single reconciliation cycle and exit
    #[arg(long)]
    once: bool,

    /// Seconds to wait between cycles
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value_t = DEFAULT_RECONCILE_INTERVAL_SECS)]
    interval_secs: u64,

    /// Seconds to wait before the first cycle
    #[arg(long, env = "RECONCILE_INITIAL_DELAY_SECS", default_value_t = DEFAULT_INITIAL_DELAY_SECS)]
    initial_delay_secs: u64,

    /// Address the Prometheus metrics endpoint listens on
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = METRICS_SERVER_BIND_ADDRESS)]
    metrics_bind_address: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("uptime-kuma-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

fn init_tracing() {
    // Respects RUST_LOG if set, otherwise defaults to INFO.
    // RUST_LOG_FORMAT=json switches to JSON output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Uptime Kuma controller"
    );

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, exiting");
            std::process::exit(EXIT_CODE_CONFIG_ERROR);
        }
    };
    info!(
        api_url = %config.api_url,
        controller_tag = %config.controller_tag,
        strict = config.strict,
        using_defaults = config.using_defaults,
        "Configuration loaded"
    );

    debug!("Initializing Kubernetes client");
    let client = connect_kube_client().await?;
    debug!("Kubernetes client initialized successfully");

    let kuma = KumaClient::new(&config.api_url, &config.username, &config.password)?;
    let reconciler = Reconciler::new(
        Arc::new(KubeIngressSource::new(client)),
        Arc::new(kuma),
        config.controller_tag.as_str(),
    );

    if args.once {
        // the failure is already logged by timed_cycle
        let code = once_exit_code(&timed_cycle(reconciler.run_cycle()).await);
        if code != 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    let shutdown = CancellationToken::new();

    let metrics_server = tokio::spawn({
        let token = shutdown.clone();
        let address = args.metrics_bind_address.clone();
        async move {
            if let Err(e) = metrics::serve(&address, token).await {
                error!(error = %format!("{e:#}"), "Metrics server stopped");
            }
        }
    });

    tokio::spawn({
        let token = shutdown.clone();
        async move {
            match shutdown_signal().await {
                Ok(signal) => {
                    info!(signal, "Shutdown signal received, stopping after the current cycle");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to install signal handlers"),
            }
        }
    });

    let scheduler = Scheduler::new(
        Duration::from_secs(args.initial_delay_secs),
        Duration::from_secs(args.interval_secs),
    );
    scheduler
        .run(shutdown.clone(), || reconciler.run_cycle())
        .await;

    shutdown.cancel();
    if let Err(e) = metrics_server.await {
        warn!(error = %e, "Metrics server task failed");
    }

    info!("Uptime Kuma controller stopped");
    Ok(())
}

/// Exit status of a `--once` run, distinct from the configuration error status.
fn once_exit_code<T>(result: &Result<T>) -> i32 {
    if result.is_ok() {
        0
    } else {
        EXIT_CODE_CYCLE_FAILED
    }
}

/// Wait for Ctrl-C, or SIGTERM on Unix, and return the signal name.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
    }
}
