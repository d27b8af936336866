//! CEL Cache host shim
//!
//! Reads newline-delimited JSON requests on stdin and writes one JSON
//! response per line on stdout. Logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cel_cache::host::handle_line;
use cel_cache::{spawn_maintenance_task, Config, HostState};

/// Main entry point for the host shim.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging and route panic reports to it
/// 2. Load configuration from environment variables
/// 3. Initialize the process-wide caches
/// 4. Start background cache maintenance task
/// 5. Answer requests until EOF, Ctrl+C or SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cel_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Evaluation panics are recovered per request; report them as log lines
    std::panic::set_hook(Box::new(|info| {
        error!("{}", info);
    }));

    info!("Starting CEL cache host shim");

    let config = Config::from_env();
    info!(
        "Configuration loaded: program_cache={}MB, json_cache={}MB, low_water={}%, maintenance_interval={}s",
        config.program_cache_mb,
        config.json_cache_mb,
        config.low_water_percent,
        config.maintenance_interval
    );

    let state = HostState::from_config(&config);

    let maintenance_handle = spawn_maintenance_task(
        Arc::clone(state.engine.caches()),
        config.maintenance_interval,
    );
    info!("Background maintenance task started");

    let outcome = tokio::select! {
        result = serve_lines(&state) => result,
        () = shutdown_signal() => Ok(()),
    };

    maintenance_handle.abort();
    warn!("Maintenance task aborted");

    info!("Host shim shutdown complete");
    outcome
}

/// Answers request lines from stdin until EOF.
async fn serve_lines(state: &HostState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read request line")?
    {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(state, &line);
        let mut encoded = serde_json::to_string(&response).context("failed to encode response")?;
        encoded.push('\n');

        stdout
            .write_all(encoded.as_bytes())
            .await
            .context("failed to write response")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }

    info!("Input closed");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
