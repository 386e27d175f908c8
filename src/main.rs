use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use assumption_gate_lib::auth::credential;
use assumption_gate_lib::config::GateConfig;
use assumption_gate_lib::{http, observability, AppState};

#[derive(Debug, Parser)]
#[command(name = "assumption-gate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the assumption endpoint
    Serve {
        /// JSON config file (defaults to $ASSUMPTION_GATE_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a freshly generated 64-hex-character credential
    GenerateKey,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateKey => println!("{}", credential::generate()),
        Command::Serve { config } => {
            if let Err(err) = serve(config).await {
                eprintln!("STARTUP_ERROR {err}");
                std::process::exit(1);
            }
        }
    }
}

async fn serve(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GateConfig::load(config_path.as_deref())?;
    let _log_guard = observability::init_tracing(config.log_dir.as_deref(), config.log_json);

    let state = Arc::new(AppState::from_config(&config).await?);
    tracing::info!(
        enabled = state.enabled,
        allow_list = state.gate.len(),
        driver = state.store.driver_id(),
        timeout_ms = config.query_timeout_ms,
        "Assumption gate configured"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "assumption-gate listening");

    let app = http::router(Arc::clone(&state));
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    state.audit.shutdown().await;
    state.store.close().await;
    tracing::info!("assumption-gate stopped");

    served.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
