//! nixbox daemon - Nix image resolution shim for the CRI image service.
//!
//! Serves the `runtime.v1.ImageService` contract on a Unix socket. Pulls
//! of `nix:0` references are resolved to store paths, built on demand and
//! loaded into containerd; everything else is forwarded to containerd's
//! own CRI image service once the background binder has connected to it.

use anyhow::{Context, Result};
use clap::Parser;
use nixbox_grpc::ImageServiceServer;
use nixbox_image::{
    spawn_binder, Backend, BinderConfig, CliLoader, NixCliBuilder, NixImageService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::signal;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "nixbox-daemon")]
#[command(author, version, about, long_about = None)]
struct DaemonArgs {
    /// Unix socket path to serve the image service on.
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Address of the backend CRI endpoint.
    #[arg(long)]
    containerd_address: Option<String>,

    /// Substituter to fetch store paths from instead of building locally.
    #[arg(long)]
    source: Option<String>,

    /// Configuration file path.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonArgs::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("nixbox={}", config.logging.level))
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    run(args, config).await
}

async fn run(args: DaemonArgs, mut config: Config) -> Result<()> {
    info!("Starting nixbox daemon...");

    if let Some(socket) = args.socket {
        config.socket = socket;
    }
    if let Some(address) = args.containerd_address {
        config.containerd_address = address;
    }
    if let Some(source) = args.source {
        config.source = source;
    }

    let backend = Backend::new();
    let binder = spawn_binder(
        backend.clone(),
        BinderConfig::new(config.containerd_address.clone()),
    );

    let builder = Arc::new(NixCliBuilder::new());
    let loader = Arc::new(CliLoader::new(config.loader_command.clone()));
    let service = NixImageService::new(backend, builder, loader)
        .context("Failed to create image service")?
        .with_source(config.source.clone());

    if let Some(parent) = config.socket.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }
    // Remove a stale socket file if present.
    let _ = std::fs::remove_file(&config.socket);

    let listener = UnixListener::bind(&config.socket)
        .with_context(|| format!("Failed to bind socket: {}", config.socket.display()))?;
    let incoming = UnixListenerStream::new(listener);

    info!(
        socket = %config.socket.display(),
        backend = %config.containerd_address,
        "image service listening"
    );

    Server::builder()
        .add_service(ImageServiceServer::new(service))
        .serve_with_incoming_shutdown(incoming, shutdown_signal())
        .await
        .context("gRPC server error")?;

    info!("Shutting down...");
    binder.abort();

    if let Err(e) = std::fs::remove_file(&config.socket) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove socket {}: {}", config.socket.display(), e);
        }
    }

    info!("nixbox daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
