use anyhow::{Context, Result};
use archive_file_store::{
    adapters::inbound::http::router::{create_router, AppState},
    app::AppBuilder,
    config::StoreArgs,
};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "archive-file-store-server")]
#[command(about = "HTTP server for archive buckets and their files", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    #[command(flatten)]
    store: StoreArgs,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.store.init_logging()?;

    info!("Starting Archive File Store server");
    info!("Storage backend: {}", cli.store.storage_backend);

    let config = cli.store.to_app_config()?;
    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    let state = AppState {
        archive_service: Arc::new(app_services.archive_service),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "archive-file-store-server",
            "--port",
            "8080",
            "--storage-backend",
            "s3",
            "--s3-endpoint",
            "https://s3.eu-central-1.amazonaws.com",
            "--s3-access-key",
            "test-key",
            "--s3-secret-key",
            "test-secret",
        ]);

        assert_eq!(cli.port, 8080);
        assert_eq!(cli.store.storage_backend, "s3");
        assert!(cli.store.to_app_config().is_ok());
    }
}
