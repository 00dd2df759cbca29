//cargo run --package coastline --bin coastline_mcp_server -- [chart.geojson]
use coastline::{manager::CoastlineManager, mcp::CoastlineMcpServer};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
        .init();

    let server = match std::env::args().nth(1) {
        Some(path) => {
            let mut manager = CoastlineManager::new();
            let count = manager.load_features(&path)?;
            tracing::info!(count, path = %path, "preloaded chart features");
            CoastlineMcpServer::with_manager(manager)
        }
        None => CoastlineMcpServer::new(),
    };

    tracing::info!("Starting coastline reconstruction MCP server on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Failed to start MCP server: {:?}", e);
    })?;

    tokio::select! {
        result = service.waiting() => {
            result.inspect_err(|e| tracing::error!("MCP server error: {:?}", e))?;
            tracing::info!("MCP server completed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
