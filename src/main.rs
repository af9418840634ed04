use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use utcp_mcp_bridge::config::BridgeConfig;
use utcp_mcp_bridge::repository::in_memory::InMemoryToolRepository;
use utcp_mcp_bridge::repository::ToolRepository;
use utcp_mcp_bridge::tag::tag_search::TagSearchStrategy;
use utcp_mcp_bridge::transports::registry::TransportRegistry;
use utcp_mcp_bridge::{McpServer, SequentialChainClient, UtcpClient, UtcpMcpBridge};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = BridgeConfig::from_env();
    if let Some(path) = &config.providers_file_path {
        info!(path = %path.display(), "loading providers");
    }

    let transports = TransportRegistry::with_default_transports()?;
    info!(transports = ?transports.supported(), "built-in transports ready");

    let repo: Arc<dyn ToolRepository> = Arc::new(InMemoryToolRepository::new());
    let search = Arc::new(TagSearchStrategy::new(repo.clone(), 1.0)?);
    let client = Arc::new(
        UtcpClient::new_with_providers(
            &config,
            transports,
            repo,
            search,
        )
        .await?,
    );
    let chain = Arc::new(SequentialChainClient::new(client.clone()));

    let server = McpServer::new(UtcpMcpBridge::new(client, chain), &config);
    server.serve_stdio().await?;
    info!("stdin closed, shutting down");
    Ok(())
}
