use anyhow::Context;
use docsearch::config::{INDEX_ENV, SearchConfig};
use docsearch::server::{DocSearchServer, expand_tilde};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docsearch::tracing::init();

    tracing::info!("Starting docsearch MCP server");

    let config_path = SearchConfig::resolve_path();
    let config = SearchConfig::load_or_default(config_path.as_deref())
        .context("Failed to load search configuration")?;

    let server = DocSearchServer::new(&config);

    // Preload an index so the first query does not need load_index
    if let Some(path) = std::env::var(INDEX_ENV).ok().filter(|p| !p.is_empty()) {
        let path = PathBuf::from(expand_tilde(&path).as_ref());
        match server.context().state().load(&path).await {
            Ok(index) => tracing::info!(
                "Preloaded index from {} ({} records)",
                path.display(),
                index.store().len()
            ),
            Err(e) => tracing::warn!("Failed to preload index from {}: {}", path.display(), e),
        }
    }

    // Create and serve the MCP server over stdio
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}
