use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use adaptive_rag::core::config::AppPaths;
use adaptive_rag::core::logging;
use adaptive_rag::server;
use adaptive_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let state = AppState::initialize(paths)
        .await
        .context("Failed to initialize application state")?;

    if state.settings.retrieval.ingest_on_startup {
        let ingest_state = state.clone();
        tokio::spawn(async move {
            match ingest_state.ingest().await {
                Ok(report) => tracing::info!(
                    "Startup ingestion: {} files, {} chunks",
                    report.files,
                    report.chunks
                ),
                Err(e) => tracing::warn!("Startup ingestion failed: {}", e),
            }
        });
    }

    let server_settings = &state.settings.server;
    let bind_addr = format!("{}:{}", server_settings.host, server_settings.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("ADAPTIVE_RAG_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
