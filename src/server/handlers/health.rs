use std::sync::Arc;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let llm_reachable = state.provider.health_check().await.unwrap_or(false);
    let indexed_chunks = state.store.count().await?;
    let threads = state.rag.threads().await?.len();
    Ok(Json(json!({
        "llm_provider": state.provider.name(),
        "llm_reachable": llm_reachable,
        "indexed_chunks": indexed_chunks,
        "threads": threads,
        "degraded": !llm_reachable || indexed_chunks == 0
    })))
}
