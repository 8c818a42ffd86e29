use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

pub async fn get_graph(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let graph = state.rag.graph();
    let options = state.rag.options();
    Json(json!({
        "entry": graph.entry(),
        "edges": graph.edges(),
        "max_steps": options.max_steps,
        "interrupt_before": options.interrupt_before,
        "dot": graph.to_dot(),
    }))
}
