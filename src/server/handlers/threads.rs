use std::sync::Arc;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_threads(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let threads: Vec<Value> = state
        .rag
        .threads()
        .await?
        .into_iter()
        .map(|checkpoint| {
            json!({
                "thread_id": checkpoint.thread_id,
                "question": checkpoint.state.question,
                "next": checkpoint.next,
                "steps_taken": checkpoint.steps_taken,
                "updated_at": checkpoint.updated_at,
            })
        })
        .collect();
    Ok(Json(json!({"threads": threads})))
}

pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let checkpoint = state.rag.thread(&thread_id).await?;
    Ok(Json(json!({"thread": checkpoint})))
}

pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.rag.delete_thread(&thread_id).await?;
    Ok(Json(json!({"status": "success"})))
}
