use std::sync::Arc;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub thread_id: Option<String>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.rag.ask(&payload.question, payload.thread_id).await?;
    Ok(Json(response))
}

pub async fn resume(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.rag.resume(&thread_id).await?;
    Ok(Json(response))
}
