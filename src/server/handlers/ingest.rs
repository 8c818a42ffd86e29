use std::sync::Arc;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn ingest(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state.ingest().await?;
    Ok(Json(report))
}
