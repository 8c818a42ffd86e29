use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Effective configuration with secrets masked
pub async fn get_config(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let config = serde_json::to_value(&state.settings).map_err(ApiError::internal)?;
    Ok(Json(state.config.redact_sensitive_values(&config)))
}
