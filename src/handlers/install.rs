// handlers/install.rs - POST /install handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Create the version table. Unauthenticated; a second call is a conflict.
pub async fn install(State(state): State<AppState>) -> ApiResult<Value> {
    state.store.install().await?;
    Ok(ApiResponse::created(json!({ "status": "installed" })))
}
