// handlers/profile/history.rs - GET /profile/:owner handler

use axum::extract::State;

use super::ProfilePath;
use crate::auth::access::authorize;
use crate::database::VersionSummary;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

pub async fn list_versions(
    State(state): State<AppState>,
    path: ProfilePath,
    Caller(identity): Caller,
) -> ApiResult<Vec<VersionSummary>> {
    authorize(&identity, &path.owner)?;

    let versions = state.store.list_versions(&path.owner).await?;
    Ok(ApiResponse::success(versions))
}
