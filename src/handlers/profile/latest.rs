// handlers/profile/latest.rs - GET /profile/:owner/latest handler

use axum::extract::State;

use super::{version_not_found, ProfilePath};
use crate::auth::access::authorize;
use crate::database::ProfileRecord;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

pub async fn get_latest(
    State(state): State<AppState>,
    path: ProfilePath,
    Caller(identity): Caller,
) -> ApiResult<ProfileRecord> {
    authorize(&identity, &path.owner)?;

    let record = state
        .store
        .get_latest(&path.owner)
        .await?
        .ok_or_else(version_not_found)?;
    Ok(ApiResponse::success(record))
}
