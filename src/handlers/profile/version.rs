// handlers/profile/version.rs - GET /profile/:owner/:version handler

use axum::extract::State;

use super::{version_not_found, ProfilePath};
use crate::auth::access::authorize;
use crate::database::ProfileRecord;
use crate::handlers::no_route;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

pub async fn get_version(
    State(state): State<AppState>,
    path: ProfilePath,
    Caller(identity): Caller,
) -> ApiResult<ProfileRecord> {
    let segment = path.version.as_ref().ok_or_else(no_route)?;
    authorize(&identity, &path.owner)?;

    // A well-formed segment that is not a version timestamp cannot name any stored version
    let version = segment.to_version().ok_or_else(version_not_found)?;

    let record = state
        .store
        .get_version(&path.owner, version)
        .await?
        .ok_or_else(version_not_found)?;
    Ok(ApiResponse::success(record))
}
