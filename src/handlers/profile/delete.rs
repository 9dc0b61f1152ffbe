// handlers/profile/delete.rs - POST /profile/:owner/delete handler

use axum::extract::State;

use super::ProfilePath;
use crate::auth::access::authorize;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

/// Remove every version of the owner. Succeeds even when there was nothing to remove.
pub async fn delete_owner(
    State(state): State<AppState>,
    path: ProfilePath,
    Caller(identity): Caller,
) -> ApiResult<()> {
    authorize(&identity, &path.owner)?;

    let removed = state.store.delete_owner(&path.owner).await?;

    tracing::info!(
        owner = %path.owner,
        subject = %identity.subject,
        removed,
        "Deleted profile history"
    );
    Ok(ApiResponse::<()>::no_content())
}
