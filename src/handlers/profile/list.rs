// handlers/profile/list.rs - GET /profile handler

use axum::extract::State;

use crate::auth::access::owner_scope;
use crate::database::OwnerSummary;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

/// Owners with at least one version. Admins see all of them, everyone else at most themselves.
pub async fn list_owners(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> ApiResult<Vec<OwnerSummary>> {
    let owners = state.store.list_owners(owner_scope(&identity)).await?;

    tracing::debug!(
        subject = %identity.subject,
        admin = identity.is_admin,
        count = owners.len(),
        "Listed profile owners"
    );
    Ok(ApiResponse::success(owners))
}
