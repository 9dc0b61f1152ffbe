// handlers/profile/add.rs - POST /profile/:owner/add handler

use axum::{body::Bytes, extract::State};
use serde_json::value::RawValue;

use super::ProfilePath;
use crate::auth::access::authorize;
use crate::database::VersionSummary;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;

/// Append the request body as a new version authored by the caller
pub async fn add_version(
    State(state): State<AppState>,
    path: ProfilePath,
    Caller(identity): Caller,
    body: Bytes,
) -> ApiResult<VersionSummary> {
    authorize(&identity, &path.owner)?;

    let content = parse_content(&body)?;
    let version = state
        .store
        .add_version(&path.owner, &identity.subject, content)
        .await?;

    tracing::info!(
        owner = %path.owner,
        author = %identity.subject,
        version = %version.profile_version,
        "Added profile version"
    );
    Ok(ApiResponse::created(version))
}

/// Body must be a single JSON document; its text is kept as sent, minus surrounding whitespace
fn parse_content(body: &[u8]) -> Result<&RawValue, ApiError> {
    serde_json::from_slice::<&RawValue>(body).map_err(|e| {
        ApiError::unsupported_media_type(format!("Request body is not valid JSON: {}", e))
    })
}
