use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

const INVALID_TOKEN: &str = "Please provide a valid access token in the Authorization header.";

/// Verified identity of the caller, extracted from the bearer token
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_string();
        let identity = state.verifier.verify(&token).await?;
        Ok(Caller(identity))
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))?
        .to_str()
        .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;

    auth_str
        .strip_prefix("Bearer ")
        .filter(|token| is_bearer_token(token))
        .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))
}

/// `[A-Za-z0-9-_.~+/]+=*`
fn is_bearer_token(token: &str) -> bool {
    let body = token.trim_end_matches('=');
    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '+' | '/'))
}
