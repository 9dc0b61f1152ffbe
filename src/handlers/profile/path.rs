use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ApiError;
use crate::handlers::no_route;
use crate::types::{OwnerId, VersionId};

/// Captured `{owner}` and optional `{version}` segments, grammar-checked.
///
/// A segment outside the identifier grammar rejects with the same 404 an
/// unmatched path gets, before any authentication happens.
#[derive(Debug, Clone)]
pub struct ProfilePath {
    pub owner: OwnerId,
    pub version: Option<VersionId>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ProfilePath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| no_route())?;

        let owner = params
            .get("owner")
            .and_then(|owner| OwnerId::parse(owner.clone()).ok())
            .ok_or_else(no_route)?;

        let version = match params.get("version") {
            Some(segment) => Some(VersionId::parse(segment.clone()).map_err(|_| no_route())?),
            None => None,
        };

        Ok(Self { owner, version })
    }
}
