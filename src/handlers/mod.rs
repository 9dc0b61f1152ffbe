pub mod health;
pub mod install;
pub mod profile;

pub use health::health;
pub use install::install;

use crate::error::ApiError;

/// Error for any request no route accepts, including bad path segments
pub fn no_route() -> ApiError {
    ApiError::not_found("No route matches the requested path")
}

/// Fallback for unknown paths and undeclared methods
pub async fn not_found() -> ApiError {
    no_route()
}
