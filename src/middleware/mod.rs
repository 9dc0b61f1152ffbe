pub mod auth;
pub mod cors;
pub mod response;

pub use auth::{bearer_token, Caller};
pub use cors::{header_policy, CorsPolicy, RouteHeaders};
pub use response::{ApiResponse, ApiResult};
