pub mod auth;
pub mod json;
pub mod response;

pub use auth::{authenticate, require_admin, require_logged_in, require_self_or_admin, AuthUser};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
