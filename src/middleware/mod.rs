pub mod auth;
pub mod response;

pub use auth::{authenticate, require_auth, RejectReason, Rejection};
pub use response::{ApiResponse, ApiResult};
