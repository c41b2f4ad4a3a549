pub mod auth;
pub mod resolve_tenant;
pub mod response;
pub mod validate_access;

pub use auth::{authenticate, AuthUser};
pub use resolve_tenant::resolve_tenant;
pub use response::{ApiResponse, ApiResult};
pub use validate_access::validate_access;
