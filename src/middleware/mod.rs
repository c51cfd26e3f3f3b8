pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, user_id_from_extensions, AuthUser, RequestIdentity, UNAUTHENTICATED};
pub use response::{ApiResponse, ApiResult};
