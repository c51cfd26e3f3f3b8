// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind `jwt_auth_middleware`, so handlers can read
// the caller through `RequestIdentity` without checking it again.

pub mod cart;
pub mod products;
pub mod users;

pub use cart::checkout_post;
pub use products::product_post;
pub use users::user_get;
