// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, registration and catalog reads.

pub mod auth;
pub mod products;

pub use auth::*;
pub use products::{product_get, products_get};
