// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition and account creation. No token is required here.

pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;
