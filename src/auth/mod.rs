//! Credential primitives: Argon2 password hashing and HS256 bearer tokens.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{TokenClaims, TokenError, TokenIssuer};
