// handlers/mod.rs - HTTP request handlers
//
// public:    no token required (login, register, catalog reads)
// protected: mounted behind `jwt_auth_middleware`

pub mod protected;
pub mod public;
