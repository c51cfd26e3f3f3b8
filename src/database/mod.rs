pub mod manager;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use postgres::PgStorage;
pub use store::{CheckoutUnit, OrderStore, ProductStore, Storage, UserStore};
