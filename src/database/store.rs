use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewOrder, NewOrderItem, NewProduct, NewUser, Product, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `NotFound` when no row matches.
    async fn get_user_by_id(&self, id: i64) -> Result<User, DatabaseError>;

    /// Case-insensitive; `NotFound` when no row matches.
    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError>;

    /// Returns the new id, or `EmailInUse` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_products(&self) -> Result<Vec<Product>, DatabaseError>;

    async fn get_product_by_id(&self, id: i64) -> Result<Product, DatabaseError>;

    /// At most one product per requested id; unknown ids are simply absent.
    async fn get_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError>;

    async fn create_product(&self, product: NewProduct) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Open the atomic scope used by checkout.
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, DatabaseError>;
}

/// Writes performed by one checkout. Nothing is visible to other requests
/// until [`CheckoutUnit::commit`]; dropping the unit rolls everything back.
#[async_trait]
pub trait CheckoutUnit: Send {
    /// Take `quantity` units of stock from a product, only if that much is
    /// still available. Returns `false` (and changes nothing) otherwise.
    async fn update_product_quantity(&mut self, product_id: i64, quantity: i32) -> Result<bool, DatabaseError>;

    async fn create_order(&mut self, order: &NewOrder) -> Result<i64, DatabaseError>;

    async fn create_order_item(&mut self, item: &NewOrderItem) -> Result<(), DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Storage: UserStore + ProductStore + OrderStore {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
