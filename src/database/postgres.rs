use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    user::normalize_email, NewOrder, NewOrderItem, NewProduct, NewUser, Product, User,
};
use crate::database::store::{CheckoutUnit, OrderStore, ProductStore, Storage, UserStore};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, created_at";
const PRODUCT_COLUMNS: &str = "id, name, description, image, price, quantity, created_at";

/// PostgreSQL-backed storage over a shared pool
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn get_user_by_id(&self, id: i64) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let email = normalize_email(email);
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = $1",
            USER_COLUMNS
        ))
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| DatabaseError::NotFound(format!("user with email {}", email)))
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError> {
        let email = normalize_email(&user.email);
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (first_name, last_name, email, password)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_user_insert(e, &email))?;

        Ok(id)
    }
}

#[async_trait]
impl ProductStore for PgStorage {
    async fn get_products(&self) -> Result<Vec<Product>, DatabaseError> {
        let products = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product_by_id(&self, id: i64) -> Result<Product, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        product.ok_or_else(|| DatabaseError::NotFound(format!("product {}", id)))
    }

    async fn get_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn create_product(&self, product: NewProduct) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (name, description, image, price, quantity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.price)
        .bind(product.quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl OrderStore for PgStorage {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCheckoutUnit { tx }))
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

/// One checkout transaction. sqlx rolls back on drop.
pub struct PgCheckoutUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutUnit for PgCheckoutUnit {
    async fn update_product_quantity(&mut self, product_id: i64, quantity: i32) -> Result<bool, DatabaseError> {
        // Conditional decrement: the stock check and the write are one statement,
        // so concurrent checkouts cannot oversell.
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity - $2
             WHERE id = $1 AND quantity >= $2",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_order(&mut self, order: &NewOrder) -> Result<i64, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (user_id, total, status, address)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(order.user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(&order.address)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn create_order_item(&mut self, item: &NewOrderItem) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        debug!("Checkout transaction committed");
        Ok(())
    }
}
