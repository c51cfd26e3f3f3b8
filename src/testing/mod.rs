//! In-memory storage and helpers for the unit and router tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    user::normalize_email, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem, Product, User,
};
use crate::database::store::{CheckoutUnit, OrderStore, ProductStore, Storage, UserStore};


pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Where a checkout should be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// The n-th (0-based) stock update inside a checkout
    UpdateProduct(usize),
    CreateOrder,
    /// The n-th (0-based) order item insert
    CreateOrderItem(usize),
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<i64, OrderItem>,
}

impl Tables {
    fn next_id<T>(map: &BTreeMap<i64, T>) -> i64 {
        map.keys().next_back().map_or(1, |id| id + 1)
    }
}

/// Mirrors the PostgreSQL storage closely enough for the checkout and HTTP
/// tests: a checkout unit works on a private copy of the tables and swaps it
/// in on commit, holding the lock for its whole lifetime.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
    fail_point: Arc<StdMutex<Option<FailPoint>>>,
    operations: Arc<AtomicUsize>,
    healthy: Arc<StdMutex<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let storage = Self::default();
        *storage.healthy.lock().unwrap() = true;
        storage
    }

    pub fn fail_at(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap() = Some(point);
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }

    /// Number of storage calls made so far.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn product_quantity(&self, id: i64) -> Option<i32> {
        self.tables.lock().await.products.get(&id).map(|p| p.quantity)
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.tables.lock().await.orders.values().cloned().collect()
    }

    pub async fn order_items(&self) -> Vec<OrderItem> {
        self.tables.lock().await.order_items.values().cloned().collect()
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn get_user_by_id(&self, id: i64) -> Result<User, DatabaseError> {
        self.touch();
        self.tables
            .lock()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        self.touch();
        let email = normalize_email(email);
        self.tables
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user with email {}", email)))
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError> {
        self.touch();
        let email = normalize_email(&user.email);
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::EmailInUse(email));
        }

        let id = Tables::next_id(&tables.users);
        tables.users.insert(
            id,
            User {
                id,
                first_name: user.first_name,
                last_name: user.last_name,
                email,
                password: user.password,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl ProductStore for MemoryStorage {
    async fn get_products(&self) -> Result<Vec<Product>, DatabaseError> {
        self.touch();
        Ok(self.tables.lock().await.products.values().cloned().collect())
    }

    async fn get_product_by_id(&self, id: i64) -> Result<Product, DatabaseError> {
        self.touch();
        self.tables
            .lock()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("product {}", id)))
    }

    async fn get_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, DatabaseError> {
        self.touch();
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<i64, DatabaseError> {
        self.touch();
        let mut tables = self.tables.lock().await;
        let id = Tables::next_id(&tables.products);
        tables.products.insert(
            id,
            Product {
                id,
                name: product.name,
                description: product.description,
                image: product.image,
                price: product.price,
                quantity: product.quantity,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl OrderStore for MemoryStorage {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, DatabaseError> {
        self.touch();
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        let fail_point = *self.fail_point.lock().unwrap();

        Ok(Box::new(MemoryCheckoutUnit {
            guard,
            staged,
            fail_point,
            updates: 0,
            items: 0,
        }))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if *self.healthy.lock().unwrap() {
            Ok(())
        } else {
            Err(DatabaseError::QueryError("connection refused".to_string()))
        }
    }
}

struct MemoryCheckoutUnit {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_point: Option<FailPoint>,
    updates: usize,
    items: usize,
}

impl MemoryCheckoutUnit {
    fn check(&self, point: FailPoint) -> Result<(), DatabaseError> {
        if self.fail_point == Some(point) {
            return Err(DatabaseError::QueryError(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutUnit for MemoryCheckoutUnit {
    async fn update_product_quantity(&mut self, product_id: i64, quantity: i32) -> Result<bool, DatabaseError> {
        self.check(FailPoint::UpdateProduct(self.updates))?;
        self.updates += 1;

        match self.staged.products.get_mut(&product_id) {
            Some(product) if product.quantity >= quantity => {
                product.quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_order(&mut self, order: &NewOrder) -> Result<i64, DatabaseError> {
        self.check(FailPoint::CreateOrder)?;

        let id = Tables::next_id(&self.staged.orders);
        self.staged.orders.insert(
            id,
            Order {
                id,
                user_id: order.user_id,
                total: order.total,
                status: order.status,
                address: order.address.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn create_order_item(&mut self, item: &NewOrderItem) -> Result<(), DatabaseError> {
        self.check(FailPoint::CreateOrderItem(self.items))?;
        self.items += 1;

        let duplicate = self
            .staged
            .order_items
            .values()
            .any(|i| i.order_id == item.order_id && i.product_id == item.product_id);
        if duplicate {
            return Err(DatabaseError::QueryError("duplicate order item".to_string()));
        }

        let id = Tables::next_id(&self.staged.order_items);
        self.staged.order_items.insert(
            id,
            OrderItem {
                id,
                order_id: item.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            },
        );
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.check(FailPoint::Commit)?;
        let MemoryCheckoutUnit { mut guard, staged, .. } = *self;
        *guard = staged;
        Ok(())
    }
}
