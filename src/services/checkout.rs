use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::models::{NewOrder, NewOrderItem, OrderStatus, Product};
use crate::database::store::Storage;

/// One line of a posted cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "productID")]
    pub product_id: i64,
    pub quantity: i32,
}

/// What the client gets back after a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReceipt {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "orderID")]
    pub order_id: i64,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid cart: {0}")]
    InvalidCart(String),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("product {0} is not available in the quantity requested")]
    OutOfStock(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Turns a validated cart into a committed order.
pub struct CheckoutService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> CheckoutService<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    pub async fn checkout(
        &self,
        user_id: i64,
        items: &[CartItem],
        address: &str,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let lines = validate_cart(items)?;

        let ids: Vec<i64> = lines.iter().map(|line| line.product_id).collect();
        let products = self.storage.get_products_by_ids(&ids).await?;
        let snapshot = index_products(products, &ids)?;

        check_stock(&lines, &snapshot)?;
        let total = cart_total(&lines, &snapshot);

        let mut unit = self.storage.begin_checkout().await?;

        for line in &lines {
            if !unit.update_product_quantity(line.product_id, line.quantity).await? {
                // Someone else took the stock between the snapshot and now.
                return Err(CheckoutError::OutOfStock(line.product_id));
            }
        }

        let order_id = unit
            .create_order(&NewOrder {
                user_id,
                total,
                status: OrderStatus::Pending,
                address: address.to_string(),
            })
            .await?;

        for line in &lines {
            unit.create_order_item(&NewOrderItem {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: snapshot[&line.product_id].price,
            })
            .await?;
        }

        unit.commit().await?;

        info!("Order {} placed by user {}: {} lines, total {}", order_id, user_id, lines.len(), total);
        Ok(CheckoutReceipt { total, order_id })
    }
}

/// Reject empty carts, non-positive quantities and repeated products.
/// Returns the lines sorted by product id so processing order never depends
/// on how the client listed them.
pub fn validate_cart(items: &[CartItem]) -> Result<Vec<CartItem>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::InvalidCart("cart is empty".to_string()));
    }

    let mut seen = BTreeSet::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(CheckoutError::InvalidCart(format!(
                "invalid quantity {} for product {}",
                item.quantity, item.product_id
            )));
        }
        if !seen.insert(item.product_id) {
            return Err(CheckoutError::InvalidCart(format!("duplicate product {}", item.product_id)));
        }
    }

    let mut lines = items.to_vec();
    lines.sort_by_key(|line| line.product_id);
    Ok(lines)
}

fn index_products(products: Vec<Product>, requested: &[i64]) -> Result<HashMap<i64, Product>, CheckoutError> {
    let snapshot: HashMap<i64, Product> = products.into_iter().map(|p| (p.id, p)).collect();

    // `requested` is sorted, so the lowest missing id is reported.
    if let Some(missing) = requested.iter().find(|id| !snapshot.contains_key(id)) {
        return Err(CheckoutError::ProductNotFound(*missing));
    }

    debug!("Resolved {} products for checkout", snapshot.len());
    Ok(snapshot)
}

fn check_stock(lines: &[CartItem], snapshot: &HashMap<i64, Product>) -> Result<(), CheckoutError> {
    for line in lines {
        if snapshot[&line.product_id].quantity < line.quantity {
            return Err(CheckoutError::OutOfStock(line.product_id));
        }
    }
    Ok(())
}

/// Sum of snapshot price times quantity, exact to the cent.
pub fn cart_total(lines: &[CartItem], snapshot: &HashMap<i64, Product>) -> Decimal {
    lines
        .iter()
        .map(|line| snapshot[&line.product_id].price * Decimal::from(line.quantity))
        .sum::<Decimal>()
        .round_dp(2)
}
