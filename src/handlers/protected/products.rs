// handlers/protected/products.rs - catalog writes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{product::max_price, NewProduct};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestIdentity};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i32,
}

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price must not be negative".to_string());
        }
        let price = self.price.round_dp(2);
        if price > max_price() {
            return Err(format!("price must not exceed {}", max_price()));
        }
        if self.quantity < 0 {
            return Err("quantity must not be negative".to_string());
        }

        Ok(NewProduct {
            name: self.name.trim().to_string(),
            description: self.description,
            image: self.image,
            price,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedProduct {
    pub id: i64,
}

/// POST /api/v1/products - add a product to the catalog
///
/// Expected Input:
/// ```json
/// { "name": "Mug", "description": "", "image": "", "price": 9.99, "quantity": 10 }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "id": 42 }
/// ```
pub async fn product_post(
    State(state): State<AppState>,
    identity: RequestIdentity,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<CreatedProduct> {
    let Json(payload) = payload?;
    let product = payload
        .into_new_product()
        .map_err(|msg| ApiError::bad_request(format!("invalid payload: {}", msg)))?;

    let id = state.storage.create_product(product).await?;
    tracing::info!("User {} created product {}", identity.0, id);

    Ok(ApiResponse::created(CreatedProduct { id }))
}
