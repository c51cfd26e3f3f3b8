// handlers/protected/cart.rs - checkout

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, RequestIdentity};
use crate::services::{CartItem, CheckoutReceipt, CheckoutService};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub address: String,
}

/// POST /api/v1/cart/checkout - place an order for the caller
///
/// Expected Input:
/// ```json
/// { "items": [ { "productID": 1, "quantity": 2 } ], "address": "optional" }
/// ```
///
/// Expected Output:
/// ```json
/// { "total": 22.5, "orderID": 17 }
/// ```
///
/// All stock updates, the order row and its items commit together or not
/// at all.
pub async fn checkout_post(
    State(state): State<AppState>,
    identity: RequestIdentity,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<CheckoutReceipt> {
    let Json(payload) = payload?;

    let receipt = CheckoutService::new(state.storage.as_ref())
        .checkout(identity.0, &payload.items, &payload.address)
        .await?;

    Ok(ApiResponse::success(receipt))
}
