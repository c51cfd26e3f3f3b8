// handlers/public/products.rs - catalog reads

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::Product;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/v1/products - full catalog, ordered by id
pub async fn products_get(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = state.storage.get_products().await?;
    Ok(ApiResponse::success(products))
}

/// GET /api/v1/products/:product_id
pub async fn product_get(State(state): State<AppState>, Path(product_id): Path<String>) -> ApiResult<Product> {
    let id = product_id
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("invalid product ID"))?;

    let product = state.storage.get_product_by_id(id).await?;
    Ok(ApiResponse::success(product))
}
