use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenIssuer;
use crate::database::store::Storage;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared by every request: storage handle and the token issuer.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, tokens: TokenIssuer) -> Self {
        Self {
            storage,
            tokens: Arc::new(tokens),
        }
    }
}

pub const API_PREFIX: &str = "/api/v1";

pub fn app(state: AppState, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, public_routes().merge(protected_routes(state.clone())))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(public::login_post))
        .route("/register", post(public::register_post))
        .route("/products", get(public::products_get))
        .route("/products/:product_id", get(public::product_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/:user_id", get(protected::user_get))
        .route("/products", post(protected::product_post))
        .route("/cart/checkout", post(protected::checkout_post))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.storage.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable"
                })),
            )
        }
    }
}
