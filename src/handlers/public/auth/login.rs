// handlers/public/auth/login.rs - POST /api/v1/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::password::verify_password_blocking;
use crate::database::manager::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// Same message for unknown email and wrong password, so the endpoint
/// cannot be used to discover registered addresses.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/v1/login - Authenticate user and receive a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "a@b.c", "password": "secret123" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..." }
/// ```
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(payload) = payload?;
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("invalid payload: email and password are required"));
    }

    let user = match state.storage.get_user_by_email(&payload.email).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            tracing::info!("Login failed: unknown email");
            return Err(ApiError::bad_request(INVALID_CREDENTIALS));
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password_blocking(user.password.clone(), payload.password).await {
        tracing::info!("Login failed: wrong password for user {}", user.id);
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let token = state.tokens.mint(user.id)?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::success(LoginResponse { token }))
}
