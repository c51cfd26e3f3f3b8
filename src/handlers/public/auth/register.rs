// handlers/public/auth/register.rs - POST /api/v1/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::password::hash_password_blocking;
use crate::database::manager::DatabaseError;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_PASSWORD_LENGTH: usize = 130;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() {
            return Err("firstName is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            return Err("lastName is required".to_string());
        }
        validate_email_format(&self.email)?;

        let length = self.password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(format!(
                "password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            ));
        }
        Ok(())
    }
}

/// Loose shape check: exactly one `@` with something on both sides.
fn validate_email_format(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(format!("invalid email '{}'", email)),
    }
}

/// POST /api/v1/register - Create a new account
///
/// Expected Input:
/// ```json
/// {
///   "firstName": "Ada",
///   "lastName": "Lovelace",
///   "email": "a@b.c",
///   "password": "secret123"     // 3 to 130 characters
/// }
/// ```
///
/// Responds `201 Created` with an empty body.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|msg| ApiError::bad_request(format!("invalid payload: {}", msg)))?;

    match state.storage.get_user_by_email(&payload.email).await {
        Ok(_) => {
            return Err(DatabaseError::EmailInUse(payload.email.trim().to_lowercase()).into());
        }
        Err(DatabaseError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let password = hash_password_blocking(payload.password).await?;

    // The unique index still has the final say if two registrations race.
    let id = state
        .storage
        .create_user(NewUser {
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            email: payload.email,
            password,
        })
        .await?;

    tracing::info!("Registered user {}", id);
    Ok(ApiResponse::created(()))
}
