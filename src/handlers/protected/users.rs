// handlers/protected/users.rs - user lookup

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestIdentity};

/// GET /api/v1/users/:user_id - public profile of any user
///
/// The password hash is never serialized.
pub async fn user_get(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(user_id): Path<String>,
) -> ApiResult<User> {
    let id = user_id
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("invalid user ID"))?;

    tracing::debug!("User {} looking up user {}", identity.0, id);
    let user = state.storage.get_user_by_id(id).await?;

    Ok(ApiResponse::success(user))
}
