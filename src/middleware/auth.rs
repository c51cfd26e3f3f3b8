use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;

use crate::app::AppState;
use crate::database::manager::DatabaseError;
use crate::error::ApiError;

/// User id reported when a request carries no authenticated identity.
pub const UNAUTHENTICATED: i64 = -1;

/// Authenticated user, injected into request extensions by [`jwt_auth_middleware`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Verifies the bearer token, confirms the user still exists and publishes
/// [`AuthUser`] for downstream handlers. Every failure is a 403 with the same
/// body; the cause goes to the log only.
pub async fn jwt_auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = extract_token(request.headers(), request.uri().query());
    if token.is_empty() {
        tracing::warn!("Rejected request to {}: no token", request.uri().path());
        return ApiError::permission_denied().into_response();
    }

    let claims = match state.tokens.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected request to {}: failed to validate token: {}", request.uri().path(), e);
            return ApiError::permission_denied().into_response();
        }
    };

    let user = match state.storage.get_user_by_id(claims.user_id).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            tracing::warn!("Rejected request: token for unknown user {}", claims.user_id);
            return ApiError::permission_denied().into_response();
        }
        Err(e) => {
            tracing::error!("Failed to load user {} during authentication: {}", claims.user_id, e);
            return ApiError::permission_denied().into_response();
        }
    };

    tracing::debug!("Authenticated user {}", user.id);
    request.extensions_mut().insert(AuthUser { user_id: user.id });

    next.run(request).await
}

/// `Authorization` header first (raw token, or `Bearer <token>`), then the
/// `token` query parameter. Empty when neither is present.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> String {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty());

    if let Some(token) = from_header {
        return token.to_string();
    }

    query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

/// The authenticated user id, or [`UNAUTHENTICATED`] (`-1`).
pub fn user_id_from_extensions(extensions: &Extensions) -> i64 {
    extensions
        .get::<AuthUser>()
        .map_or(UNAUTHENTICATED, |user| user.user_id)
}

/// Extractor for the identity published by the auth middleware. Never fails;
/// reads `-1` on routes that are not behind the middleware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestIdentity(pub i64);

impl RequestIdentity {
    pub fn is_authenticated(&self) -> bool {
        self.0 != UNAUTHENTICATED
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestIdentity(user_id_from_extensions(&parts.extensions)))
    }
}
