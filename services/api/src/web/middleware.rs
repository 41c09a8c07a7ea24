//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use crate::web::error::AppError;
use crate::web::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use monogatari_core::domain::AuthUser;
use monogatari_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

/// The caller on routes where signing in is optional.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves a bearer token to its user.
///
/// A token the provider rejects is `Unauthorized`; any other failure means the
/// provider could not answer and surfaces as an internal error.
async fn resolve_user(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    state.auth.get_user(token).await.map_err(|e| match e {
        PortError::Unauthorized | PortError::NotFound(_) => {
            debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Invalid token".to_string())
        }
        other => AppError::from(other),
    })
}

/// Middleware that validates the bearer token with the auth provider.
///
/// If valid, inserts the `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid token".to_string()))?;

    let user = resolve_user(&state, &token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware that resolves the caller when a token is present.
///
/// A missing or rejected token makes the request anonymous. An auth provider
/// outage still fails the request.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).map(str::to_owned);
    let user = match token {
        Some(token) => match resolve_user(&state, &token).await {
            Ok(user) => Some(user),
            Err(AppError::Unauthorized(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    req.extensions_mut().insert(MaybeUser(user));
    Ok(next.run(req).await)
}
