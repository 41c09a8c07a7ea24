//! services/api/src/web/auth.rs
//!
//! Authentication endpoints. Accounts and sessions are owned by the hosted auth
//! provider; these handlers validate input and relay its answers.

use crate::web::error::{AppError, ErrorResponse};
use crate::web::state::AppState;
use crate::web::validation::{CredentialsBody, LoginBody, SignupBody, ValidatedJson};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use monogatari_core::domain::{AuthSession, AuthUser};
use monogatari_core::ports::PortError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            token_type: session.token_type,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Absent when the provider still waits for email confirmation.
    pub session: Option<SessionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = CredentialsBody,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(credentials): ValidatedJson<SignupBody>,
) -> Result<impl IntoResponse, AppError> {
    let signup = state
        .auth
        .sign_up(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            if !matches!(e, PortError::Conflict(_)) {
                error!("Failed to sign up user: {:?}", e);
            }
            AppError::from(e)
        })?;

    info!(user_id = %signup.user.id, "User signed up");
    let message = signup
        .session
        .is_none()
        .then(|| "Confirmation email sent. Please verify your email.".to_string());

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: signup.user.into(),
            session: signup.session.map(Into::into),
            message,
        }),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = CredentialsBody,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(credentials): ValidatedJson<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let signin = state
        .auth
        .sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => AppError::Unauthorized("Invalid email or password".to_string()),
            other => {
                error!("Failed to log in: {:?}", other);
                AppError::from(other)
            }
        })?;

    Ok(Json(AuthResponse {
        user: signin.user.into(),
        session: Some(signin.session.into()),
        message: None,
    }))
}

/// GET /auth/me - The user behind the bearer token
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn me_handler(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user: user.into() })
}
