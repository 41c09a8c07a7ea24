//! services/api/src/adapters/auth.rs
//!
//! This module contains the adapter for the hosted auth provider (a Supabase
//! compatible GoTrue REST API). It implements the `AuthService` port.

use async_trait::async_trait;
use monogatari_core::domain::{AuthSession, AuthUser, SignIn, SignUp};
use monogatari_core::ports::{AuthService, PortError, PortResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
}
impl UserPayload {
    fn to_domain(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    user: UserPayload,
}
impl SessionPayload {
    fn into_parts(self) -> (AuthUser, AuthSession) {
        let session = AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
        };
        (self.user.to_domain(), session)
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AuthService` against the hosted auth REST API.
#[derive(Clone)]
pub struct SupabaseAuthAdapter {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthAdapter {
    /// Creates a new `SupabaseAuthAdapter`. `base_url` is the project URL without
    /// the `/auth/v1` suffix.
    pub fn new(http: reqwest::Client, base_url: String, anon_key: String) -> Self {
        Self {
            http,
            base_url,
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

/// Pulls the human-readable message out of an auth error body.
fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("unknown auth error")
        .to_string()
}

async fn read_json(response: reqwest::Response) -> PortResult<(StatusCode, Value)> {
    let status = response.status();
    let body = response
        .json::<Value>()
        .await
        .map_err(|e| PortError::Unexpected(format!("Invalid auth response: {}", e)))?;
    Ok((status, body))
}

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> PortResult<T> {
    serde_json::from_value(value).map_err(|e| PortError::Unexpected(format!("Unexpected auth payload: {}", e)))
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for SupabaseAuthAdapter {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<SignUp> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let (status, body) = read_json(response).await?;

        if !status.is_success() {
            let message = error_message(&body);
            let code = body.get("error_code").and_then(Value::as_str);
            if message.contains("already registered") || code == Some("user_already_exists") {
                return Err(PortError::Conflict("User already exists".to_string()));
            }
            return Err(PortError::Unexpected(message));
        }

        // With email confirmation enabled the provider answers with a bare user.
        if body.get("access_token").is_some() {
            let (user, session) = parse::<SessionPayload>(body)?.into_parts();
            Ok(SignUp {
                user,
                session: Some(session),
            })
        } else {
            let user_value = body.get("user").cloned().unwrap_or(body);
            Ok(SignUp {
                user: parse::<UserPayload>(user_value)?.to_domain(),
                session: None,
            })
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<SignIn> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let (status, body) = read_json(response).await?;

        match status {
            s if s.is_success() => {
                let (user, session) = parse::<SessionPayload>(body)?.into_parts();
                Ok(SignIn { user, session })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(PortError::Unauthorized),
            _ => Err(PortError::Unexpected(error_message(&body))),
        }
    }

    async fn get_user(&self, access_token: &str) -> PortResult<AuthUser> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let (status, body) = read_json(response).await?;

        match status {
            s if s.is_success() => Ok(parse::<UserPayload>(body)?.to_domain()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PortError::Unauthorized),
            _ => Err(PortError::Unexpected(error_message(&body))),
        }
    }
}
