//! services/api/src/web/validation.rs
//!
//! Request body schemas and the `ValidatedJson` extractor that enforces them
//! before any handler logic runs.

use crate::pipeline::StoryRequest;
use crate::web::error::{AppError, FieldIssue};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use monogatari_core::domain::{AgeBracket, NarrationVoice, StoryLength};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

/// A request body that can be checked and converted into its validated form.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldIssue>>;
}

/// Extracts a JSON body and validates it; failures become a 400 with field issues.
pub struct ValidatedJson<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(vec![FieldIssue::new("body", rejection.body_text())]))?;
        body.validate().map(ValidatedJson).map_err(AppError::Validation)
    }
}

//=========================================================================================
// Field Helpers
//=========================================================================================

fn required_text(field: &str, value: Option<String>, message: &str, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            issues.push(FieldIssue::new(field, message));
            None
        }
    }
}

fn one_of<E>(field: &str, value: Option<String>, message: &str, issues: &mut Vec<FieldIssue>) -> Option<E>
where
    E: FromStr + IntoEnumIterator + AsRef<str>,
{
    let parsed = value.as_deref().and_then(|raw| E::from_str(raw).ok());
    if parsed.is_none() {
        let allowed: Vec<String> = E::iter().map(|v| v.as_ref().to_string()).collect();
        issues.push(FieldIssue::new(field, format!("{} Expected one of: {}", message, allowed.join(", "))));
    }
    parsed
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

//=========================================================================================
// Request Bodies
//=========================================================================================

/// Body of `POST /posts`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StoryRequestBody {
    #[schema(example = "child cried in park")]
    pub prompt: Option<String>,
    #[schema(example = "3-4歳")]
    pub age: Option<String>,
    #[schema(example = "short")]
    pub length: Option<String>,
}

impl Validate for StoryRequestBody {
    type Output = StoryRequest;

    fn validate(self) -> Result<StoryRequest, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let prompt = required_text("prompt", self.prompt, "Prompt cannot be empty.", &mut issues);
        let age = one_of::<AgeBracket>("age", self.age, "Please choose a target age.", &mut issues);
        let length = one_of::<StoryLength>("length", self.length, "Please choose a story length.", &mut issues);

        match (prompt, age, length) {
            (Some(prompt), Some(age), Some(length)) => Ok(StoryRequest {
                prompt: prompt.trim().to_string(),
                age,
                length,
            }),
            _ => Err(issues),
        }
    }
}

/// Body of `PUT /posts/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StoryUpdateBody {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A validated story edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryUpdate {
    pub title: String,
    pub content: String,
}

impl Validate for StoryUpdateBody {
    type Output = StoryUpdate;

    fn validate(self) -> Result<StoryUpdate, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let title = required_text("title", self.title, "Title must be at least 1 character.", &mut issues);
        let content = required_text("content", self.content, "Content must be at least 1 character.", &mut issues);
        match (title, content) {
            (Some(title), Some(content)) => Ok(StoryUpdate {
                title: title.trim().to_string(),
                content: content.trim().to_string(),
            }),
            _ => Err(issues),
        }
    }
}

/// Body of `POST /posts/{id}/generate-audio`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AudioRequestBody {
    #[schema(example = "nova")]
    pub voice: Option<String>,
}

impl Validate for AudioRequestBody {
    type Output = NarrationVoice;

    fn validate(self) -> Result<NarrationVoice, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        one_of::<NarrationVoice>("voice", self.voice, "Please choose a voice.", &mut issues).ok_or(issues)
    }
}

/// Body of the signup and login endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CredentialsBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Email/password pair that passed validation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup demands a 6+ character password.
pub struct SignupBody(CredentialsBody);

/// Login only demands that a password is present.
pub struct LoginBody(CredentialsBody);

impl<'de> Deserialize<'de> for SignupBody {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CredentialsBody::deserialize(deserializer).map(SignupBody)
    }
}

impl<'de> Deserialize<'de> for LoginBody {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CredentialsBody::deserialize(deserializer).map(LoginBody)
    }
}

fn validate_credentials(body: CredentialsBody, min_password: usize) -> Result<Credentials, Vec<FieldIssue>> {
    let mut issues = Vec::new();
    let email = match body.email.map(|e| e.trim().to_string()) {
        Some(email) if looks_like_email(&email) => Some(email),
        _ => {
            issues.push(FieldIssue::new("email", "A valid email address is required."));
            None
        }
    };
    let password = match body.password {
        Some(password) if password.chars().count() >= min_password.max(1) => Some(password),
        _ => {
            let message = if min_password > 1 {
                format!("Password must be at least {} characters.", min_password)
            } else {
                "Password is required.".to_string()
            };
            issues.push(FieldIssue::new("password", message));
            None
        }
    };
    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => Err(issues),
    }
}

impl Validate for SignupBody {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldIssue>> {
        validate_credentials(self.0, 6)
    }
}

impl Validate for LoginBody {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldIssue>> {
        validate_credentials(self.0, 1)
    }
}
