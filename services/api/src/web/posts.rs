//! services/api/src/web/posts.rs
//!
//! Story ("post") endpoints: generation, reading, editing, publishing,
//! narration requests and deletion.

use crate::pipeline::{self, PipelineError};
use crate::web::error::{AppError, ErrorResponse};
use crate::web::middleware::MaybeUser;
use crate::web::state::AppState;
use crate::web::validation::{
    AudioRequestBody, StoryRequestBody, StoryUpdate, StoryUpdateBody, ValidatedJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use monogatari_core::domain::{Audio, AudioStatus, AuthUser, Illustration, Story, StoryDetails};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// How many stories `GET /posts/latest` returns.
pub const LATEST_STORIES_LIMIT: i64 = 3;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct IllustrationResponse {
    pub id: i64,
    pub story_id: i64,
    pub image_url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

impl From<Illustration> for IllustrationResponse {
    fn from(i: Illustration) -> Self {
        Self {
            id: i.id,
            story_id: i.story_id,
            image_url: i.image_url,
            prompt: i.prompt,
            created_at: i.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AudioResponse {
    pub id: i64,
    pub story_id: i64,
    pub audio_url: String,
    pub voice: String,
    pub created_at: DateTime<Utc>,
}

impl From<Audio> for AudioResponse {
    fn from(a: Audio) -> Self {
        Self {
            id: a.id,
            story_id: a.story_id,
            audio_url: a.audio_url,
            voice: a.voice,
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StoryResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub published_at: Option<DateTime<Utc>>,
    #[schema(example = "not_started")]
    pub audio_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            title: s.title,
            content: s.content,
            is_public: s.is_public,
            published_at: s.published_at,
            audio_status: s.audio_status.to_string(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// A story with its assets. Listings leave out `audios`.
#[derive(Serialize, ToSchema)]
pub struct StoryDetailsResponse {
    #[serde(flatten)]
    pub story: StoryResponse,
    pub illustrations: Vec<IllustrationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audios: Option<Vec<AudioResponse>>,
}

impl StoryDetailsResponse {
    fn listing(details: StoryDetails) -> Self {
        Self {
            story: details.story.into(),
            illustrations: details.illustrations.into_iter().map(Into::into).collect(),
            audios: None,
        }
    }

    fn full(details: StoryDetails) -> Self {
        Self {
            story: details.story.into(),
            illustrations: details.illustrations.into_iter().map(Into::into).collect(),
            audios: Some(details.audios.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StoriesResponse {
    pub stories: Vec<StoryDetailsResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct StoryDetailsEnvelope {
    pub story: StoryDetailsResponse,
}

#[derive(Serialize, ToSchema)]
pub struct StoryEnvelope {
    pub story: StoryResponse,
}

#[derive(Serialize, ToSchema)]
pub struct CreateStoryResponse {
    pub story: StoryResponse,
    /// `null` when the story was saved but the illustration step failed.
    pub illustration: Option<IllustrationResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct AudioQueuedResponse {
    pub story_id: i64,
    #[schema(example = "queued")]
    pub audio_status: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Reading
//=========================================================================================

/// GET /posts - All of the caller's stories, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    responses(
        (status = 200, description = "The caller's stories", body = StoriesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn list_posts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StoriesResponse>, AppError> {
    let stories = state.db.list_stories(user.id, None).await?;
    Ok(Json(StoriesResponse {
        stories: stories.into_iter().map(StoryDetailsResponse::listing).collect(),
    }))
}

/// GET /posts/latest - The caller's three newest stories
#[utoipa::path(
    get,
    path = "/api/v1/posts/latest",
    responses(
        (status = 200, description = "The caller's newest stories", body = StoriesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn latest_posts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StoriesResponse>, AppError> {
    let stories = state.db.list_stories(user.id, Some(LATEST_STORIES_LIMIT)).await?;
    Ok(Json(StoriesResponse {
        stories: stories.into_iter().map(StoryDetailsResponse::listing).collect(),
    }))
}

/// GET /posts/{id} - A public story, or one of the caller's own
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Story id")),
    responses(
        (status = 200, description = "The story with illustrations and audio", body = StoryDetailsEnvelope),
        (status = 404, description = "No such story, or it is private", body = ErrorResponse)
    )
)]
pub async fn get_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(viewer)): Extension<MaybeUser>,
    Path(id): Path<i64>,
) -> Result<Json<StoryDetailsEnvelope>, AppError> {
    let details = state
        .db
        .get_visible_story(id, viewer.as_ref().map(|u| u.id))
        .await?;
    Ok(Json(StoryDetailsEnvelope {
        story: StoryDetailsResponse::full(details),
    }))
}

//=========================================================================================
// Writing
//=========================================================================================

/// POST /posts - Generate a new story with an illustration
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = StoryRequestBody,
    responses(
        (status = 201, description = "Story created", body = CreateStoryResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Story generation failed")
    )
)]
pub async fn create_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<StoryRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    let creation = pipeline::create_story(&state, &user, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateStoryResponse {
            story: creation.story.into(),
            illustration: creation.illustration.completed().map(Into::into),
        }),
    ))
}

/// PUT /posts/{id} - Edit the title and body of an owned story
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Story id")),
    request_body = StoryUpdateBody,
    responses(
        (status = 200, description = "Story updated", body = StoryEnvelope),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    )
)]
pub async fn update_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<StoryUpdateBody>,
) -> Result<Json<StoryEnvelope>, AppError> {
    let StoryUpdate { title, content } = update;
    let story = state
        .db
        .update_story_content(id, user.id, &title, &content)
        .await?;
    info!(story_id = id, "Story updated");
    Ok(Json(StoryEnvelope { story: story.into() }))
}

async fn set_visibility(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    is_public: bool,
) -> Result<Json<StoryEnvelope>, AppError> {
    let story = state.db.set_story_visibility(id, user.id, is_public).await?;
    info!(story_id = id, is_public, "Story visibility changed");
    Ok(Json(StoryEnvelope { story: story.into() }))
}

/// PATCH /posts/{id}/publish - Make an owned story public
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}/publish",
    params(("id" = i64, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story published", body = StoryEnvelope),
        (status = 404, description = "Story not found", body = ErrorResponse)
    )
)]
pub async fn publish_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<StoryEnvelope>, AppError> {
    set_visibility(&state, &user, id, true).await
}

/// PATCH /posts/{id}/unpublish - Make an owned story private again
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}/unpublish",
    params(("id" = i64, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story unpublished", body = StoryEnvelope),
        (status = 404, description = "Story not found", body = ErrorResponse)
    )
)]
pub async fn unpublish_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<StoryEnvelope>, AppError> {
    set_visibility(&state, &user, id, false).await
}

//=========================================================================================
// Narration
//=========================================================================================

/// POST /posts/{id}/generate-audio - Queue narration of an owned story
///
/// Answers 200 instead of 202 when a narration is already waiting or running;
/// nothing new is queued in that case.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/generate-audio",
    params(("id" = i64, Path, description = "Story id")),
    request_body = AudioRequestBody,
    responses(
        (status = 202, description = "Narration queued", body = AudioQueuedResponse),
        (status = 200, description = "Narration already queued or running", body = AudioQueuedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    )
)]
pub async fn generate_audio_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidatedJson(voice): ValidatedJson<AudioRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    match pipeline::request_audio(&state, &user, id, voice).await {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(AudioQueuedResponse {
                story_id: id,
                audio_status: AudioStatus::Queued.to_string(),
                message: "Audio generation has been queued.".to_string(),
            }),
        )),
        Err(PipelineError::AlreadyInProgress { story_id, status }) => Ok((
            StatusCode::OK,
            Json(AudioQueuedResponse {
                story_id,
                audio_status: status.to_string(),
                message: "Audio generation is already in progress.".to_string(),
            }),
        )),
        Err(e) => Err(e.into()),
    }
}

//=========================================================================================
// Deletion
//=========================================================================================

/// DELETE /posts/{id} - Delete an owned story with its assets
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story deleted", body = MessageResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    )
)]
pub async fn delete_post_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    pipeline::delete_story(&state, &user, id).await?;
    Ok(Json(MessageResponse {
        message: "Story deleted.".to_string(),
    }))
}

/// DELETE /posts/audios/{id} - Delete one narration of an owned story
#[utoipa::path(
    delete,
    path = "/api/v1/posts/audios/{id}",
    params(("id" = i64, Path, description = "Audio id")),
    responses(
        (status = 200, description = "Audio deleted", body = MessageResponse),
        (status = 404, description = "Audio not found", body = ErrorResponse)
    )
)]
pub async fn delete_audio_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    pipeline::delete_audio(&state, &user, id).await?;
    Ok(Json(MessageResponse {
        message: "Audio deleted.".to_string(),
    }))
}
