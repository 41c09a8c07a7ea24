//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health check.

use crate::web::{auth, error, posts, validation};
use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::me_handler,
        posts::list_posts_handler,
        posts::latest_posts_handler,
        posts::get_post_handler,
        posts::create_post_handler,
        posts::update_post_handler,
        posts::publish_post_handler,
        posts::unpublish_post_handler,
        posts::generate_audio_handler,
        posts::delete_post_handler,
        posts::delete_audio_handler,
    ),
    components(
        schemas(
            HealthResponse,
            error::ErrorResponse,
            error::FieldIssue,
            validation::CredentialsBody,
            validation::StoryRequestBody,
            validation::StoryUpdateBody,
            validation::AudioRequestBody,
            auth::AuthResponse,
            auth::UserResponse,
            auth::SessionResponse,
            auth::MeResponse,
            posts::StoryResponse,
            posts::StoryDetailsResponse,
            posts::IllustrationResponse,
            posts::AudioResponse,
            posts::StoriesResponse,
            posts::StoryEnvelope,
            posts::StoryDetailsEnvelope,
            posts::CreateStoryResponse,
            posts::AudioQueuedResponse,
            posts::MessageResponse,
        )
    ),
    tags(
        (name = "Monogatari Weavers API", description = "Generate, illustrate and narrate children's stories.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /api/health - Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
