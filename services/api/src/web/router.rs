//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router. Routes are grouped by how they authenticate:
//! public, protected, and the story read route where signing in is optional.

use crate::web::{
    auth::{login_handler, me_handler, signup_handler},
    middleware::{optional_auth, require_auth},
    posts::{
        create_post_handler, delete_audio_handler, delete_post_handler, generate_audio_handler,
        get_post_handler, latest_posts_handler, list_posts_handler, publish_post_handler,
        unpublish_post_handler, update_post_handler,
    },
    rest::health_handler,
    state::AppState,
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the `/api` router with state applied. CORS and Swagger UI are added
/// by the binary.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let require = || axum_middleware::from_fn_with_state(app_state.clone(), require_auth);
    let optional = || axum_middleware::from_fn_with_state(app_state.clone(), optional_auth);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/latest", get(latest_posts_handler))
        .route("/posts/{id}/publish", patch(publish_post_handler))
        .route("/posts/{id}/unpublish", patch(unpublish_post_handler))
        .route("/posts/{id}/generate-audio", post(generate_audio_handler))
        .route("/posts/audios/{id}", delete(delete_audio_handler))
        .layer(require());

    // Reading a story allows anonymous callers; changing it does not.
    let story_route = get(get_post_handler)
        .layer(optional())
        .merge(put(update_post_handler).delete(delete_post_handler).layer(require()));

    let v1 = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/posts/{id}", story_route);

    Router::new()
        .route("/api/health", get(health_handler))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
