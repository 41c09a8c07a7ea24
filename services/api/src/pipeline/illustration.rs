//! services/api/src/pipeline/illustration.rs
//!
//! Generates an illustration for a saved story, stores the image and records it.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::web::state::{AppState, ILLUSTRATIONS_BUCKET};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use monogatari_core::domain::{Illustration, NewIllustration, Story};
use monogatari_core::ports::AspectRatio;
use tracing::{error, info};

/// Object path of a new illustration: `{user}/{story}/{unix_millis}.png`.
pub fn illustration_path(story: &Story, timestamp_millis: i64) -> String {
    format!("{}/{}/{}.png", story.user_id, story.id, timestamp_millis)
}

/// Runs image generation → upload → DB insert for one story.
///
/// Callers treat every error as non-fatal: the story is already committed.
pub async fn create_illustration(
    app_state: &AppState,
    story: &Story,
    prompt: &str,
) -> PipelineResult<Illustration> {
    info!(story_id = story.id, "Generating illustration");

    let encoded = app_state
        .image_adapter
        .generate_image(prompt, AspectRatio::Landscape16x9)
        .await?
        .ok_or(PipelineError::NoImageReturned)?;
    let image = STANDARD
        .decode(encoded.trim())
        .map_err(|_| PipelineError::NoImageReturned)?;

    let path = illustration_path(story, Utc::now().timestamp_millis());
    app_state
        .storage
        .upload(ILLUSTRATIONS_BUCKET, &path, Bytes::from(image), "image/png")
        .await
        .map_err(|e| {
            error!(story_id = story.id, "Error uploading illustration to storage: {}", e);
            PipelineError::StorageUpload(e.to_string())
        })?;

    let image_url = app_state.storage.public_url(ILLUSTRATIONS_BUCKET, &path);
    let illustration = app_state
        .db
        .insert_illustration(NewIllustration {
            story_id: story.id,
            image_url,
            prompt: prompt.to_string(),
        })
        .await?;

    info!(story_id = story.id, illustration_id = illustration.id, "Illustration saved");
    Ok(illustration)
}
