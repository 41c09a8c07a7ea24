//! services/api/src/pipeline/cleanup.rs
//!
//! Deletion of stories and narrations together with their stored objects.
//! Object removal is best effort; the database rows are what must go.

use crate::pipeline::error::PipelineResult;
use crate::web::state::{AppState, AUDIO_BUCKET, ILLUSTRATIONS_BUCKET};
use monogatari_core::domain::AuthUser;
use tracing::{info, warn};

/// Removes the objects behind `urls` from `bucket`, logging any failure.
async fn remove_objects<'a>(app_state: &AppState, bucket: &str, urls: impl Iterator<Item = &'a str>) {
    let paths: Vec<String> = urls
        .filter_map(|url| {
            let path = app_state.storage.object_path(bucket, url);
            if path.is_none() {
                warn!(bucket, url, "Skipping object outside of storage bucket");
            }
            path
        })
        .collect();
    if paths.is_empty() {
        return;
    }
    if let Err(e) = app_state.storage.remove(bucket, &paths).await {
        warn!(bucket, count = paths.len(), "Failed to remove stored objects: {}", e);
    }
}

/// Deletes an owned story, its illustrations and its narrations.
pub async fn delete_story(app_state: &AppState, user: &AuthUser, story_id: i64) -> PipelineResult<()> {
    let details = app_state.db.get_owned_story(story_id, user.id).await?;

    remove_objects(
        app_state,
        ILLUSTRATIONS_BUCKET,
        details.illustrations.iter().map(|i| i.image_url.as_str()),
    )
    .await;
    remove_objects(app_state, AUDIO_BUCKET, details.audios.iter().map(|a| a.audio_url.as_str())).await;

    app_state.db.delete_story(story_id, user.id).await?;
    info!(story_id, "Story deleted");
    Ok(())
}

/// Deletes one narration belonging to one of the user's stories.
pub async fn delete_audio(app_state: &AppState, user: &AuthUser, audio_id: i64) -> PipelineResult<()> {
    let audio = app_state.db.get_owned_audio(audio_id, user.id).await?;

    remove_objects(app_state, AUDIO_BUCKET, std::iter::once(audio.audio_url.as_str())).await;

    app_state.db.delete_audio(audio.id).await?;
    info!(audio_id, story_id = audio.story_id, "Audio deleted");
    Ok(())
}
