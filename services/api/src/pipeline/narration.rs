//! services/api/src/pipeline/narration.rs
//!
//! Producer and consumer halves of the narration job.
//!
//! The producer runs inside a request and only flips the story to `queued` and
//! enqueues `{story_id, voice}`. The consumer runs in the queue worker with
//! privileged access and re-reads the story, so edits made while the job waited
//! are what gets narrated.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::prompts::{narration_text, NARRATION_INSTRUCTIONS};
use crate::pipeline::wav::{pcm16_to_wav, SPEECH_SAMPLE_RATE};
use crate::web::state::{AppState, AUDIO_BUCKET};
use bytes::Bytes;
use chrono::Utc;
use monogatari_core::domain::{Audio, AudioJob, AudioStatus, AuthUser, NarrationVoice, NewAudio, Story};
use monogatari_core::ports::PortError;
use tracing::{error, info, warn};

/// Object path of a new narration: `{user}/{story}/{unix_millis}_{voice}.wav`.
pub fn audio_path(story: &Story, voice: NarrationVoice, timestamp_millis: i64) -> String {
    format!("{}/{}/{}_{}.wav", story.user_id, story.id, timestamp_millis, voice)
}

/// Queues narration of an owned story.
///
/// Fails with `AlreadyInProgress` without enqueueing anything when a job for the
/// story is already waiting or running.
pub async fn request_audio(
    app_state: &AppState,
    user: &AuthUser,
    story_id: i64,
    voice: NarrationVoice,
) -> PipelineResult<()> {
    let details = app_state
        .db
        .get_owned_story(story_id, user.id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => PipelineError::Authorization(story_id),
            other => PipelineError::Port(other),
        })?;

    let status = details.story.audio_status;
    if !status.accepts_new_request() {
        return Err(PipelineError::AlreadyInProgress { story_id, status });
    }

    // Another request may have won the race since the read above.
    if !app_state.db.try_mark_audio_queued(story_id, user.id).await? {
        return Err(PipelineError::AlreadyInProgress {
            story_id,
            status: AudioStatus::Queued,
        });
    }

    let job = AudioJob { story_id, voice };
    if let Err(e) = app_state.audio_queue.send(&job).await {
        error!(story_id, "Failed to enqueue narration job: {}", e);
        if let Err(status_err) = app_state.db.set_audio_status(story_id, AudioStatus::Failed).await {
            error!(story_id, "Failed to mark story as failed: {}", status_err);
        }
        return Err(e.into());
    }

    info!(story_id, voice = %voice, "Narration job queued");
    Ok(())
}

async fn narrate(app_state: &AppState, job: &AudioJob) -> PipelineResult<Audio> {
    app_state
        .db
        .set_audio_status(job.story_id, AudioStatus::InProgress)
        .await?;
    let story = app_state.db.get_story(job.story_id).await?;

    let text = narration_text(&story.title, &story.content);
    let pcm = app_state
        .speech_adapter
        .generate_speech(&text, job.voice, NARRATION_INSTRUCTIONS)
        .await?
        .filter(|pcm| !pcm.is_empty())
        .ok_or(PipelineError::NoAudioReturned)?;

    let wav = pcm16_to_wav(&pcm, SPEECH_SAMPLE_RATE)
        .map_err(|e| PipelineError::AudioEncoding(e.to_string()))?;

    let path = audio_path(&story, job.voice, Utc::now().timestamp_millis());
    app_state
        .storage
        .upload(AUDIO_BUCKET, &path, Bytes::from(wav), "audio/wav")
        .await
        .map_err(|e| PipelineError::StorageUpload(e.to_string()))?;

    let audio = app_state
        .db
        .insert_audio(NewAudio {
            story_id: story.id,
            audio_url: app_state.storage.public_url(AUDIO_BUCKET, &path),
            voice: job.voice.to_string(),
        })
        .await?;

    app_state
        .db
        .set_audio_status(job.story_id, AudioStatus::Completed)
        .await?;
    Ok(audio)
}

/// Processes one delivered narration job.
///
/// On failure the story is marked `failed` and the error is returned so the
/// queue can redeliver or dead-letter the job.
pub async fn process_audio_job(app_state: &AppState, job: &AudioJob) -> PipelineResult<Audio> {
    info!(story_id = job.story_id, voice = %job.voice, "Processing narration job");

    match narrate(app_state, job).await {
        Ok(audio) => {
            info!(story_id = job.story_id, audio_id = audio.id, "Narration completed");
            Ok(audio)
        }
        Err(e) => {
            error!(story_id = job.story_id, "Narration failed: {}", e);
            if let Err(status_err) = app_state
                .db
                .set_audio_status(job.story_id, AudioStatus::Failed)
                .await
            {
                warn!(story_id = job.story_id, "Could not mark story as failed: {}", status_err);
            }
            Err(e)
        }
    }
}
