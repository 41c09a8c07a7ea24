//! crates/monogatari_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! story pipeline to be independent of the hosted database, auth provider,
//! object storage, AI API and queue it talks to in production.

use crate::domain::{
    Audio, AudioJob, AudioStatus, AuthUser, Illustration, NarrationVoice, NewAudio,
    NewIllustration, QueuedAudioJob, SignIn, SignUp, Story, StoryDetails,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Stories ---
    async fn create_story(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Story>;

    /// Lists the user's stories newest first, with illustrations attached.
    /// `limit` of `None` returns all of them.
    async fn list_stories(&self, user_id: Uuid, limit: Option<i64>) -> PortResult<Vec<StoryDetails>>;

    /// Fetches a story the viewer may see: public stories, or stories the viewer owns.
    async fn get_visible_story(&self, story_id: i64, viewer: Option<Uuid>) -> PortResult<StoryDetails>;

    /// Fetches a story only if it belongs to `user_id`.
    async fn get_owned_story(&self, story_id: i64, user_id: Uuid) -> PortResult<StoryDetails>;

    /// Privileged read used by the queue consumer.
    async fn get_story(&self, story_id: i64) -> PortResult<Story>;

    async fn update_story_content(
        &self,
        story_id: i64,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> PortResult<Story>;

    async fn set_story_visibility(&self, story_id: i64, user_id: Uuid, is_public: bool) -> PortResult<Story>;

    /// Deletes the story row; illustrations and audio rows cascade.
    async fn delete_story(&self, story_id: i64, user_id: Uuid) -> PortResult<()>;

    // --- Narration status ---

    /// Atomically moves an owned, idle story to `queued`.
    /// Returns `false` when the story is already queued or in progress.
    async fn try_mark_audio_queued(&self, story_id: i64, user_id: Uuid) -> PortResult<bool>;

    async fn set_audio_status(&self, story_id: i64, status: AudioStatus) -> PortResult<()>;

    // --- Assets ---
    async fn insert_illustration(&self, illustration: NewIllustration) -> PortResult<Illustration>;

    async fn insert_audio(&self, audio: NewAudio) -> PortResult<Audio>;

    /// Fetches an audio row whose parent story belongs to `user_id`.
    async fn get_owned_audio(&self, audio_id: i64, user_id: Uuid) -> PortResult<Audio>;

    async fn delete_audio(&self, audio_id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<SignUp>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<SignIn>;

    /// Resolves a bearer token to the user it was issued for.
    async fn get_user(&self, access_token: &str) -> PortResult<AuthUser>;
}

#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> PortResult<()>;

    /// Removes the given object paths from a bucket.
    async fn remove(&self, bucket: &str, paths: &[String]) -> PortResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Inverse of [`ObjectStorageService::public_url`]; `None` for foreign URLs.
    fn object_path(&self, bucket: &str, public_url: &str) -> Option<String>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends one prompt and returns the model's raw text reply.
    async fn generate_text(&self, prompt: &str) -> PortResult<String>;
}

/// Supported image shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape16x9,
    Square,
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates one image and returns its base64 payload, or `None` when the
    /// model answered without an image.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> PortResult<Option<String>>;
}

#[async_trait]
pub trait SpeechGenerationService: Send + Sync {
    /// Returns raw 16-bit little-endian mono PCM at 24 kHz, or `None` when the
    /// response carried no audio.
    async fn generate_speech(
        &self,
        text: &str,
        voice: NarrationVoice,
        instructions: &str,
    ) -> PortResult<Option<Vec<u8>>>;
}

/// What happened to a job handed back after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Requeued,
    DeadLettered,
}

#[async_trait]
pub trait AudioJobQueue: Send + Sync {
    async fn send(&self, job: &AudioJob) -> PortResult<()>;

    /// Claims up to `max` visible jobs. A claimed job becomes visible again after
    /// `visibility_timeout` unless it is acked or retried first.
    async fn receive(&self, max: i64, visibility_timeout: Duration) -> PortResult<Vec<QueuedAudioJob>>;

    async fn ack(&self, delivery_id: i64) -> PortResult<()>;

    async fn retry(&self, delivery: &QueuedAudioJob, error: &str) -> PortResult<RetryDisposition>;
}
