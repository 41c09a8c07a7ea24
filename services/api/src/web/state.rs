//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use monogatari_core::ports::{
    AudioJobQueue, AuthService, DatabaseService, ImageGenerationService, ObjectStorageService,
    SpeechGenerationService, TextGenerationService,
};
use std::sync::Arc;

/// Bucket holding story illustrations.
pub const ILLUSTRATIONS_BUCKET: &str = "illustrations";

/// Bucket holding narrated audio.
pub const AUDIO_BUCKET: &str = "audio";

/// The shared application state, created once at startup and passed to all
/// handlers and to the queue worker. Nothing in it is mutable.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub storage: Arc<dyn ObjectStorageService>,
    pub text_adapter: Arc<dyn TextGenerationService>,
    pub image_adapter: Arc<dyn ImageGenerationService>,
    pub speech_adapter: Arc<dyn SpeechGenerationService>,
    pub audio_queue: Arc<dyn AudioJobQueue>,
}
