//! services/api/src/pipeline/error.rs
//!
//! Errors raised by the story, illustration and narration pipelines.

use crate::pipeline::envelope::EnvelopeError;
use monogatari_core::domain::AudioStatus;
use monogatari_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The model reply did not match the requested JSON envelope.
    #[error("Generated text had an unexpected format: {0}")]
    GenerationFormat(String),

    #[error("The image model returned no image")]
    NoImageReturned,

    #[error("The speech model returned no audio")]
    NoAudioReturned,

    #[error("Failed to upload to storage: {0}")]
    StorageUpload(String),

    /// The caller does not own the story (or it does not exist).
    #[error("Story {0} is not accessible to this user")]
    Authorization(i64),

    #[error("Narration for story {story_id} is already {status}")]
    AlreadyInProgress { story_id: i64, status: AudioStatus },

    #[error("Failed to encode audio: {0}")]
    AudioEncoding(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl From<EnvelopeError> for PipelineError {
    fn from(e: EnvelopeError) -> Self {
        PipelineError::GenerationFormat(e.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
