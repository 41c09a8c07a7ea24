//! services/api/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `SpeechGenerationService` port from the `core` crate and
//! always asks for raw PCM so the narration pipeline can build its own WAV file.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use monogatari_core::domain::NarrationVoice;
use monogatari_core::ports::{PortError, PortResult, SpeechGenerationService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SpeechGenerationService` using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: SpeechModel) -> Self {
        Self { client, model }
    }
}

fn to_openai_voice(voice: NarrationVoice) -> Voice {
    match voice {
        NarrationVoice::Alloy => Voice::Alloy,
        NarrationVoice::Echo => Voice::Echo,
        NarrationVoice::Fable => Voice::Fable,
        NarrationVoice::Onyx => Voice::Onyx,
        NarrationVoice::Nova => Voice::Nova,
        NarrationVoice::Shimmer => Voice::Shimmer,
    }
}

//=========================================================================================
// `SpeechGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechGenerationService for OpenAiTtsAdapter {
    /// Returns 24 kHz 16-bit little-endian mono PCM for the given text.
    async fn generate_speech(
        &self,
        text: &str,
        voice: NarrationVoice,
        instructions: &str,
    ) -> PortResult<Option<Vec<u8>>> {
        let request = CreateSpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: to_openai_voice(voice),
            instructions: Some(instructions.to_string()),
            response_format: Some(SpeechResponseFormat::Pcm),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .speech()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if response.bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(response.bytes.to_vec()))
    }
}
