//! services/api/src/adapters/image.rs
//!
//! This module contains the adapter for the image generation endpoint of an
//! OpenAI-compatible API. It implements the `ImageGenerationService` port and
//! requests base64 payloads so nothing depends on a short-lived hosted URL.

use async_trait::async_trait;
use monogatari_core::ports::{AspectRatio, ImageGenerationService, PortError, PortResult};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// An adapter that implements `ImageGenerationService` over the images REST API.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiImageAdapter {
    /// Creates a new `OpenAiImageAdapter`. `base_url` ends in `/v1`.
    pub fn new(http: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }
}

fn size_for(aspect_ratio: AspectRatio) -> &'static str {
    match aspect_ratio {
        AspectRatio::Landscape16x9 => "1792x1024",
        AspectRatio::Square => "1024x1024",
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> PortResult<Option<String>> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: size_for(aspect_ratio),
            response_format: "b64_json",
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Image generation failed with {}: {}",
                status, text
            )));
        }

        let body = response
            .json::<ImageResponse>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid image response: {}", e)))?;

        Ok(body
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .filter(|b64| !b64.is_empty()))
    }
}
