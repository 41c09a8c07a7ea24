//! services/api/src/adapters/storage.rs
//!
//! This module contains the adapter for hosted object storage (a Supabase
//! compatible Storage REST API). It implements the `ObjectStorageService` port and
//! always authenticates with the privileged service key.

use async_trait::async_trait;
use bytes::Bytes;
use monogatari_core::ports::{ObjectStorageService, PortError, PortResult};
use serde::Serialize;

/// Seconds browsers may cache uploaded assets.
const CACHE_CONTROL_SECS: u32 = 3600;

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

/// An adapter that implements `ObjectStorageService` against the storage REST API.
#[derive(Clone)]
pub struct SupabaseStorageAdapter {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorageAdapter {
    /// Creates a new `SupabaseStorageAdapter`.
    pub fn new(http: reqwest::Client, base_url: String, service_key: String) -> Self {
        Self {
            http,
            base_url,
            service_key,
        }
    }

    fn public_prefix(&self, bucket: &str) -> String {
        format!("{}/storage/v1/object/public/{}/", self.base_url, bucket)
    }
}

#[async_trait]
impl ObjectStorageService for SupabaseStorageAdapter {
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> PortResult<()> {
        let response = self
            .http
            .post(format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, format!("max-age={}", CACHE_CONTROL_SECS))
            .header("x-upsert", "false")
            .body(body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Upload to {}/{} failed with {}: {}",
                bucket, path, status, text
            )));
        }
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> PortResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .http
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Removing objects from {} failed with {}: {}",
                bucket, status, text
            )));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}{}", self.public_prefix(bucket), path)
    }

    fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        public_url
            .strip_prefix(&self.public_prefix(bucket))
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}
