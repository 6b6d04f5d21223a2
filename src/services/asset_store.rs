use crate::config::CloudinaryConfig;
use crate::models::{MediaType, RemoteAssetHandle, TransformParameters, UploadReceipt};
use crate::services::stage::UpscaleError;
use crate::services::transform::build_transform_url;
use crate::utils::signature::sign_params;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Remote store that accepts uploads and serves URL-based transforms
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Provider identifier (e.g., "cloudinary")
    fn provider_id(&self) -> &'static str;

    /// Upload a local file under a caller-chosen public identifier
    async fn upload_asset(
        &self,
        path: &Path,
        media_type: MediaType,
        handle: &RemoteAssetHandle,
    ) -> Result<UploadReceipt, UpscaleError>;

    /// Deterministic URL that asks the store to upscale an uploaded asset
    fn transform_url(&self, handle: &RemoteAssetHandle, params: &TransformParameters) -> String;

    /// Fetch the bytes behind a transform URL
    async fn fetch_transformed(&self, url: &str) -> Result<Bytes, UpscaleError>;

    /// Check if the store is reachable and accepts our credentials
    async fn health_check(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

pub struct CloudinaryAssetStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryAssetStore {
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    /// Pulls `error.message` out of an error response, falling back to the raw body
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        if message.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, message)
        }
    }
}

#[async_trait]
impl AssetStore for CloudinaryAssetStore {
    fn provider_id(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload_asset(
        &self,
        path: &Path,
        media_type: MediaType,
        handle: &RemoteAssetHandle,
    ) -> Result<UploadReceipt, UpscaleError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("upload.{}", media_type.extension()));

        let timestamp = Utc::now().timestamp().to_string();
        let signed = [
            ("public_id", handle.as_str().to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign_params(
            &signed,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(media_type.mime())
            .map_err(|e| UpscaleError::RemoteUpload(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", handle.as_str().to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.api_url("image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| UpscaleError::RemoteUpload(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(UpscaleError::RemoteUpload(
                Self::error_message(response).await,
            ));
        }

        let receipt: UploadReceipt = response
            .json()
            .await
            .map_err(|e| UpscaleError::RemoteUpload(format!("Invalid upload response: {}", e)))?;

        if receipt.public_id != handle.as_str() {
            warn!(
                "⚠️  Store renamed asset {} to {}",
                handle, receipt.public_id
            );
        }

        info!(
            "☁️  Uploaded {} ({}x{} {})",
            receipt.public_id,
            receipt.width.unwrap_or_default(),
            receipt.height.unwrap_or_default(),
            receipt.format.as_deref().unwrap_or("?")
        );
        Ok(receipt)
    }

    fn transform_url(&self, handle: &RemoteAssetHandle, params: &TransformParameters) -> String {
        build_transform_url(
            &self.config.delivery_base_url,
            &self.config.cloud_name,
            handle,
            params,
        )
    }

    async fn fetch_transformed(&self, url: &str) -> Result<Bytes, UpscaleError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpscaleError::RemoteFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpscaleError::RemoteFetch(
                Self::error_message(response).await,
            ));
        }

        response
            .bytes()
            .await
            .map_err(|e| UpscaleError::RemoteFetch(e.to_string()))
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("ping"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
