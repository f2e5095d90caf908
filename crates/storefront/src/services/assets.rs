//! Product image hosting.
//!
//! Admin uploads are pushed to Cloudinary with an unsigned upload preset;
//! the returned public URL is what gets stored on the product.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use sparktizen_core::ImageRef;

use crate::config::CloudinaryConfig;

/// Cloudinary upload API base URL.
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Errors that can occur when uploading an image.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Image hosting is not configured for this deployment.
    #[error("image hosting is not configured")]
    NotConfigured,

    /// The upload was empty.
    #[error("image file {0} is empty")]
    EmptyFile(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The host refused the upload.
    #[error("upload rejected: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Uploads images and returns their public URLs.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Upload one image.
    async fn upload_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageRef, AssetError>;
}

/// Cloudinary unsigned-upload client.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    /// Create a client for the configured cloud.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: upload_endpoint(&config.cloud_name),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
        }
    }
}

/// Image upload URL for a cloud.
fn upload_endpoint(cloud_name: &str) -> String {
    format!("{CLOUDINARY_API_BASE}/{cloud_name}/image/upload")
}

#[async_trait]
impl AssetGateway for CloudinaryClient {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageRef, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::EmptyFile(filename.to_owned()));
        }

        let file = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(url = %uploaded.secure_url, "Image uploaded");
        Ok(ImageRef::new(uploaded.secure_url))
    }
}

/// Pull the human-readable message out of an error body, if it has one.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_owned(), |e| e.error.message)
}

/// Gateway used when image hosting is not configured. Every upload fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAssets;

#[async_trait]
impl AssetGateway for DisabledAssets {
    async fn upload_image(
        &self,
        _filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<ImageRef, AssetError> {
        Err(AssetError::NotConfigured)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_endpoint() {
        assert_eq!(
            upload_endpoint("demo"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message(r#"{"error":{"message":"Upload preset not found"}}"#),
            "Upload preset not found"
        );
        assert_eq!(rejection_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_empty_file_rejected_before_upload() {
        let client = CloudinaryClient::new(&CloudinaryConfig {
            cloud_name: "demo".to_owned(),
            upload_preset: "unsigned".to_owned(),
            folder: "products".to_owned(),
        });
        let err = client
            .upload_image("a.png", "image/png", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::EmptyFile(_)));
    }

    #[tokio::test]
    async fn test_disabled_assets() {
        let err = DisabledAssets
            .upload_image("a.png", "image/png", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NotConfigured));
    }
}
