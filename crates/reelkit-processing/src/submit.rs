//! Submission: export every asset of a batch and hand the files to the
//! upload collaborator.

use async_trait::async_trait;
use reelkit_core::models::{AssetDescriptor, MediaAsset, MediaFile};
use reelkit_core::PipelineError;
use serde::Serialize;
use uuid::Uuid;

use crate::export::ExportPipeline;

const GENERIC_UPLOAD_MESSAGE: &str = "Upload failed. Please try again.";
/// Share of each asset's progress slice spent exporting; the rest is upload.
const EXPORT_SHARE: f64 = 0.8;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload rejected with status {status}")]
    Http { status: u16, body: String },
}

impl UploadError {
    /// Message to show the user: the server's own message when its body
    /// carries one, otherwise a generic one.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Network(_) => GENERIC_UPLOAD_MESSAGE.to_string(),
            UploadError::Http { body, .. } => {
                extract_error_message(body).unwrap_or_else(|| GENERIC_UPLOAD_MESSAGE.to_string())
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Network(_) => true,
            UploadError::Http { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

/// First non-empty `message`, `error` or `detail` string of a JSON error
/// body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// External upload collaborator (HTTP multipart in production).
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `file` and return its public URL.
    async fn upload(&self, file: &MediaFile) -> Result<String, UploadError>;
}

/// The only failure a submission surfaces. The batch stays untouched in
/// memory, so retrying is calling `submit` again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SubmissionFailure {
    pub file_name: String,
    pub message: String,
    pub retryable: bool,
}

impl From<SubmissionFailure> for PipelineError {
    fn from(failure: SubmissionFailure) -> Self {
        PipelineError::Upload(format!("{}: {}", failure.file_name, failure.message))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedAsset {
    pub asset_id: Uuid,
    pub url: String,
    pub cover_url: Option<String>,
    pub descriptor: AssetDescriptor,
    /// Set when the source was uploaded in place of a rendered file.
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub assets: Vec<UploadedAsset>,
}

impl Submission {
    pub fn fallback_count(&self) -> usize {
        self.assets.iter().filter(|a| a.fallback.is_some()).count()
    }
}

pub struct SubmissionPipeline<U: Uploader> {
    export: ExportPipeline,
    uploader: U,
}

impl<U: Uploader> SubmissionPipeline<U> {
    pub fn new(export: ExportPipeline, uploader: U) -> Self {
        Self { export, uploader }
    }

    async fn upload(&self, file: &MediaFile) -> Result<String, SubmissionFailure> {
        self.uploader.upload(file).await.map_err(|e| {
            tracing::error!(file_name = %file.file_name, error = %e, "Upload failed");
            SubmissionFailure {
                file_name: file.file_name.clone(),
                message: e.user_message(),
                retryable: e.is_retryable(),
            }
        })
    }

    /// Export and upload `assets` in order. `progress` goes from 0 to 100
    /// across the whole batch. Export problems fall back to source files;
    /// only upload failures are returned.
    #[tracing::instrument(skip(self, assets, progress), fields(count = assets.len()))]
    pub async fn submit<F>(
        &self,
        assets: &[MediaAsset],
        mut progress: F,
    ) -> Result<Submission, SubmissionFailure>
    where
        F: FnMut(f64) + Send,
    {
        progress(0.0);
        let slice = 100.0 / assets.len().max(1) as f64;
        let mut uploaded = Vec::with_capacity(assets.len());

        for (index, asset) in assets.iter().enumerate() {
            let base = index as f64 * slice;
            let exported = self
                .export
                .export_asset(asset, |p| progress(base + p / 100.0 * slice * EXPORT_SHARE))
                .await;
            if let Some(reason) = &exported.fallback {
                tracing::warn!(
                    asset_id = %exported.asset_id,
                    reason = %reason,
                    "Submitting source file"
                );
            }

            let url = self.upload(&exported.file).await?;
            let cover_url = match &exported.cover {
                Some(cover) => Some(self.upload(cover).await?),
                None => None,
            };
            progress(base + slice);

            uploaded.push(UploadedAsset {
                asset_id: exported.asset_id,
                url,
                cover_url,
                descriptor: exported.descriptor,
                fallback: exported.fallback,
            });
        }

        progress(100.0);
        tracing::info!(assets = uploaded.len(), "Submission complete");
        Ok(Submission { assets: uploaded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_fields() {
        assert_eq!(
            extract_error_message(r#"{"message": "Caption too long"}"#).as_deref(),
            Some("Caption too long")
        );
        assert_eq!(
            extract_error_message(r#"{"error": "quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            extract_error_message(r#"{"detail": "Not authenticated"}"#).as_deref(),
            Some("Not authenticated")
        );
        assert_eq!(
            extract_error_message(r#"{"message": "", "error": "fallback"}"#).as_deref(),
            Some("fallback")
        );
    }

    #[test]
    fn test_extract_error_message_unusable_bodies() {
        assert_eq!(extract_error_message("<html>502</html>"), None);
        assert_eq!(extract_error_message(r#"{"code": 17}"#), None);
        assert_eq!(extract_error_message(r#"{"error": {"code": 17}}"#), None);
    }

    #[test]
    fn test_upload_error_classification() {
        let server = UploadError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert_eq!(server.user_message(), GENERIC_UPLOAD_MESSAGE);

        let client = UploadError::Http {
            status: 413,
            body: r#"{"detail": "File too large"}"#.to_string(),
        };
        assert!(!client.is_retryable());
        assert_eq!(client.user_message(), "File too large");

        assert!(UploadError::Http {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(UploadError::Network("reset".to_string()).is_retryable());
    }

    #[test]
    fn test_failure_converts_to_upload_error() {
        let failure = SubmissionFailure {
            file_name: "a.jpg".to_string(),
            message: "nope".to_string(),
            retryable: false,
        };
        assert!(matches!(
            PipelineError::from(failure),
            PipelineError::Upload(m) if m == "a.jpg: nope"
        ));
    }
}
