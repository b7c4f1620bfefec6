//! Batch ingestion: validate selected files and probe them into assets.

use reelkit_core::models::{MediaAsset, MediaFile, MediaKind};
use reelkit_core::{PipelineConfig, PipelineError};
use serde::Serialize;
use std::sync::Arc;

use crate::handles::HandleRegistry;
use crate::image::ImageProcessor;
use crate::metadata::VideoMetadata;
use crate::traits::MediaProcessor;
use crate::validator::{CreationMode, MediaValidator};
use crate::video::{MediaHost, PlaybackGuard};

/// A file left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Accepted assets, in selection order.
    pub assets: Vec<MediaAsset>,
    pub rejected: Vec<RejectedFile>,
}

/// Load `file` into a playback element just long enough to read its
/// metadata. The element and handle are released before returning.
pub async fn probe_video(
    host: &dyn MediaHost,
    registry: &HandleRegistry,
    file: &MediaFile,
) -> Result<VideoMetadata, PipelineError> {
    let handle = registry.register(file);
    let playback = PlaybackGuard::new(host.open_playback(&handle).await?);

    let duration = playback.duration();
    let (width, height) = playback.natural_size();
    if !(duration.is_finite() && duration > 0.0) || width == 0 || height == 0 {
        return Err(PipelineError::NotReady(format!(
            "{} reported no usable metadata",
            file.file_name
        )));
    }

    Ok(VideoMetadata {
        duration,
        width,
        height,
        mime_type: file.mime_type.clone(),
        size_bytes: Some(file.len() as u64),
    })
}

pub struct Ingestor {
    host: Arc<dyn MediaHost>,
    registry: HandleRegistry,
    validator: MediaValidator,
    images: ImageProcessor,
}

impl Ingestor {
    pub fn new(
        host: Arc<dyn MediaHost>,
        registry: HandleRegistry,
        validator: MediaValidator,
    ) -> Self {
        Self {
            host,
            registry,
            validator,
            images: ImageProcessor,
        }
    }

    pub fn from_config(
        host: Arc<dyn MediaHost>,
        registry: HandleRegistry,
        mode: CreationMode,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(host, registry, MediaValidator::from_config(mode, config))
    }

    /// Turn one selected file into an asset.
    pub async fn ingest(&self, file: MediaFile) -> Result<MediaAsset, PipelineError> {
        let kind = self
            .validator
            .validate(&file)
            .map_err(|e| e.into_pipeline_error(&file))?;

        match kind {
            MediaKind::Image => {
                let metadata = self
                    .images
                    .extract_metadata(&file.bytes)
                    .await
                    .map_err(|e| PipelineError::EncodingWithSource {
                        message: format!("Could not read dimensions of {}", file.file_name),
                        source: e,
                    })?;
                MediaAsset::new_image(file, metadata.width, metadata.height)
            }
            MediaKind::Video => {
                let metadata = probe_video(self.host.as_ref(), &self.registry, &file).await?;
                MediaAsset::new_video(file, metadata.width, metadata.height, metadata.duration)
            }
        }
    }

    /// Ingest a selection. Files that fail validation or probing are
    /// reported and skipped; the batch itself never fails.
    #[tracing::instrument(
        skip(self, files),
        fields(mode = ?self.validator.mode(), count = files.len())
    )]
    pub async fn ingest_batch(&self, files: Vec<MediaFile>) -> IngestReport {
        let mut report = IngestReport::default();

        for file in files {
            let file_name = file.file_name.clone();
            let mime_type = file.mime_type.clone();
            match self.ingest(file).await {
                Ok(asset) => {
                    tracing::debug!(
                        file_name = %file_name,
                        asset_id = %asset.id(),
                        kind = asset.kind().as_str(),
                        "File ingested"
                    );
                    report.assets.push(asset);
                }
                Err(e) => {
                    tracing::warn!(file_name = %file_name, error = %e, "File skipped");
                    report.rejected.push(RejectedFile {
                        file_name,
                        mime_type,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            accepted = report.assets.len(),
            rejected = report.rejected.len(),
            "Batch ingested"
        );
        report
    }
}
