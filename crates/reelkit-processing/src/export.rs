//! Turns an edited asset into the files and descriptor handed to upload.

use reelkit_core::models::{AssetDescriptor, CoverFrame, MediaAsset, MediaFile, MediaKind};
use reelkit_core::PipelineConfig;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::handles::HandleRegistry;
use crate::image::{render_filter_style, ImageExport, ImageTransformEngine};
use crate::video::{MediaHost, TrimOutcome, TrimRequest, VideoTrimEngine};

/// Export-ready form of one asset.
#[derive(Debug, Clone)]
pub struct ExportedAsset {
    pub asset_id: Uuid,
    pub kind: MediaKind,
    /// Rendered/re-encoded output, or the untouched source on fallback.
    pub file: MediaFile,
    pub cover: Option<MediaFile>,
    pub descriptor: AssetDescriptor,
    /// Why the source was forwarded instead of a rendered file.
    pub fallback: Option<String>,
}

/// Summary of an export for logs and CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub asset_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub fallback: Option<String>,
    pub descriptor: AssetDescriptor,
}

impl ExportedAsset {
    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            asset_id: self.asset_id,
            file_name: self.file.file_name.clone(),
            mime_type: self.file.mime_type.clone(),
            size_bytes: self.file.len(),
            fallback: self.fallback.clone(),
            descriptor: self.descriptor.clone(),
        }
    }
}

/// Cover image to upload with a video, if one was chosen.
fn cover_file(asset: &MediaAsset) -> Option<MediaFile> {
    let video = asset.video()?;
    match video.cover()? {
        CoverFrame::Uploaded(file) => Some(file.clone()),
        CoverFrame::Thumbnail(index) => {
            let frame = video.thumbnail_frames()?.get(*index)?;
            Some(MediaFile::new(
                asset.source().derived_name("cover", "jpg"),
                "image/jpeg",
                frame.bytes.clone(),
            ))
        }
    }
}

pub struct ExportPipeline {
    images: ImageTransformEngine,
    videos: VideoTrimEngine,
}

impl ExportPipeline {
    pub fn new(images: ImageTransformEngine, videos: VideoTrimEngine) -> Self {
        Self { images, videos }
    }

    pub fn from_config(
        host: Arc<dyn MediaHost>,
        registry: HandleRegistry,
        config: &PipelineConfig,
    ) -> Self {
        Self::new(
            ImageTransformEngine::from_config(config),
            VideoTrimEngine::new(host, registry, config.clone()),
        )
    }

    /// Snapshot the asset and run the engine for its kind. Never fails:
    /// engine failures yield the source file with `fallback` set.
    #[tracing::instrument(
        skip(self, asset, progress),
        fields(asset_id = %asset.id(), kind = asset.kind().as_str())
    )]
    pub async fn export_asset<F>(&self, asset: &MediaAsset, mut progress: F) -> ExportedAsset
    where
        F: FnMut(f64) + Send,
    {
        let snapshot = asset.snapshot();
        let style = render_filter_style(snapshot.filter, &snapshot.adjustments);
        let descriptor = AssetDescriptor::from_snapshot(
            asset.kind(),
            asset.native_aspect(),
            &snapshot,
            style.expression.clone(),
        );

        let (file, fallback) = match asset.kind() {
            MediaKind::Image => {
                let export = self.images.export_image(asset).await;
                progress(100.0);
                match export {
                    ImageExport::Rendered { file, .. } => (file, None),
                    ImageExport::Passthrough { original, reason } => (original, Some(reason)),
                }
            }
            MediaKind::Video => match TrimRequest::from_snapshot(&snapshot) {
                Some(request) => {
                    match self.videos.trim(asset.source(), request, &mut progress).await {
                        TrimOutcome::Encoded { file, .. } => (file, None),
                        TrimOutcome::Passthrough { file, reason } => {
                            (file, Some(reason.to_string()))
                        }
                    }
                }
                None => (
                    asset.source().clone(),
                    Some("video has no trim state".to_string()),
                ),
            },
        };

        ExportedAsset {
            asset_id: asset.id(),
            kind: asset.kind(),
            file,
            cover: cover_file(asset),
            descriptor,
            fallback,
        }
    }
}
