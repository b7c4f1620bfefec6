//! Image Transform Engine: crop + filter + fade, encoded to a new still.

use image::{DynamicImage, GenericImageView, ImageReader};
use reelkit_core::models::{MediaAsset, MediaFile, MediaKind, PixelRect};
use reelkit_core::{PipelineConfig, PipelineError};
use std::io::Cursor;

use super::filters::ImageFilters;
use super::style::{parse_filter_expression, render_filter_style, FilterStyle};
use crate::compression::{EncodedImage, ImageCompressor, OutputFormat};
use crate::geometry::centered_square;

/// Encoder settings for rasterised stills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 92,
        }
    }
}

impl From<&PipelineConfig> for RasterOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: config.image_quality,
        }
    }
}

/// Result of exporting one image asset. A failed render still yields the
/// untouched original so the caller can publish it.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageExport {
    Rendered {
        file: MediaFile,
        width: u32,
        height: u32,
    },
    Passthrough {
        original: MediaFile,
        reason: String,
    },
}

impl ImageExport {
    pub fn file(&self) -> &MediaFile {
        match self {
            ImageExport::Rendered { file, .. } => file,
            ImageExport::Passthrough { original, .. } => original,
        }
    }

    pub fn into_file(self) -> MediaFile {
        match self {
            ImageExport::Rendered { file, .. } => file,
            ImageExport::Passthrough { original, .. } => original,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, ImageExport::Passthrough { .. })
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, PipelineError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PipelineError::Encoding(format!("Unreadable image source: {}", e)))?;
    reader
        .decode()
        .map_err(|e| PipelineError::Encoding(format!("Image source could not be decoded: {}", e)))
}

/// Draw `source` into a surface sized to `crop` (or a centred square of the
/// smaller side when no crop is set), apply the composite filter and opacity,
/// and encode the surface.
pub fn rasterize(
    source: &[u8],
    crop: Option<PixelRect>,
    style: &FilterStyle,
    options: RasterOptions,
) -> Result<EncodedImage, PipelineError> {
    let img = decode(source)?;
    let (width, height) = img.dimensions();

    let region = crop
        .and_then(|rect| rect.clamp_to(width, height))
        .or_else(|| centered_square(width, height))
        .ok_or_else(|| {
            PipelineError::Encoding(format!("Source has no pixels ({}x{})", width, height))
        })?;

    let ops = parse_filter_expression(&style.expression)?;

    let mut surface = img
        .crop_imm(region.x, region.y, region.width, region.height)
        .to_rgba8();
    ImageFilters::apply_ops(&mut surface, &ops);
    ImageFilters::flatten_onto_black(&mut surface, style.opacity as f32);

    let rgb = DynamicImage::ImageRgba8(surface).to_rgb8();
    ImageCompressor::encode(&rgb, options.format, options.quality)
}

/// Runs [`rasterize`] for assets, off the async executor.
#[derive(Debug, Clone)]
pub struct ImageTransformEngine {
    options: RasterOptions,
}

impl ImageTransformEngine {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(RasterOptions::from(config))
    }

    /// Render the asset's current crop, filter and adjustments into a new
    /// file. Never fails: any decode, filter or encode error is reported as a
    /// passthrough of the original bytes.
    #[tracing::instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub async fn export_image(&self, asset: &MediaAsset) -> ImageExport {
        let original = asset.source().clone();
        if asset.kind() != MediaKind::Image {
            return ImageExport::Passthrough {
                original,
                reason: "asset is not an image".to_string(),
            };
        }

        let snapshot = asset.snapshot();
        let style = render_filter_style(snapshot.filter, &snapshot.adjustments);
        let options = self.options;
        let data = original.bytes.clone();
        let crop = snapshot.crop_region;

        // Decode and encode are CPU-bound; keep them off the async pool.
        let rendered = tokio::task::spawn_blocking(move || rasterize(&data, crop, &style, options))
            .await
            .map_err(|e| PipelineError::Internal(format!("Rasterize task failed: {}", e)))
            .and_then(|result| result);

        match rendered {
            Ok(encoded) => {
                tracing::info!(
                    width = encoded.width,
                    height = encoded.height,
                    bytes = encoded.bytes.len(),
                    "Image rendered"
                );
                let file = MediaFile::new(
                    original.derived_name("edited", options.format.extension()),
                    encoded.mime_type(),
                    encoded.bytes,
                );
                ImageExport::Rendered {
                    file,
                    width: encoded.width,
                    height: encoded.height,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image render failed, forwarding original");
                ImageExport::Passthrough {
                    original,
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl Default for ImageTransformEngine {
    fn default() -> Self {
        Self::new(RasterOptions::default())
    }
}
