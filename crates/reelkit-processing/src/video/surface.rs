use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};
use reelkit_core::models::PixelRect;
use reelkit_core::PipelineError;

use crate::compression::{EncodedImage, ImageCompressor};

/// Off-screen drawing surface with canvas `drawImage(src, sx, sy, sw, sh,
/// 0, 0, W, H)` semantics: a source rectangle is scaled onto the whole
/// surface.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    canvas: RgbaImage,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Draw `region` of `source` stretched to the full surface. The region is
    /// clamped to the source bounds first.
    pub fn draw_region(
        &mut self,
        source: &RgbaImage,
        region: PixelRect,
    ) -> Result<(), PipelineError> {
        let region = region
            .clamp_to(source.width(), source.height())
            .ok_or_else(|| {
                PipelineError::Playback(format!(
                    "Source rectangle {:?} lies outside the {}x{} frame",
                    region,
                    source.width(),
                    source.height()
                ))
            })?;
        let cropped = imageops::crop_imm(source, region.x, region.y, region.width, region.height)
            .to_image();

        self.canvas = if region.width == self.width() && region.height == self.height() {
            cropped
        } else {
            imageops::resize(&cropped, self.width(), self.height(), FilterType::Triangle)
        };
        Ok(())
    }

    /// Draw the whole source stretched to the surface.
    pub fn draw_full(&mut self, source: &RgbaImage) -> Result<(), PipelineError> {
        self.draw_region(
            source,
            PixelRect::new(0, 0, source.width(), source.height()),
        )
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn to_rgb(&self) -> RgbImage {
        DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8()
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<EncodedImage, PipelineError> {
        ImageCompressor::encode_jpeg(&self.to_rgb(), quality)
    }
}
