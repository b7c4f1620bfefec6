//! Filmstrip generation for the trim scrubber and cover picker.

use reelkit_core::models::{MediaAsset, MediaKind, ThumbnailFrame};
use reelkit_core::{PipelineConfig, PipelineError};
use std::sync::Arc;

use super::host::{seek_with_timeout, MediaHost, PlaybackGuard};
use super::surface::DrawingSurface;
use crate::handles::HandleRegistry;

/// Number of filmstrip frames for a clip: one per whole second, clamped to
/// `[min, max]`.
pub fn frame_count(duration_seconds: f64, min: usize, max: usize) -> usize {
    let whole_seconds = if duration_seconds.is_finite() && duration_seconds > 0.0 {
        duration_seconds.floor() as usize
    } else {
        0
    };
    whole_seconds.clamp(min, max.max(min))
}

pub struct FilmstripGenerator {
    host: Arc<dyn MediaHost>,
    registry: HandleRegistry,
    config: PipelineConfig,
}

impl FilmstripGenerator {
    pub fn new(host: Arc<dyn MediaHost>, registry: HandleRegistry, config: PipelineConfig) -> Self {
        Self {
            host,
            registry,
            config,
        }
    }

    /// Sample the asset into JPEG thumbnails and cache them on the asset.
    ///
    /// Returns `Ok(false)` without touching the host when a filmstrip is
    /// already cached. Frames are sampled one at a time in order.
    #[tracing::instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub async fn generate(&self, asset: &mut MediaAsset) -> Result<bool, PipelineError> {
        if asset.kind() != MediaKind::Video {
            return Err(PipelineError::InvalidInput(format!(
                "{} is not a video",
                asset.source().file_name
            )));
        }
        if asset.has_thumbnails() {
            tracing::debug!("Filmstrip already cached");
            return Ok(false);
        }

        let handle = self.registry.register(asset.source());
        let mut playback = PlaybackGuard::new(self.host.open_playback(&handle).await?);

        let duration = playback.duration();
        let (native_width, native_height) = playback.natural_size();
        if !(duration.is_finite() && duration > 0.0) || native_width == 0 || native_height == 0 {
            return Err(PipelineError::NotReady(format!(
                "No metadata for {}",
                asset.source().file_name
            )));
        }

        let count = frame_count(
            duration,
            self.config.min_thumbnails,
            self.config.max_thumbnails,
        );
        let height = self.config.thumbnail_height;
        let width =
            ((height as f64 * native_width as f64 / native_height as f64).round() as u32).max(1);
        let mut surface = DrawingSurface::new(width, height);
        let latest = (duration - self.config.thumbnail_seek_epsilon).max(0.0);

        let mut frames = Vec::with_capacity(count);
        for index in 0..count {
            let time_seconds = (index as f64).min(latest);
            seek_with_timeout(&mut *playback, time_seconds, self.config.seek_timeout()).await?;
            surface.draw_full(playback.current_frame()?)?;
            let encoded = surface.encode_jpeg(self.config.thumbnail_quality)?;
            frames.push(ThumbnailFrame {
                index,
                time_seconds,
                width: encoded.width,
                height: encoded.height,
                bytes: encoded.bytes,
            });
        }

        tracing::info!(frames = frames.len(), width, height, "Filmstrip generated");
        asset.store_thumbnails(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::software::{DecodedClip, SoftwareHost};
    use image::{Rgba, RgbaImage};
    use reelkit_core::models::{CoverFrame, MediaFile};

    fn clip_asset(frames: usize, frame_seconds: f64) -> MediaAsset {
        let images = (0..frames)
            .map(|i| RgbaImage::from_pixel(64, 48, Rgba([(i * 20) as u8, 0, 0, 255])))
            .collect();
        let clip = DecodedClip::from_frames(images, frame_seconds).unwrap();
        let duration = clip.duration();
        let file = MediaFile::new("clip.gif", "image/gif", clip.encode_gif().unwrap());
        MediaAsset::new_video(file, 64, 48, duration).unwrap()
    }

    #[test]
    fn test_frame_count_clamps() {
        assert_eq!(frame_count(0.4, 2, 30), 2);
        assert_eq!(frame_count(7.9, 2, 30), 7);
        assert_eq!(frame_count(95.0, 2, 30), 30);
        assert_eq!(frame_count(f64::NAN, 2, 30), 2);
    }

    #[tokio::test]
    async fn test_generate_samples_each_second() {
        let host = SoftwareHost::new();
        let registry = HandleRegistry::new();
        let generator = FilmstripGenerator::new(
            Arc::new(host.clone()),
            registry.clone(),
            PipelineConfig::default(),
        );
        let mut asset = clip_asset(6, 0.5);

        assert!(generator.generate(&mut asset).await.unwrap());

        let video = asset.video().unwrap();
        let frames = video.thumbnail_frames().unwrap();
        let times: Vec<f64> = frames.iter().map(|f| f.time_seconds).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert!(frames.iter().all(|f| f.width == 160 && f.height == 120));
        assert_eq!(&frames[0].bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(video.cover(), Some(&CoverFrame::Thumbnail(0)));
        assert_eq!(host.live_playbacks(), 0);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn test_short_clip_stays_inside_duration() {
        let generator = FilmstripGenerator::new(
            Arc::new(SoftwareHost::new()),
            HandleRegistry::new(),
            PipelineConfig::default(),
        );
        let mut asset = clip_asset(5, 0.1);

        generator.generate(&mut asset).await.unwrap();
        let frames = asset.video().unwrap().thumbnail_frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time_seconds, 0.0);
        assert!((frames[1].time_seconds - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let generator = FilmstripGenerator::new(
            Arc::new(SoftwareHost::new()),
            HandleRegistry::new(),
            PipelineConfig::default(),
        );
        let mut asset = clip_asset(4, 0.5);

        assert!(generator.generate(&mut asset).await.unwrap());
        let first: Vec<_> = asset.video().unwrap().thumbnail_frames().unwrap().to_vec();
        assert!(!generator.generate(&mut asset).await.unwrap());
        assert_eq!(asset.video().unwrap().thumbnail_frames().unwrap(), first.as_slice());
    }

    #[tokio::test]
    async fn test_images_are_rejected() {
        let generator = FilmstripGenerator::new(
            Arc::new(SoftwareHost::new()),
            HandleRegistry::new(),
            PipelineConfig::default(),
        );
        let file = MediaFile::new("a.png", "image/png", vec![1u8]);
        let mut asset = MediaAsset::new_image(file, 2, 2).unwrap();
        assert!(matches!(
            generator.generate(&mut asset).await,
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
