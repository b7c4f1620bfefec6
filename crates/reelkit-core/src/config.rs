//! Configuration module
//!
//! Tunables for the media-authoring pipeline. Values come from `REELKIT_*`
//! environment variables (a `.env` file is loaded first when present) and fall
//! back to the constants below.

use std::env;
use std::time::Duration;

const CAPTURE_FPS: u32 = 30;
const CAPTURE_BITRATE: u32 = 2_500_000;
const MAX_OUTPUT_LONG_SIDE: u32 = 1920;
const MIN_TRIM_SECONDS: f64 = 0.05;
const TRIM_END_TOLERANCE_SECONDS: f64 = 0.05;
const SEEK_TIMEOUT_MS: u64 = 10_000;
const IMAGE_QUALITY: u8 = 92;
const THUMBNAIL_HEIGHT: u32 = 120;
const THUMBNAIL_QUALITY: u8 = 70;
const MIN_THUMBNAILS: usize = 2;
const MAX_THUMBNAILS: usize = 30;
const THUMBNAIL_SEEK_EPSILON: f64 = 0.1;
const MAX_IMAGE_SIZE_MB: usize = 30;
const MAX_VIDEO_SIZE_MB: usize = 500;
const CODEC_PREFERENCES: &str =
    "video/webm;codecs=vp9,video/webm;codecs=vp8,video/webm,video/mp4,image/gif";

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub environment: String,
    /// Frame rate of the capture stream during video re-encode
    pub capture_fps: u32,
    /// Target bitrate of the capture stream, bits per second
    pub capture_bitrate: u32,
    /// Longest side of a cropped video output
    pub max_output_long_side: u32,
    /// Trim windows at or below this length are passed through untouched
    pub min_trim_seconds: f64,
    pub trim_end_tolerance_seconds: f64,
    pub seek_timeout_ms: u64,
    /// JPEG quality (1-100) for rasterized images
    pub image_quality: u8,
    pub thumbnail_height: u32,
    pub thumbnail_quality: u8,
    pub min_thumbnails: usize,
    pub max_thumbnails: usize,
    pub thumbnail_seek_epsilon: f64,
    pub max_image_size_bytes: usize,
    pub max_video_size_bytes: usize,
    /// Output container/codec candidates, most preferred first
    pub codec_preferences: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            capture_fps: CAPTURE_FPS,
            capture_bitrate: CAPTURE_BITRATE,
            max_output_long_side: MAX_OUTPUT_LONG_SIDE,
            min_trim_seconds: MIN_TRIM_SECONDS,
            trim_end_tolerance_seconds: TRIM_END_TOLERANCE_SECONDS,
            seek_timeout_ms: SEEK_TIMEOUT_MS,
            image_quality: IMAGE_QUALITY,
            thumbnail_height: THUMBNAIL_HEIGHT,
            thumbnail_quality: THUMBNAIL_QUALITY,
            min_thumbnails: MIN_THUMBNAILS,
            max_thumbnails: MAX_THUMBNAILS,
            thumbnail_seek_epsilon: THUMBNAIL_SEEK_EPSILON,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            codec_preferences: split_list(CODEC_PREFERENCES),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("REELKIT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_image_size_mb = env_or("REELKIT_MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB);
        let max_video_size_mb = env_or("REELKIT_MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB);

        let codec_preferences = split_list(
            &env::var("REELKIT_CODEC_PREFERENCES").unwrap_or_else(|_| CODEC_PREFERENCES.into()),
        );

        let config = Self {
            environment,
            capture_fps: env_or("REELKIT_CAPTURE_FPS", CAPTURE_FPS),
            capture_bitrate: env_or("REELKIT_CAPTURE_BITRATE", CAPTURE_BITRATE),
            max_output_long_side: env_or("REELKIT_MAX_OUTPUT_LONG_SIDE", MAX_OUTPUT_LONG_SIDE),
            min_trim_seconds: env_or("REELKIT_MIN_TRIM_SECONDS", MIN_TRIM_SECONDS),
            trim_end_tolerance_seconds: env_or(
                "REELKIT_TRIM_END_TOLERANCE_SECONDS",
                TRIM_END_TOLERANCE_SECONDS,
            ),
            seek_timeout_ms: env_or("REELKIT_SEEK_TIMEOUT_MS", SEEK_TIMEOUT_MS),
            image_quality: env_or("REELKIT_IMAGE_QUALITY", IMAGE_QUALITY),
            thumbnail_height: env_or("REELKIT_THUMBNAIL_HEIGHT", THUMBNAIL_HEIGHT),
            thumbnail_quality: env_or("REELKIT_THUMBNAIL_QUALITY", THUMBNAIL_QUALITY),
            min_thumbnails: env_or("REELKIT_MIN_THUMBNAILS", MIN_THUMBNAILS),
            max_thumbnails: env_or("REELKIT_MAX_THUMBNAILS", MAX_THUMBNAILS),
            thumbnail_seek_epsilon: env_or(
                "REELKIT_THUMBNAIL_SEEK_EPSILON",
                THUMBNAIL_SEEK_EPSILON,
            ),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            codec_preferences,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.capture_fps == 0 || self.capture_fps > 120 {
            return Err(anyhow::anyhow!(
                "REELKIT_CAPTURE_FPS must be between 1 and 120, got {}",
                self.capture_fps
            ));
        }
        if self.max_output_long_side < 2 {
            return Err(anyhow::anyhow!(
                "REELKIT_MAX_OUTPUT_LONG_SIDE must be at least 2"
            ));
        }
        if !(1..=100).contains(&self.image_quality) || !(1..=100).contains(&self.thumbnail_quality)
        {
            return Err(anyhow::anyhow!("Image qualities must be between 1 and 100"));
        }
        if self.min_thumbnails == 0 || self.min_thumbnails > self.max_thumbnails {
            return Err(anyhow::anyhow!(
                "Thumbnail bounds are invalid: min {} max {}",
                self.min_thumbnails,
                self.max_thumbnails
            ));
        }
        if self.thumbnail_height == 0 {
            return Err(anyhow::anyhow!("REELKIT_THUMBNAIL_HEIGHT must be positive"));
        }
        if self.seek_timeout_ms == 0 {
            return Err(anyhow::anyhow!("REELKIT_SEEK_TIMEOUT_MS must be positive"));
        }
        if self.min_trim_seconds < 0.0 || self.trim_end_tolerance_seconds < 0.0 {
            return Err(anyhow::anyhow!("Trim tolerances cannot be negative"));
        }
        if self.codec_preferences.is_empty() {
            return Err(anyhow::anyhow!(
                "REELKIT_CODEC_PREFERENCES must list at least one type"
            ));
        }
        Ok(())
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    /// Check if the pipeline is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
