use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::adjustments::{Adjustment, AdjustmentStack};
use super::filter::FilterPreset;
use super::geometry::PixelRect;
use super::media::{MediaFile, MediaKind};
use crate::error::PipelineError;

/// Trim window `[start, end)` in source seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the window is too short to re-encode.
    pub fn is_degenerate(&self, min_seconds: f64) -> bool {
        !(self.len() > min_seconds)
    }
}

/// Screen-space pan offset of the image under the crop frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropOffset {
    pub x: f64,
    pub y: f64,
}

/// One sampled preview frame of a filmstrip (JPEG-encoded).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailFrame {
    pub index: usize,
    pub time_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub bytes: Bytes,
}

/// Cover image of a video: a filmstrip frame or an uploaded replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverFrame {
    Thumbnail(usize),
    Uploaded(MediaFile),
}

/// Video-only state of a [`MediaAsset`].
#[derive(Debug, Clone)]
pub struct VideoState {
    duration_seconds: f64,
    trim: TrimWindow,
    thumbnail_frames: Option<Vec<ThumbnailFrame>>,
    cover: Option<CoverFrame>,
    sound_enabled: bool,
}

impl VideoState {
    fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            trim: TrimWindow::new(0.0, duration_seconds),
            thumbnail_frames: None,
            cover: None,
            sound_enabled: true,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn trim(&self) -> TrimWindow {
        self.trim
    }

    pub fn thumbnail_frames(&self) -> Option<&[ThumbnailFrame]> {
        self.thumbnail_frames.as_deref()
    }

    pub fn cover(&self) -> Option<&CoverFrame> {
        self.cover.as_ref()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }
}

/// By-value copy of every mutable field of an asset, taken at the start of an
/// export so later edits cannot race the running engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub target_aspect: f64,
    pub crop_offset: CropOffset,
    pub zoom_factor: f64,
    pub crop_region: Option<PixelRect>,
    pub filter: FilterPreset,
    pub adjustments: AdjustmentStack,
    pub trim: Option<TrimWindow>,
    pub sound_enabled: bool,
}

/// The central entity flowing through the pipeline.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    id: Uuid,
    kind: MediaKind,
    source: MediaFile,
    native_width: u32,
    native_height: u32,
    ingested_at: DateTime<Utc>,
    target_aspect: f64,
    crop_offset: CropOffset,
    zoom_factor: f64,
    crop_region: Option<PixelRect>,
    filter: FilterPreset,
    adjustments: AdjustmentStack,
    video: Option<VideoState>,
}

impl MediaAsset {
    /// Smallest gap the trim handles keep between start and end.
    pub const MIN_TRIM_GAP_SECONDS: f64 = 0.5;
    pub const MAX_ZOOM: f64 = 5.0;

    pub fn new_image(source: MediaFile, width: u32, height: u32) -> Result<Self, PipelineError> {
        Self::build(MediaKind::Image, source, width, height, None)
    }

    pub fn new_video(
        source: MediaFile,
        width: u32,
        height: u32,
        duration_seconds: f64,
    ) -> Result<Self, PipelineError> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(PipelineError::InvalidInput(format!(
                "Video duration must be positive, got {}",
                duration_seconds
            )));
        }
        Self::build(
            MediaKind::Video,
            source,
            width,
            height,
            Some(VideoState::new(duration_seconds)),
        )
    }

    fn build(
        kind: MediaKind,
        source: MediaFile,
        width: u32,
        height: u32,
        video: Option<VideoState>,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "{} has no pixel dimensions ({}x{})",
                source.file_name, width, height
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            source,
            native_width: width,
            native_height: height,
            ingested_at: Utc::now(),
            target_aspect: width as f64 / height as f64,
            crop_offset: CropOffset::default(),
            zoom_factor: 1.0,
            crop_region: None,
            filter: FilterPreset::Normal,
            adjustments: AdjustmentStack::default(),
            video,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn source(&self) -> &MediaFile {
        &self.source
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn native_height(&self) -> u32 {
        self.native_height
    }

    pub fn native_aspect(&self) -> f64 {
        self.native_width as f64 / self.native_height as f64
    }

    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }

    pub fn target_aspect(&self) -> f64 {
        self.target_aspect
    }

    /// Change the crop aspect. Invalidates any confirmed crop region.
    pub fn set_target_aspect(&mut self, aspect: f64) -> Result<(), PipelineError> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(PipelineError::InvalidInput(format!(
                "Aspect ratio must be positive, got {}",
                aspect
            )));
        }
        self.target_aspect = aspect;
        self.crop_region = None;
        Ok(())
    }

    pub fn crop_offset(&self) -> CropOffset {
        self.crop_offset
    }

    /// Store a raw pan offset. It is not clamped against the crop frame;
    /// editors go through `session::pan_by`, which re-clamps it.
    pub fn set_crop_offset(&mut self, offset: CropOffset) {
        self.crop_offset = offset;
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Store the zoom clamped into `[1, MAX_ZOOM]` and return it.
    ///
    /// The pan offset is left as is and may now lie outside the frame;
    /// `session::set_zoom` pairs this with the re-clamp.
    pub fn set_zoom_factor(&mut self, zoom: f64) -> f64 {
        let zoom = if zoom.is_finite() { zoom } else { 1.0 };
        self.zoom_factor = zoom.clamp(1.0, Self::MAX_ZOOM);
        self.zoom_factor
    }

    pub fn crop_region(&self) -> Option<PixelRect> {
        self.crop_region
    }

    /// Store a crop region, intersected with the native bounds.
    pub fn set_crop_region(&mut self, region: Option<PixelRect>) {
        self.crop_region =
            region.and_then(|rect| rect.clamp_to(self.native_width, self.native_height));
    }

    pub fn filter(&self) -> FilterPreset {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterPreset) {
        self.filter = filter;
    }

    pub fn adjustments(&self) -> AdjustmentStack {
        self.adjustments
    }

    pub fn set_adjustment(&mut self, adjustment: Adjustment, value: i32) -> i32 {
        self.adjustments.set(adjustment, value)
    }

    pub fn reset_adjustments(&mut self) {
        self.adjustments = AdjustmentStack::default();
    }

    pub fn video(&self) -> Option<&VideoState> {
        self.video.as_ref()
    }

    fn video_mut(&mut self) -> Result<&mut VideoState, PipelineError> {
        let name = &self.source.file_name;
        match self.video.as_mut() {
            Some(video) => Ok(video),
            None => Err(PipelineError::InvalidInput(format!(
                "{} is not a video",
                name
            ))),
        }
    }

    /// Move the trim start, keeping it inside `[0, end - MIN_TRIM_GAP_SECONDS]`.
    pub fn set_trim_start(&mut self, seconds: f64) -> Result<TrimWindow, PipelineError> {
        let video = self.video_mut()?;
        let latest = (video.trim.end - Self::MIN_TRIM_GAP_SECONDS).max(0.0);
        let seconds = if seconds.is_finite() { seconds } else { 0.0 };
        video.trim.start = seconds.clamp(0.0, latest);
        Ok(video.trim)
    }

    /// Move the trim end, keeping it inside `[start + MIN_TRIM_GAP_SECONDS, duration]`.
    pub fn set_trim_end(&mut self, seconds: f64) -> Result<TrimWindow, PipelineError> {
        let video = self.video_mut()?;
        let duration = video.duration_seconds;
        let earliest = (video.trim.start + Self::MIN_TRIM_GAP_SECONDS).min(duration);
        let seconds = if seconds.is_finite() { seconds } else { duration };
        video.trim.end = seconds.clamp(earliest, duration);
        Ok(video.trim)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<(), PipelineError> {
        self.video_mut()?.sound_enabled = enabled;
        Ok(())
    }

    pub fn set_cover(&mut self, cover: CoverFrame) -> Result<(), PipelineError> {
        let video = self.video_mut()?;
        if let CoverFrame::Thumbnail(index) = cover {
            let available = video.thumbnail_frames.as_ref().map_or(0, Vec::len);
            if index >= available {
                return Err(PipelineError::InvalidInput(format!(
                    "Cover frame {} out of range ({} frames)",
                    index, available
                )));
            }
        }
        video.cover = Some(cover);
        Ok(())
    }

    /// Cache a generated filmstrip. Frames are stored once: returns `false`
    /// (and keeps the existing frames) when a filmstrip is already cached.
    /// The first frame becomes the cover unless one was chosen already.
    pub fn store_thumbnails(&mut self, frames: Vec<ThumbnailFrame>) -> Result<bool, PipelineError> {
        let video = self.video_mut()?;
        if video.thumbnail_frames.is_some() {
            return Ok(false);
        }
        if video.cover.is_none() && !frames.is_empty() {
            video.cover = Some(CoverFrame::Thumbnail(0));
        }
        video.thumbnail_frames = Some(frames);
        Ok(true)
    }

    pub fn has_thumbnails(&self) -> bool {
        self.video
            .as_ref()
            .is_some_and(|video| video.thumbnail_frames.is_some())
    }

    pub fn snapshot(&self) -> EditSnapshot {
        EditSnapshot {
            target_aspect: self.target_aspect,
            crop_offset: self.crop_offset,
            zoom_factor: self.zoom_factor,
            crop_region: self.crop_region,
            filter: self.filter,
            adjustments: self.adjustments,
            trim: self.video.as_ref().map(|video| video.trim),
            sound_enabled: self.video.as_ref().is_some_and(|video| video.sound_enabled),
        }
    }
}
