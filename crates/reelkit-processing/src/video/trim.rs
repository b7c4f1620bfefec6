//! Video Trim/Crop/Recompress Engine.
//!
//! Plays the trim window of a source in real time on a detached playback
//! element, draws every animation frame's crop rectangle onto an off-screen
//! surface and records that surface. Failures never escape: the caller
//! always gets a file back, either the new encode or the untouched source.

use bytes::Bytes;
use reelkit_core::models::{EditSnapshot, MediaAsset, MediaFile, PixelRect, TrimWindow};
use reelkit_core::{PipelineConfig, PipelineError};
use std::sync::Arc;
use tokio::time::Instant;

use super::codec::{base_mime, extension_for, select_codec};
use super::host::{seek_with_timeout, CaptureSettings, MediaHost, PlaybackGuard};
use super::surface::DrawingSurface;
use crate::geometry::video_output_size;
use crate::handles::HandleRegistry;

/// What to cut out of a source, captured when the export starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRequest {
    pub trim: TrimWindow,
    /// Native-pixel crop; `None` records the full frame.
    pub crop: Option<PixelRect>,
    pub sound_enabled: bool,
}

impl TrimRequest {
    pub fn from_snapshot(snapshot: &EditSnapshot) -> Option<Self> {
        snapshot.trim.map(|trim| Self {
            trim,
            crop: snapshot.crop_region,
            sound_enabled: snapshot.sound_enabled,
        })
    }

    pub fn from_asset(asset: &MediaAsset) -> Result<Self, PipelineError> {
        Self::from_snapshot(&asset.snapshot()).ok_or_else(|| {
            PipelineError::InvalidInput(format!("{} is not a video", asset.source().file_name))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassthroughReason {
    /// Window too short to be worth re-encoding.
    DegenerateWindow,
    /// Neither a preferred codec nor the host default could record.
    NoRecorder(String),
    Failed(String),
}

impl std::fmt::Display for PassthroughReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassthroughReason::DegenerateWindow => write!(f, "trim window too short"),
            PassthroughReason::NoRecorder(detail) => write!(f, "no recorder available: {}", detail),
            PassthroughReason::Failed(detail) => write!(f, "re-encode failed: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutcome {
    Encoded {
        file: MediaFile,
        width: u32,
        height: u32,
        /// `false` when the no-codec fallback recorded the uncropped source.
        crop_applied: bool,
        mime_type: String,
    },
    Passthrough {
        file: MediaFile,
        reason: PassthroughReason,
    },
}

impl TrimOutcome {
    pub fn file(&self) -> &MediaFile {
        match self {
            TrimOutcome::Encoded { file, .. } | TrimOutcome::Passthrough { file, .. } => file,
        }
    }

    pub fn into_file(self) -> MediaFile {
        match self {
            TrimOutcome::Encoded { file, .. } | TrimOutcome::Passthrough { file, .. } => file,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, TrimOutcome::Passthrough { .. })
    }
}

/// Recorder plus the source rectangle and surface size it captures.
struct CapturePlan {
    recorder: Box<dyn super::host::StreamRecorder>,
    region: PixelRect,
    width: u32,
    height: u32,
    crop_applied: bool,
}

pub struct VideoTrimEngine {
    host: Arc<dyn MediaHost>,
    registry: HandleRegistry,
    config: PipelineConfig,
}

impl VideoTrimEngine {
    pub fn new(host: Arc<dyn MediaHost>, registry: HandleRegistry, config: PipelineConfig) -> Self {
        Self {
            host,
            registry,
            config,
        }
    }

    pub async fn trim_asset<F>(&self, asset: &MediaAsset, progress: F) -> TrimOutcome
    where
        F: FnMut(f64) + Send,
    {
        match TrimRequest::from_asset(asset) {
            Ok(request) => self.trim(asset.source(), request, progress).await,
            Err(e) => TrimOutcome::Passthrough {
                file: asset.source().clone(),
                reason: PassthroughReason::Failed(e.to_string()),
            },
        }
    }

    /// Re-encode `request.trim` of `source`, cropped to `request.crop`.
    /// `progress` receives percentages in `[0, 100]`, ending with 100 on
    /// success.
    #[tracing::instrument(
        skip(self, source, request, progress),
        fields(file_name = %source.file_name)
    )]
    pub async fn trim<F>(
        &self,
        source: &MediaFile,
        request: TrimRequest,
        mut progress: F,
    ) -> TrimOutcome
    where
        F: FnMut(f64) + Send,
    {
        if request.trim.is_degenerate(self.config.min_trim_seconds) {
            tracing::info!(
                start = request.trim.start,
                end = request.trim.end,
                "Trim window degenerate, forwarding source"
            );
            return TrimOutcome::Passthrough {
                file: source.clone(),
                reason: PassthroughReason::DegenerateWindow,
            };
        }

        match self.encode(source, &request, &mut progress).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Video re-encode failed, forwarding source");
                TrimOutcome::Passthrough {
                    file: source.clone(),
                    reason: PassthroughReason::Failed(e.to_string()),
                }
            }
        }
    }

    async fn encode<F>(
        &self,
        source: &MediaFile,
        request: &TrimRequest,
        progress: &mut F,
    ) -> Result<TrimOutcome, PipelineError>
    where
        F: FnMut(f64) + Send,
    {
        let handle = self.registry.register(source);
        let mut playback = PlaybackGuard::new(self.host.open_playback(&handle).await?);

        let duration = playback.duration();
        let (native_width, native_height) = playback.natural_size();
        if !(duration.is_finite() && duration > 0.0) || native_width == 0 || native_height == 0 {
            return Err(PipelineError::Playback(format!(
                "No usable metadata (duration {}, size {}x{})",
                duration, native_width, native_height
            )));
        }

        let start = request.trim.start.clamp(0.0, duration);
        let end = request.trim.end.clamp(start, duration);
        let window = TrimWindow::new(start, end);
        if window.is_degenerate(self.config.min_trim_seconds) {
            return Ok(TrimOutcome::Passthrough {
                file: source.clone(),
                reason: PassthroughReason::DegenerateWindow,
            });
        }

        let plan = match self.plan_capture(request.crop, native_width, native_height) {
            Ok(plan) => plan,
            Err(PlanError::NoRecorder(detail)) => {
                tracing::warn!(detail = %detail, "No recorder available, forwarding source");
                return Ok(TrimOutcome::Passthrough {
                    file: source.clone(),
                    reason: PassthroughReason::NoRecorder(detail),
                });
            }
            Err(PlanError::Pipeline(e)) => return Err(e),
        };
        let CapturePlan {
            mut recorder,
            region,
            width,
            height,
            crop_applied,
        } = plan;
        let mut surface = DrawingSurface::new(width, height);

        seek_with_timeout(&mut *playback, start, self.config.seek_timeout()).await?;
        playback.set_muted(!request.sound_enabled);
        recorder.start()?;
        playback.play().await?;

        let total = window.len();
        let finish_at = end - self.config.trim_end_tolerance_seconds;
        let stall_limit = self.config.seek_timeout();
        let mut last_drawn: Option<f64> = None;
        let mut last_advance = Instant::now();
        let mut frames = 0usize;

        loop {
            self.host.next_animation_frame().await;

            let now = playback.current_time();
            progress(((now - start) / total * 100.0).clamp(0.0, 100.0));
            let done = now >= finish_at || playback.is_ended() || playback.is_paused();

            if last_drawn.map_or(true, |previous| now > previous) {
                surface.draw_region(playback.current_frame()?, region)?;
                recorder.capture(surface.image(), now - start)?;
                last_drawn = Some(now);
                last_advance = Instant::now();
                frames += 1;
            } else if last_advance.elapsed() > stall_limit {
                return Err(PipelineError::Playback(format!(
                    "Playback stalled at {:.3}s",
                    now
                )));
            }

            if done {
                break;
            }
        }
        playback.pause();

        let chunks = recorder.stop().await?;
        let data = assemble(&chunks);
        if data.is_empty() {
            return Err(PipelineError::Encoding(
                "Recorder produced no data".to_string(),
            ));
        }

        let mime_type = recorder.mime_type().to_string();
        let file = MediaFile::new(
            source.derived_name("edited", extension_for(&mime_type)),
            base_mime(&mime_type),
            data,
        );
        progress(100.0);
        tracing::info!(
            width,
            height,
            frames,
            bytes = file.len(),
            mime_type = %mime_type,
            crop_applied,
            "Video re-encoded"
        );

        Ok(TrimOutcome::Encoded {
            file,
            width,
            height,
            crop_applied,
            mime_type,
        })
    }

    fn plan_capture(
        &self,
        crop: Option<PixelRect>,
        native_width: u32,
        native_height: u32,
    ) -> Result<CapturePlan, PlanError> {
        let full = PixelRect::new(0, 0, native_width, native_height);
        let native_long = native_width.max(native_height);
        let settings = |width, height| CaptureSettings {
            width,
            height,
            fps: self.config.capture_fps,
            bitrate: self.config.capture_bitrate,
        };

        match select_codec(self.host.as_ref(), &self.config.codec_preferences) {
            Some(mime_type) => {
                let crop = crop.and_then(|rect| rect.clamp_to(native_width, native_height));
                let (width, height) = match crop {
                    Some(rect) => {
                        video_output_size(rect.width, rect.height, self.config.max_output_long_side)
                    }
                    None => video_output_size(native_width, native_height, native_long),
                };
                let recorder = self
                    .host
                    .create_recorder(Some(&mime_type), settings(width, height))
                    .map_err(PlanError::Pipeline)?;
                Ok(CapturePlan {
                    recorder,
                    region: crop.unwrap_or(full),
                    width,
                    height,
                    crop_applied: crop.is_some(),
                })
            }
            None => {
                tracing::warn!(
                    candidates = ?self.config.codec_preferences,
                    "No preferred codec supported, recording uncropped source with host default"
                );
                let (width, height) = video_output_size(native_width, native_height, native_long);
                let recorder = self
                    .host
                    .create_recorder(None, settings(width, height))
                    .map_err(|e| PlanError::NoRecorder(e.to_string()))?;
                Ok(CapturePlan {
                    recorder,
                    region: full,
                    width,
                    height,
                    crop_applied: false,
                })
            }
        }
    }
}

enum PlanError {
    NoRecorder(String),
    Pipeline(PipelineError),
}

fn assemble(chunks: &[Bytes]) -> Vec<u8> {
    let mut data = Vec::with_capacity(chunks.iter().map(Bytes::len).sum());
    for chunk in chunks {
        data.extend_from_slice(chunk);
    }
    data
}
