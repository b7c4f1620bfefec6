//! Pure-Rust media host.
//!
//! Decodes animated GIFs into memory, plays them back in real time on the
//! tokio clock and records surfaces into a streaming animated GIF. Lets every
//! engine run without a browser or a native codec library.

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, Delay, Frame, ImageFormat, RgbaImage};
use reelkit_core::PipelineError;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::host::{CaptureSettings, MediaHost, PlaybackElement, StreamRecorder};
use crate::handles::TransientHandle;

const GIF_MIME: &str = "image/gif";
/// Browsers clamp GIF delays of 10 ms or less to 100 ms.
const MIN_GIF_DELAY_MS: f64 = 10.0;
const DEFAULT_GIF_DELAY_MS: f64 = 100.0;
/// NeuQuant speed for recorded frames (1 = best quality, 30 = fastest).
const RECORDER_QUANT_SPEED: i32 = 30;

/// Fully decoded clip: frames plus the source time at which each starts.
#[derive(Debug, Clone)]
pub struct DecodedClip {
    frames: Vec<RgbaImage>,
    starts: Vec<f64>,
    duration: f64,
}

impl DecodedClip {
    /// Build from frames of equal size shown for `frame_seconds` each.
    pub fn from_frames(frames: Vec<RgbaImage>, frame_seconds: f64) -> Result<Self, PipelineError> {
        let delays = vec![frame_seconds; frames.len()];
        Self::from_timed_frames(frames, &delays)
    }

    fn from_timed_frames(frames: Vec<RgbaImage>, delays: &[f64]) -> Result<Self, PipelineError> {
        let first = frames
            .first()
            .ok_or_else(|| PipelineError::Playback("Clip has no frames".to_string()))?;
        let (width, height) = first.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Playback("Clip frames are empty".to_string()));
        }
        if frames.iter().any(|f| f.dimensions() != (width, height)) {
            return Err(PipelineError::Playback(
                "Clip frames differ in size".to_string(),
            ));
        }
        if delays.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(PipelineError::InvalidInput(
                "Frame durations must be positive".to_string(),
            ));
        }

        let mut starts = Vec::with_capacity(frames.len());
        let mut clock = 0.0;
        for delay in delays {
            starts.push(clock);
            clock += delay;
        }

        Ok(Self {
            frames,
            starts,
            duration: clock,
        })
    }

    /// Decode every frame of an animated GIF.
    pub fn from_gif(data: &[u8]) -> Result<Self, PipelineError> {
        let decoder =
            GifDecoder::new(Cursor::new(data)).map_err(|e| PipelineError::EncodingWithSource {
                message: "GIF header could not be read".to_string(),
                source: anyhow!(e),
            })?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| PipelineError::EncodingWithSource {
                message: "GIF frames could not be decoded".to_string(),
                source: anyhow!(e),
            })?;

        let mut delays = Vec::with_capacity(frames.len());
        let mut buffers = Vec::with_capacity(frames.len());
        for frame in frames {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let ms = numer as f64 / denom.max(1) as f64;
            let ms = if ms <= MIN_GIF_DELAY_MS {
                DEFAULT_GIF_DELAY_MS
            } else {
                ms
            };
            delays.push(ms / 1000.0);
            buffers.push(frame.into_buffer());
        }

        Self::from_timed_frames(buffers, &delays)
    }

    /// Encode the clip back into a looping animated GIF.
    pub fn encode_gif(&self) -> Result<Bytes, PipelineError> {
        let buffer = SharedBuffer::default();
        {
            let mut encoder = GifEncoder::new_with_speed(buffer.clone(), RECORDER_QUANT_SPEED);
            encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;
            for (index, frame) in self.frames.iter().enumerate() {
                let end = self
                    .starts
                    .get(index + 1)
                    .copied()
                    .unwrap_or(self.duration);
                let delay_ms = ((end - self.starts[index]) * 1000.0).round() as u32;
                encoder
                    .encode_frame(Frame::from_parts(
                        frame.clone(),
                        0,
                        0,
                        Delay::from_numer_denom_ms(delay_ms, 1),
                    ))
                    .map_err(encode_error)?;
            }
        }
        Ok(Bytes::from(buffer.take()))
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0))
    }

    /// Frame shown at `seconds`; the last frame past the end.
    pub fn frame_at(&self, seconds: f64) -> &RgbaImage {
        let index = self
            .starts
            .partition_point(|start| *start <= seconds)
            .saturating_sub(1)
            .min(self.frames.len() - 1);
        &self.frames[index]
    }
}

fn encode_error(e: image::ImageError) -> PipelineError {
    PipelineError::EncodingWithSource {
        message: "GIF encode failed".to_string(),
        source: anyhow!(e),
    }
}

/// `Write` sink whose contents can be drained while the writer lives on.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        self.0
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut buf = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("recorder buffer poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Real-time playback of a [`DecodedClip`] on the tokio clock.
pub struct SoftwarePlayback {
    clip: Arc<DecodedClip>,
    position: f64,
    playing_since: Option<Instant>,
    muted: bool,
    released: bool,
    live: Arc<AtomicUsize>,
}

impl SoftwarePlayback {
    fn new(clip: Arc<DecodedClip>, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            clip,
            position: 0.0,
            playing_since: None,
            muted: false,
            released: false,
            live,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

#[async_trait]
impl PlaybackElement for SoftwarePlayback {
    fn duration(&self) -> f64 {
        self.clip.duration()
    }

    fn natural_size(&self) -> (u32, u32) {
        self.clip.dimensions()
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => {
                (self.position + since.elapsed().as_secs_f64()).min(self.clip.duration())
            }
            None => self.position,
        }
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.clip.duration()
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none() || self.is_ended()
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    async fn seek(&mut self, seconds: f64) -> Result<(), PipelineError> {
        if self.released {
            return Err(PipelineError::Playback("Playback already released".to_string()));
        }
        if !seconds.is_finite() {
            return Err(PipelineError::InvalidInput(format!("Cannot seek to {}", seconds)));
        }
        self.position = seconds.clamp(0.0, self.clip.duration());
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        // Seeks complete asynchronously on a real element.
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PipelineError> {
        if self.released {
            return Err(PipelineError::Playback("Playback already released".to_string()));
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing_since.is_some() {
            self.position = self.current_time();
            self.playing_since = None;
        }
    }

    fn current_frame(&self) -> Result<&RgbaImage, PipelineError> {
        if self.released {
            return Err(PipelineError::Playback("Playback already released".to_string()));
        }
        Ok(self.clip.frame_at(self.current_time()))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.playing_since = None;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SoftwarePlayback {
    fn drop(&mut self) {
        self.release();
    }
}

/// Samples captured surfaces at a fixed frame rate and streams them into an
/// animated GIF, emitting one data chunk per encoded frame.
pub struct GifRecorder {
    settings: CaptureSettings,
    buffer: SharedBuffer,
    encoder: Option<GifEncoder<SharedBuffer>>,
    pending: Option<(RgbaImage, f64)>,
    next_sample_at: f64,
    chunks: Vec<Bytes>,
}

impl GifRecorder {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            buffer: SharedBuffer::default(),
            encoder: None,
            pending: None,
            next_sample_at: 0.0,
            chunks: Vec::new(),
        }
    }

    fn frame_interval(&self) -> f64 {
        1.0 / self.settings.fps.max(1) as f64
    }

    fn drain_chunk(&mut self) {
        let data = self.buffer.take();
        if !data.is_empty() {
            self.chunks.push(Bytes::from(data));
        }
    }

    fn encode_pending(&mut self, shown_for: f64) -> Result<(), PipelineError> {
        let Some((image, _)) = self.pending.take() else {
            return Ok(());
        };
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| PipelineError::Encoding("Recorder not started".to_string()))?;
        let delay_ms = (shown_for * 1000.0).round().max(10.0) as u32;
        encoder
            .encode_frame(Frame::from_parts(
                image,
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            ))
            .map_err(encode_error)?;
        self.drain_chunk();
        Ok(())
    }
}

#[async_trait]
impl StreamRecorder for GifRecorder {
    fn mime_type(&self) -> &str {
        GIF_MIME
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        if self.encoder.is_some() {
            return Err(PipelineError::Encoding("Recorder already started".to_string()));
        }
        let mut encoder = GifEncoder::new_with_speed(self.buffer.clone(), RECORDER_QUANT_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;
        self.encoder = Some(encoder);
        Ok(())
    }

    fn capture(&mut self, frame: &RgbaImage, timestamp: f64) -> Result<(), PipelineError> {
        if self.encoder.is_none() {
            return Err(PipelineError::Encoding("Recorder not started".to_string()));
        }
        if let Some((_, pending_at)) = &self.pending {
            if timestamp <= *pending_at {
                return Err(PipelineError::Encoding(format!(
                    "Frame at {:.3}s is not after {:.3}s",
                    timestamp, pending_at
                )));
            }
        }
        // Faster than the capture rate: dropped, like a capture stream would.
        if self.pending.is_some() && timestamp + 1e-6 < self.next_sample_at {
            return Ok(());
        }

        let image = if frame.dimensions() == (self.settings.width, self.settings.height) {
            frame.clone()
        } else {
            imageops::resize(
                frame,
                self.settings.width,
                self.settings.height,
                FilterType::Triangle,
            )
        };

        if let Some((_, pending_at)) = self.pending {
            self.encode_pending(timestamp - pending_at)?;
        }
        self.pending = Some((image, timestamp));
        self.next_sample_at = timestamp + self.frame_interval();
        Ok(())
    }

    async fn stop(&mut self) -> Result<Vec<Bytes>, PipelineError> {
        let interval = self.frame_interval();
        self.encode_pending(interval)?;
        // Dropping the encoder writes the trailer.
        self.encoder = None;
        self.drain_chunk();
        Ok(std::mem::take(&mut self.chunks))
    }
}

/// [`MediaHost`] backed by [`DecodedClip`], [`SoftwarePlayback`] and
/// [`GifRecorder`].
#[derive(Debug, Clone)]
pub struct SoftwareHost {
    frame_interval: Duration,
    typed_recording: bool,
    default_recording: bool,
    live_playbacks: Arc<AtomicUsize>,
}

impl Default for SoftwareHost {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
            typed_recording: true,
            default_recording: true,
            live_playbacks: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SoftwareHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `is_type_supported` reports the GIF recorder.
    pub fn with_typed_recording(mut self, enabled: bool) -> Self {
        self.typed_recording = enabled;
        self
    }

    /// Whether a recorder can be created without a type.
    pub fn with_default_recording(mut self, enabled: bool) -> Self {
        self.default_recording = enabled;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Playback elements opened and not yet released.
    pub fn live_playbacks(&self) -> usize {
        self.live_playbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for SoftwareHost {
    async fn open_playback(
        &self,
        handle: &TransientHandle,
    ) -> Result<Box<dyn PlaybackElement>, PipelineError> {
        let data = handle
            .bytes()
            .ok_or_else(|| PipelineError::NotReady(format!("{} was revoked", handle.url())))?;

        match image::guess_format(&data) {
            Ok(ImageFormat::Gif) => {}
            _ => {
                return Err(PipelineError::Playback(format!(
                    "No decoder for {} content",
                    handle.mime_type()
                )))
            }
        }

        let clip = tokio::task::spawn_blocking(move || DecodedClip::from_gif(&data))
            .await
            .map_err(|e| PipelineError::Internal(format!("Decode task failed: {}", e)))??;

        tracing::debug!(
            duration = clip.duration(),
            frames = clip.frame_count(),
            "Software playback opened"
        );
        Ok(Box::new(SoftwarePlayback::new(
            Arc::new(clip),
            self.live_playbacks.clone(),
        )))
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.typed_recording && mime_type.trim().eq_ignore_ascii_case(GIF_MIME)
    }

    fn create_recorder(
        &self,
        mime_type: Option<&str>,
        settings: CaptureSettings,
    ) -> Result<Box<dyn StreamRecorder>, PipelineError> {
        let allowed = match mime_type {
            Some(mime) => self.is_type_supported(mime),
            None => self.default_recording,
        };
        if !allowed {
            return Err(PipelineError::Encoding(format!(
                "No recorder for {}",
                mime_type.unwrap_or("the default type")
            )));
        }
        Ok(Box::new(GifRecorder::new(settings)))
    }

    async fn next_animation_frame(&self) {
        tokio::time::sleep(self.frame_interval).await;
    }
}
