//! Host media primitives the video engines are written against.
//!
//! A browser provides these as a detached `<video>` element, a
//! `MediaRecorder` over a canvas capture stream and `requestAnimationFrame`.
//! The engines only see the traits, so any host that can decode, draw and
//! record can drive them.

use async_trait::async_trait;
use bytes::Bytes;
use image::RgbaImage;
use reelkit_core::PipelineError;
use std::ops::{Deref, DerefMut};

use crate::handles::TransientHandle;

/// Parameters of a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate: u32,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Load the bytes behind `handle` into a detached playback element and
    /// resolve once its metadata (duration, natural size) is known.
    async fn open_playback(
        &self,
        handle: &TransientHandle,
    ) -> Result<Box<dyn PlaybackElement>, PipelineError>;

    /// Whether a recorder can produce `mime_type` in this environment.
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create a recorder for `mime_type`, or the host's default recorder when
    /// `None`.
    fn create_recorder(
        &self,
        mime_type: Option<&str>,
        settings: CaptureSettings,
    ) -> Result<Box<dyn StreamRecorder>, PipelineError>;

    /// Resolve at the next render tick.
    async fn next_animation_frame(&self);
}

#[async_trait]
pub trait PlaybackElement: Send {
    fn duration(&self) -> f64;

    fn natural_size(&self) -> (u32, u32);

    fn current_time(&self) -> f64;

    fn is_ended(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// Seek and resolve once the seek has settled.
    async fn seek(&mut self, seconds: f64) -> Result<(), PipelineError>;

    async fn play(&mut self) -> Result<(), PipelineError>;

    fn pause(&mut self);

    /// Decoded frame at the current playback position.
    fn current_frame(&self) -> Result<&RgbaImage, PipelineError>;

    /// Drop the decoder and source. Must be idempotent.
    fn release(&mut self);
}

#[async_trait]
pub trait StreamRecorder: Send {
    /// Container/codec actually produced.
    fn mime_type(&self) -> &str;

    fn start(&mut self) -> Result<(), PipelineError>;

    /// Offer a frame of the captured surface at `timestamp` seconds since the
    /// start of capture. Recorders sample at their own frame rate and may
    /// drop frames.
    fn capture(&mut self, frame: &RgbaImage, timestamp: f64) -> Result<(), PipelineError>;

    /// Stop capture and return every data chunk produced, in order.
    async fn stop(&mut self) -> Result<Vec<Bytes>, PipelineError>;
}

/// Releases its playback element when dropped.
pub struct PlaybackGuard {
    element: Box<dyn PlaybackElement>,
}

impl PlaybackGuard {
    pub fn new(element: Box<dyn PlaybackElement>) -> Self {
        Self { element }
    }
}

impl Deref for PlaybackGuard {
    type Target = dyn PlaybackElement;

    fn deref(&self) -> &Self::Target {
        self.element.as_ref()
    }
}

impl DerefMut for PlaybackGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.element.as_mut()
    }
}

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        self.element.pause();
        self.element.release();
    }
}

/// Seek and wait for it to settle, bounded by `timeout`.
pub async fn seek_with_timeout(
    element: &mut dyn PlaybackElement,
    seconds: f64,
    timeout: std::time::Duration,
) -> Result<(), PipelineError> {
    match tokio::time::timeout(timeout, element.seek(seconds)).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::SeekTimeout {
            target_seconds: seconds,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
