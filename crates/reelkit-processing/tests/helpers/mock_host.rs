//! Scriptable media host that records what the engines ask of it.

use async_trait::async_trait;
use bytes::Bytes;
use image::{Rgba, RgbaImage};
use reelkit_core::PipelineError;
use reelkit_processing::handles::TransientHandle;
use reelkit_processing::video::{CaptureSettings, MediaHost, PlaybackElement, StreamRecorder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturedFrame {
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Default)]
pub struct HostLog {
    pub playbacks_opened: AtomicUsize,
    pub live_playbacks: AtomicUsize,
    pub recorders_created: AtomicUsize,
    pub recorder_types: Mutex<Vec<Option<String>>>,
    pub settings: Mutex<Vec<CaptureSettings>>,
    pub captures: Mutex<Vec<CapturedFrame>>,
    pub seeks: Mutex<Vec<f64>>,
    pub muted: Mutex<Option<bool>>,
}

impl HostLog {
    pub fn captures(&self) -> Vec<CapturedFrame> {
        self.captures.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }
}

#[derive(Clone)]
pub struct MockHost {
    duration: f64,
    frame: Arc<RgbaImage>,
    supported: Vec<String>,
    default_recorder: bool,
    seek_hangs: bool,
    tick: Duration,
    pub log: Arc<HostLog>,
}

impl MockHost {
    /// A clip of `duration` seconds whose every frame is a `width x height`
    /// gradient. Supports `video/webm;codecs=vp9` recording.
    pub fn new(width: u32, height: u32, duration: f64) -> Self {
        let frame = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        Self {
            duration,
            frame: Arc::new(frame),
            supported: vec!["video/webm;codecs=vp9".to_string()],
            default_recorder: true,
            seek_hangs: false,
            tick: Duration::from_millis(100),
            log: Arc::new(HostLog::default()),
        }
    }

    pub fn with_supported(mut self, supported: &[&str]) -> Self {
        self.supported = supported.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn without_default_recorder(mut self) -> Self {
        self.default_recorder = false;
        self
    }

    /// Seeks never settle.
    pub fn with_hanging_seek(mut self) -> Self {
        self.seek_hangs = true;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

#[async_trait]
impl MediaHost for MockHost {
    async fn open_playback(
        &self,
        handle: &TransientHandle,
    ) -> Result<Box<dyn PlaybackElement>, PipelineError> {
        if !handle.is_live() {
            return Err(PipelineError::NotReady("handle revoked".to_string()));
        }
        self.log.playbacks_opened.fetch_add(1, Ordering::SeqCst);
        self.log.live_playbacks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPlayback {
            duration: self.duration,
            frame: self.frame.clone(),
            seek_hangs: self.seek_hangs,
            position: 0.0,
            playing_since: None,
            released: false,
            log: self.log.clone(),
        }))
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|s| s == mime_type)
    }

    fn create_recorder(
        &self,
        mime_type: Option<&str>,
        settings: CaptureSettings,
    ) -> Result<Box<dyn StreamRecorder>, PipelineError> {
        let allowed = match mime_type {
            Some(mime) => self.is_type_supported(mime),
            None => self.default_recorder,
        };
        if !allowed {
            return Err(PipelineError::Encoding("recorder unavailable".to_string()));
        }
        self.log.recorders_created.fetch_add(1, Ordering::SeqCst);
        self.log
            .recorder_types
            .lock()
            .unwrap()
            .push(mime_type.map(str::to_string));
        self.log.settings.lock().unwrap().push(settings);
        Ok(Box::new(MockRecorder {
            mime_type: mime_type.unwrap_or("video/webm").to_string(),
            started: false,
            chunks: Vec::new(),
            log: self.log.clone(),
        }))
    }

    async fn next_animation_frame(&self) {
        tokio::time::sleep(self.tick).await;
    }
}

struct MockPlayback {
    duration: f64,
    frame: Arc<RgbaImage>,
    seek_hangs: bool,
    position: f64,
    playing_since: Option<Instant>,
    released: bool,
    log: Arc<HostLog>,
}

#[async_trait]
impl PlaybackElement for MockPlayback {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn natural_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => (self.position + since.elapsed().as_secs_f64()).min(self.duration),
            None => self.position,
        }
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.duration
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }

    fn set_muted(&mut self, muted: bool) {
        *self.log.muted.lock().unwrap() = Some(muted);
    }

    async fn seek(&mut self, seconds: f64) -> Result<(), PipelineError> {
        self.log.seeks.lock().unwrap().push(seconds);
        if self.seek_hangs {
            std::future::pending::<()>().await;
        }
        self.position = seconds.clamp(0.0, self.duration);
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PipelineError> {
        self.playing_since = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        self.position = self.current_time();
        self.playing_since = None;
    }

    fn current_frame(&self) -> Result<&RgbaImage, PipelineError> {
        Ok(&*self.frame)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.live_playbacks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

struct MockRecorder {
    mime_type: String,
    started: bool,
    chunks: Vec<Bytes>,
    log: Arc<HostLog>,
}

#[async_trait]
impl StreamRecorder for MockRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        self.started = true;
        Ok(())
    }

    fn capture(&mut self, frame: &RgbaImage, timestamp: f64) -> Result<(), PipelineError> {
        if !self.started {
            return Err(PipelineError::Encoding("not started".to_string()));
        }
        self.log.captures.lock().unwrap().push(CapturedFrame {
            timestamp,
            width: frame.width(),
            height: frame.height(),
        });
        self.chunks.push(Bytes::from(timestamp.to_le_bytes().to_vec()));
        Ok(())
    }

    async fn stop(&mut self) -> Result<Vec<Bytes>, PipelineError> {
        Ok(std::mem::take(&mut self.chunks))
    }
}
