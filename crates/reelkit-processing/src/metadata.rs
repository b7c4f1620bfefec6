//! Probed media metadata

use serde::{Deserialize, Serialize};

/// Image metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size_bytes: Option<u64>,
}

/// Video metadata, as reported by a loaded playback element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
}

impl VideoMetadata {
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}
