use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Media type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type by its top-level type.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let normalized = mime_type.trim().to_lowercase();
        if normalized.starts_with("image/") {
            Some(MediaKind::Image)
        } else if normalized.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A named byte buffer with its declared MIME type.
///
/// Used for raw selected files, for the untouched source of an asset, and for
/// every derived output handed to the upload collaborator. The bytes are
/// reference-counted and never mutated; edits always produce a new file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without its extension ("clip.final.mp4" -> "clip.final").
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("media")
    }

    /// Derive a sibling file name: `<stem>_<suffix>.<extension>`.
    pub fn derived_name(&self, suffix: &str, extension: &str) -> String {
        format!("{}_{}.{}", self.stem(), suffix, extension)
    }
}
