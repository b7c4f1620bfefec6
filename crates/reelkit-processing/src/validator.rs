use reelkit_core::models::{MediaFile, MediaKind};
use reelkit_core::{PipelineConfig, PipelineError};
use serde::{Deserialize, Serialize};

/// Common validation errors for selected files
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<MediaKind>,
    },

    #[error("Empty file")]
    EmptyFile,
}

impl ValidationError {
    pub fn into_pipeline_error(self, file: &MediaFile) -> PipelineError {
        match self {
            ValidationError::FileTooLarge { size, max } => {
                PipelineError::FileTooLarge { size, max }
            }
            ValidationError::UnsupportedContentType { content_type, .. } => {
                PipelineError::UnsupportedMedia {
                    file_name: file.file_name.clone(),
                    mime_type: content_type,
                }
            }
            ValidationError::EmptyFile => PipelineError::EmptyFile(file.file_name.clone()),
        }
    }
}

/// What the user is authoring. Decides which media kinds can be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationMode {
    #[default]
    Post,
    Reel,
    Ad,
}

impl CreationMode {
    pub fn allowed_kinds(self) -> &'static [MediaKind] {
        match self {
            CreationMode::Post | CreationMode::Ad => &[MediaKind::Image, MediaKind::Video],
            CreationMode::Reel => &[MediaKind::Video],
        }
    }

    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s.trim().to_lowercase().as_str() {
            "post" => Ok(CreationMode::Post),
            "reel" => Ok(CreationMode::Reel),
            "ad" => Ok(CreationMode::Ad),
            _ => Err(PipelineError::InvalidInput(format!(
                "Invalid creation mode: {}",
                s
            ))),
        }
    }
}

/// Media file validator
///
/// Classifies selected files by the top-level type of their declared MIME
/// type and checks them against the per-kind size limits.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    mode: CreationMode,
    max_image_size: usize,
    max_video_size: usize,
}

impl MediaValidator {
    pub fn new(mode: CreationMode, max_image_size: usize, max_video_size: usize) -> Self {
        Self {
            mode,
            max_image_size,
            max_video_size,
        }
    }

    pub fn from_config(mode: CreationMode, config: &PipelineConfig) -> Self {
        Self::new(mode, config.max_image_size_bytes, config.max_video_size_bytes)
    }

    pub fn mode(&self) -> CreationMode {
        self.mode
    }

    /// Validate content type, returning the media kind it selects
    pub fn validate_content_type(&self, content_type: &str) -> Result<MediaKind, ValidationError> {
        let allowed = self.mode.allowed_kinds();
        MediaKind::from_mime(content_type)
            .filter(|kind| allowed.contains(kind))
            .ok_or_else(|| ValidationError::UnsupportedContentType {
                content_type: content_type.to_string(),
                allowed: allowed.to_vec(),
            })
    }

    /// Validate file size against the limit for `kind`
    pub fn validate_file_size(&self, kind: MediaKind, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = match kind {
            MediaKind::Image => self.max_image_size,
            MediaKind::Video => self.max_video_size,
        };
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// Validate all aspects of a file
    pub fn validate(&self, file: &MediaFile) -> Result<MediaKind, ValidationError> {
        let kind = self.validate_content_type(&file.mime_type)?;
        self.validate_file_size(kind, file.len())?;
        Ok(kind)
    }
}
