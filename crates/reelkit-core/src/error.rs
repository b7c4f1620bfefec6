//! Error types module
//!
//! All pipeline failures are unified under [`PipelineError`]. Engines rarely
//! propagate these to the caller: most are downgraded to a tagged passthrough
//! result so a failed edit never blocks publishing the unedited original.
//! Only upload failures are meant to reach the user.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like filtered-out files
    Debug,
    /// Warning level - for recoverable issues handled by a fallback
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error: how it should be reported and whether the
/// operation that produced it can be retried.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "ENCODING_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Human-readable message suitable for the failure UI
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unsupported media: {file_name} ({mime_type})")]
    UnsupportedMedia {
        file_name: String,
        mime_type: String,
    },

    #[error("Empty file: {0}")]
    EmptyFile(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Encoding error: {message}")]
    EncodingWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Seek to {target_seconds:.3}s did not complete within {timeout_ms}ms")]
    SeekTimeout { target_seconds: f64, timeout_ms: u64 },

    #[error("Media not ready: {0}")]
    NotReady(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn pipeline_error_static_metadata(err: &PipelineError) -> (&'static str, bool, LogLevel) {
    match err {
        PipelineError::UnsupportedMedia { .. } => ("UNSUPPORTED_MEDIA", false, LogLevel::Debug),
        PipelineError::EmptyFile(_) => ("EMPTY_FILE", false, LogLevel::Debug),
        PipelineError::FileTooLarge { .. } => ("FILE_TOO_LARGE", false, LogLevel::Debug),
        PipelineError::Encoding(_) | PipelineError::EncodingWithSource { .. } => {
            ("ENCODING_ERROR", true, LogLevel::Warn)
        }
        PipelineError::SeekTimeout { .. } => ("SEEK_TIMEOUT", true, LogLevel::Warn),
        PipelineError::NotReady(_) => ("NOT_READY", true, LogLevel::Debug),
        PipelineError::Playback(_) => ("PLAYBACK_ERROR", true, LogLevel::Warn),
        PipelineError::InvalidInput(_) => ("INVALID_INPUT", false, LogLevel::Debug),
        PipelineError::Upload(_) => ("UPLOAD_FAILED", true, LogLevel::Error),
        PipelineError::Internal(_) | PipelineError::InternalWithSource { .. } => {
            ("INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl PipelineError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        pipeline_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        pipeline_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        pipeline_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::UnsupportedMedia { file_name, .. } => {
                format!("{} is not a supported photo or video", file_name)
            }
            PipelineError::EmptyFile(ref name) => format!("{} is empty", name),
            PipelineError::FileTooLarge { max, .. } => {
                format!("File is too large (max {} MB)", max / (1024 * 1024))
            }
            PipelineError::Encoding(_) | PipelineError::EncodingWithSource { .. } => {
                "Your edits could not be applied".to_string()
            }
            PipelineError::SeekTimeout { .. } | PipelineError::Playback(_) => {
                "This video could not be read".to_string()
            }
            PipelineError::NotReady(_) => "Media is still loading".to_string(),
            PipelineError::InvalidInput(ref msg) => msg.clone(),
            PipelineError::Upload(ref msg) => msg.clone(),
            PipelineError::Internal(_) | PipelineError::InternalWithSource { .. } => {
                "Something went wrong".to_string()
            }
        }
    }
}
