//! Reelkit Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the media-authoring pipeline and its front ends.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ErrorMetadata, LogLevel, PipelineError};
pub use models::{
    Adjustment, AdjustmentStack, AspectRatioLabel, AssetDescriptor, CoverFrame, CropDescriptor,
    CropOffset, EditSnapshot, FilterDescriptor, FilterPreset, MediaAsset, MediaFile, MediaKind,
    PixelRect, ThumbnailFrame, TimingDescriptor, TrimWindow, VideoState,
};
