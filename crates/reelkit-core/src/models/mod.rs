pub mod adjustments;
pub mod asset;
pub mod descriptor;
pub mod filter;
pub mod geometry;
pub mod media;

pub use adjustments::{Adjustment, AdjustmentStack};
pub use asset::{
    CoverFrame, CropOffset, EditSnapshot, MediaAsset, ThumbnailFrame, TrimWindow, VideoState,
};
pub use descriptor::{
    AspectRatioLabel, AssetDescriptor, CropDescriptor, FilterDescriptor, TimingDescriptor,
};
pub use filter::FilterPreset;
pub use geometry::PixelRect;
pub use media::{MediaFile, MediaKind};
