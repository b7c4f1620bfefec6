//! Reelkit Processing Library
//!
//! Client-side media authoring: crop geometry, image rasterisation, video
//! trim/crop/re-encode, filmstrip sampling, ingestion, export and submission.

pub mod compression;
pub mod export;
pub mod geometry;
pub mod handles;
pub mod image;
pub mod ingest;
pub mod metadata;
pub mod session;
pub mod submit;
pub mod traits;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use compression::{EncodedImage, ImageCompressor, OutputFormat};
pub use export::{ExportPipeline, ExportSummary, ExportedAsset};
pub use geometry::{
    compute_overlay_rect, compute_rendered_rect, map_overlay_to_native_crop, video_output_size,
    ContainerRect, CropLayout, OverlayRect, RenderedRect,
};
pub use handles::{HandleRegistry, TransientHandle};
pub use self::image::{
    render_filter_style, FilterStyle, ImageExport, ImageProcessor, ImageTransformEngine,
    RasterOptions,
};
pub use ingest::{probe_video, IngestReport, Ingestor, RejectedFile};
pub use metadata::{ImageMetadata, VideoMetadata};
pub use session::{CropFrame, EditSession};
pub use submit::{
    extract_error_message, Submission, SubmissionFailure, SubmissionPipeline, UploadError,
    UploadedAsset, Uploader,
};
pub use traits::MediaProcessor;
pub use validator::{CreationMode, MediaValidator, ValidationError};
pub use video::{
    FilmstripGenerator, MediaHost, PassthroughReason, SoftwareHost, TrimOutcome, TrimRequest,
    VideoTrimEngine,
};
