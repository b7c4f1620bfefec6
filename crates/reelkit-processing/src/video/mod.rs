//! Video engines and the host primitives they run on.

pub mod codec;
pub mod filmstrip;
pub mod host;
pub mod software;
pub mod surface;
pub mod trim;

pub use codec::{base_mime, extension_for, select_codec};
pub use filmstrip::{frame_count, FilmstripGenerator};
pub use host::{
    seek_with_timeout, CaptureSettings, MediaHost, PlaybackElement, PlaybackGuard, StreamRecorder,
};
pub use software::{DecodedClip, GifRecorder, SoftwareHost, SoftwarePlayback};
pub use surface::DrawingSurface;
pub use trim::{PassthroughReason, TrimOutcome, TrimRequest, VideoTrimEngine};
