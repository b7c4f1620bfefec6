//! Edit session: the selected batch plus the interactive state transitions
//! applied to it between ingestion and export.

use reelkit_core::models::{CropOffset, MediaAsset, MediaKind, PixelRect};
use reelkit_core::PipelineError;
use std::collections::HashMap;
use uuid::Uuid;

use crate::geometry::{clamp_offset, compute_rendered_rect, crop_from_pan_zoom, CropLayout};
use crate::handles::{HandleRegistry, TransientHandle};
use crate::ingest::IngestReport;
use crate::video::FilmstripGenerator;

/// On-screen crop frame for image pan/zoom, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropFrame {
    pub width: f64,
    pub height: f64,
}

impl CropFrame {
    /// Largest frame of `aspect` inside a `viewport_width x viewport_height`
    /// viewport.
    pub fn fit(viewport_width: f64, viewport_height: f64, aspect: f64) -> Option<Self> {
        let rect = compute_rendered_rect(aspect, viewport_width, viewport_height)?;
        Some(Self {
            width: rect.width,
            height: rect.height,
        })
    }
}

fn reclamp_offset(asset: &mut MediaAsset, frame: CropFrame) -> CropOffset {
    let offset = clamp_offset(
        asset.crop_offset(),
        frame.width,
        frame.height,
        asset.native_width(),
        asset.native_height(),
        asset.zoom_factor(),
    );
    asset.set_crop_offset(offset);
    offset
}

/// Change the crop aspect. The confirmed crop is dropped and the pan offset
/// re-clamped for the new frame.
pub fn set_target_aspect(
    asset: &mut MediaAsset,
    aspect: f64,
    frame: CropFrame,
) -> Result<CropOffset, PipelineError> {
    asset.set_target_aspect(aspect)?;
    Ok(reclamp_offset(asset, frame))
}

/// Set the zoom (clamped to `[1, MAX_ZOOM]`) and re-clamp the pan offset.
pub fn set_zoom(asset: &mut MediaAsset, zoom: f64, frame: CropFrame) -> f64 {
    let zoom = asset.set_zoom_factor(zoom);
    reclamp_offset(asset, frame);
    zoom
}

/// Drag the image under the frame by a screen-space delta.
pub fn pan_by(asset: &mut MediaAsset, dx: f64, dy: f64, frame: CropFrame) -> CropOffset {
    let current = asset.crop_offset();
    asset.set_crop_offset(CropOffset {
        x: current.x + dx,
        y: current.y + dy,
    });
    reclamp_offset(asset, frame)
}

/// Freeze the visible pan/zoom window of an image into its native crop.
pub fn confirm_image_crop(
    asset: &mut MediaAsset,
    frame: CropFrame,
) -> Result<PixelRect, PipelineError> {
    let region = crop_from_pan_zoom(
        frame.width,
        frame.height,
        asset.native_width(),
        asset.native_height(),
        asset.zoom_factor(),
        asset.crop_offset(),
    )
    .ok_or_else(|| PipelineError::NotReady("Crop frame has no size".to_string()))?;
    asset.set_crop_region(Some(region));
    Ok(region)
}

/// Map the centred overlay of a video preview in a container of
/// `container_width x container_height` to native pixels and store it.
pub fn confirm_video_crop(
    asset: &mut MediaAsset,
    container_width: f64,
    container_height: f64,
) -> Result<PixelRect, PipelineError> {
    if asset.kind() != MediaKind::Video {
        return Err(PipelineError::InvalidInput(format!(
            "{} is not a video",
            asset.source().file_name
        )));
    }
    let mut layout = CropLayout::new(
        asset.native_width(),
        asset.native_height(),
        asset.target_aspect(),
    );
    layout.resize(container_width, container_height);
    let region = layout
        .crop_region()
        .ok_or_else(|| PipelineError::NotReady("Preview not laid out".to_string()))?;
    asset.set_crop_region(Some(region));
    Ok(region)
}

/// The assets of one creation flow and the preview handles lent out for
/// them. Closing (or dropping) the session revokes every handle.
pub struct EditSession {
    id: Uuid,
    assets: Vec<MediaAsset>,
    registry: HandleRegistry,
    previews: HashMap<Uuid, TransientHandle>,
}

impl EditSession {
    pub fn new(registry: HandleRegistry, assets: Vec<MediaAsset>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, assets = assets.len(), "Edit session opened");
        Self {
            id,
            assets,
            registry,
            previews: HashMap::new(),
        }
    }

    pub fn from_report(registry: HandleRegistry, report: IngestReport) -> Self {
        Self::new(registry, report.assets)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    pub fn asset(&self, id: Uuid) -> Option<&MediaAsset> {
        self.assets.iter().find(|asset| asset.id() == id)
    }

    pub fn asset_mut(&mut self, id: Uuid) -> Option<&mut MediaAsset> {
        self.assets.iter_mut().find(|asset| asset.id() == id)
    }

    /// URL of the preview handle for an asset, registered on first use.
    pub fn preview_url(&mut self, id: Uuid) -> Option<String> {
        if let Some(handle) = self.previews.get(&id) {
            return Some(handle.url());
        }
        let asset = self.assets.iter().find(|asset| asset.id() == id)?;
        let handle = self.registry.register(asset.source());
        let url = handle.url();
        self.previews.insert(id, handle);
        Some(url)
    }

    /// Drop an asset from the batch, revoking its preview.
    pub fn remove(&mut self, id: Uuid) -> Option<MediaAsset> {
        self.previews.remove(&id);
        let index = self.assets.iter().position(|asset| asset.id() == id)?;
        Some(self.assets.remove(index))
    }

    /// Generate missing filmstrips for every video in the batch. Failures are
    /// returned per asset; the rest still get their frames.
    pub async fn prepare_filmstrips(
        &mut self,
        generator: &FilmstripGenerator,
    ) -> Vec<(Uuid, PipelineError)> {
        let mut failures = Vec::new();
        for asset in self
            .assets
            .iter_mut()
            .filter(|asset| asset.kind() == MediaKind::Video)
        {
            if let Err(e) = generator.generate(asset).await {
                tracing::warn!(asset_id = %asset.id(), error = %e, "Filmstrip generation failed");
                failures.push((asset.id(), e));
            }
        }
        failures
    }

    /// Revoke every preview handle and hand the assets back.
    pub fn close(mut self) -> Vec<MediaAsset> {
        let revoked = self.previews.len();
        self.previews.clear();
        tracing::debug!(session_id = %self.id, revoked, "Edit session closed");
        std::mem::take(&mut self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelkit_core::models::MediaFile;

    fn image(width: u32, height: u32) -> MediaAsset {
        let file = MediaFile::new("photo.jpg", "image/jpeg", vec![1u8; 8]);
        MediaAsset::new_image(file, width, height).unwrap()
    }

    fn square_frame() -> CropFrame {
        CropFrame::fit(400.0, 400.0, 1.0).unwrap()
    }

    #[test]
    fn test_frame_fits_viewport() {
        let frame = CropFrame::fit(400.0, 400.0, 9.0 / 16.0).unwrap();
        assert_eq!(frame.height, 400.0);
        assert_eq!(frame.width, 225.0);
        assert!(CropFrame::fit(0.0, 400.0, 1.0).is_none());
    }

    #[test]
    fn test_confirm_square_crop_is_centered() {
        let mut asset = image(4000, 3000);
        set_target_aspect(&mut asset, 1.0, square_frame()).unwrap();
        let region = confirm_image_crop(&mut asset, square_frame()).unwrap();
        assert_eq!(region, PixelRect::new(500, 0, 3000, 3000));
        assert_eq!(asset.crop_region(), Some(region));
    }

    #[test]
    fn test_pan_is_clamped_to_image_edges() {
        let mut asset = image(4000, 3000);
        set_target_aspect(&mut asset, 1.0, square_frame()).unwrap();
        // At zoom 1 the square frame can slide horizontally only.
        let offset = pan_by(&mut asset, 10_000.0, 10_000.0, square_frame());
        assert!(offset.x > 0.0);
        assert!(offset.y.abs() < 1e-6);

        let region = confirm_image_crop(&mut asset, square_frame()).unwrap();
        assert_eq!(region.x, 0);
        assert!(region.is_within(4000, 3000));
    }

    #[test]
    fn test_zoom_out_reclamps_offset() {
        let mut asset = image(1000, 1000);
        let frame = square_frame();
        set_zoom(&mut asset, 3.0, frame);
        pan_by(&mut asset, 300.0, -300.0, frame);
        assert_eq!(asset.crop_offset(), CropOffset { x: 300.0, y: -300.0 });

        assert_eq!(set_zoom(&mut asset, 1.0, frame), 1.0);
        let offset = asset.crop_offset();
        assert!(offset.x.abs() < 1e-6 && offset.y.abs() < 1e-6);
        assert_eq!(set_zoom(&mut asset, 50.0, frame), MediaAsset::MAX_ZOOM);
    }

    #[test]
    fn test_confirm_video_crop_maps_overlay() {
        let file = MediaFile::new("clip.mp4", "video/mp4", vec![1u8; 8]);
        let mut asset = MediaAsset::new_video(file, 1920, 1080, 12.0).unwrap();
        asset.set_target_aspect(1.0).unwrap();
        let region = confirm_video_crop(&mut asset, 800.0, 450.0).unwrap();
        assert_eq!(region.height, 1080);
        assert!((1079..=1080).contains(&region.width));
        assert!((419..=421).contains(&region.x));
        assert!(region.is_within(1920, 1080));

        assert!(matches!(
            confirm_video_crop(&mut asset, 0.0, 450.0),
            Err(PipelineError::NotReady(_))
        ));
        assert!(confirm_video_crop(&mut image(10, 10), 100.0, 100.0).is_err());
    }

    #[test]
    fn test_session_revokes_previews() {
        let registry = HandleRegistry::new();
        let first = image(10, 10);
        let second = image(20, 20);
        let (first_id, second_id) = (first.id(), second.id());
        let mut session = EditSession::new(registry.clone(), vec![first, second]);

        let url = session.preview_url(first_id).unwrap();
        assert_eq!(session.preview_url(first_id).unwrap(), url);
        session.preview_url(second_id).unwrap();
        assert_eq!(registry.live_count(), 2);
        assert!(session.preview_url(Uuid::new_v4()).is_none());

        assert!(session.remove(second_id).is_some());
        assert_eq!(registry.live_count(), 1);

        let assets = session.close();
        assert_eq!(assets.len(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_dropping_session_revokes_previews() {
        let registry = HandleRegistry::new();
        let asset = image(10, 10);
        let id = asset.id();
        let mut session = EditSession::new(registry.clone(), vec![asset]);
        session.preview_url(id).unwrap();
        drop(session);
        assert_eq!(registry.live_count(), 0);
    }
}
