//! Coordinate mapping between native pixels, on-screen rendered pixels and
//! the centred crop overlay.
//!
//! Every function here is pure. Inputs that are not yet known (zero, negative
//! or non-finite sizes) produce `None`, which callers treat as "not ready"
//! rather than as a degenerate rectangle.

use reelkit_core::models::{CropOffset, PixelRect};

/// Size of the element that hosts the preview, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub width: f64,
    pub height: f64,
}

/// Size of the source as laid out inside the container (contain fit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedRect {
    pub width: f64,
    pub height: f64,
}

/// Size of the crop selection box, centred inside the rendered rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub width: f64,
    pub height: f64,
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Contain-fit a box of `aspect` inside `width x height`.
fn contain(aspect: f64, width: f64, height: f64) -> (f64, f64) {
    if width / height > aspect {
        // Container is wider: height is the limiting side.
        (height * aspect, height)
    } else {
        (width, width / aspect)
    }
}

/// Fit the native aspect inside the container with contain semantics.
///
/// The result is snapped to whole screen pixels, the granularity at which a
/// layout engine reports element sizes. Because of that snapping the X and Y
/// native/rendered scale factors are independent in general.
pub fn compute_rendered_rect(
    native_aspect: f64,
    container_width: f64,
    container_height: f64,
) -> Option<RenderedRect> {
    if !is_positive(native_aspect)
        || !is_positive(container_width)
        || !is_positive(container_height)
    {
        return None;
    }
    let (width, height) = contain(native_aspect, container_width, container_height);
    let rendered = RenderedRect {
        width: width.round(),
        height: height.round(),
    };
    if rendered.width < 1.0 || rendered.height < 1.0 {
        return None;
    }
    Some(rendered)
}

/// Centre a box of `target_aspect` inside the rendered rect (contain fit).
pub fn compute_overlay_rect(rendered: RenderedRect, target_aspect: f64) -> Option<OverlayRect> {
    if !is_positive(target_aspect) || !is_positive(rendered.width) || !is_positive(rendered.height)
    {
        return None;
    }
    let (width, height) = contain(target_aspect, rendered.width, rendered.height);
    Some(OverlayRect { width, height })
}

/// Native-per-screen scale factors `(x, y)` of a rendered rect.
pub fn scale_factors(rendered: RenderedRect, native_width: u32, native_height: u32) -> (f64, f64) {
    (
        native_width as f64 / rendered.width,
        native_height as f64 / rendered.height,
    )
}

/// Map the overlay box to a crop rectangle in native pixels.
///
/// Rendered rect and overlay are both centred in the container, so the
/// overlay's offset from the rendered top-left is half the size difference on
/// each axis. That offset and the overlay size are scaled per axis, floored,
/// and clamped into `[0, native_width] x [0, native_height]`.
pub fn map_overlay_to_native_crop(
    container: ContainerRect,
    rendered: RenderedRect,
    overlay: OverlayRect,
    native_width: u32,
    native_height: u32,
) -> Option<PixelRect> {
    let sizes = [
        container.width,
        container.height,
        rendered.width,
        rendered.height,
        overlay.width,
        overlay.height,
    ];
    if native_width == 0 || native_height == 0 || !sizes.iter().all(|v| is_positive(*v)) {
        return None;
    }

    let rendered_left = (container.width - rendered.width) / 2.0;
    let rendered_top = (container.height - rendered.height) / 2.0;
    let overlay_left = (container.width - overlay.width) / 2.0;
    let overlay_top = (container.height - overlay.height) / 2.0;

    let (scale_x, scale_y) = scale_factors(rendered, native_width, native_height);

    let x = ((overlay_left - rendered_left) * scale_x).floor().max(0.0);
    let y = ((overlay_top - rendered_top) * scale_y).floor().max(0.0);
    let x = (x as u32).min(native_width - 1);
    let y = (y as u32).min(native_height - 1);

    let width = (overlay.width * scale_x).floor().max(0.0) as u32;
    let height = (overlay.height * scale_y).floor().max(0.0) as u32;

    PixelRect::new(x, y, width, height).clamp_to(native_width, native_height)
}

/// Inputs of the overlay-to-native chain for one preview.
///
/// Only inputs are stored. Every query recomputes the rendered rect, the
/// overlay and the crop from scratch, so a resize or aspect change can never
/// leave a stale rectangle behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropLayout {
    container: ContainerRect,
    native_width: u32,
    native_height: u32,
    target_aspect: f64,
}

impl CropLayout {
    pub fn new(native_width: u32, native_height: u32, target_aspect: f64) -> Self {
        Self {
            container: ContainerRect {
                width: 0.0,
                height: 0.0,
            },
            native_width,
            native_height,
            target_aspect,
        }
    }

    /// Resize notification from the host layout.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.container = ContainerRect { width, height };
    }

    pub fn set_target_aspect(&mut self, target_aspect: f64) {
        self.target_aspect = target_aspect;
    }

    /// Natural size arrives after metadata loads.
    pub fn set_native_size(&mut self, width: u32, height: u32) {
        self.native_width = width;
        self.native_height = height;
    }

    pub fn container(&self) -> ContainerRect {
        self.container
    }

    pub fn rendered_rect(&self) -> Option<RenderedRect> {
        if self.native_width == 0 || self.native_height == 0 {
            return None;
        }
        compute_rendered_rect(
            self.native_width as f64 / self.native_height as f64,
            self.container.width,
            self.container.height,
        )
    }

    pub fn overlay_rect(&self) -> Option<OverlayRect> {
        compute_overlay_rect(self.rendered_rect()?, self.target_aspect)
    }

    pub fn scale_factors(&self) -> Option<(f64, f64)> {
        let rendered = self.rendered_rect()?;
        Some(scale_factors(rendered, self.native_width, self.native_height))
    }

    /// Crop region in native pixels, or `None` while not ready.
    pub fn crop_region(&self) -> Option<PixelRect> {
        let rendered = self.rendered_rect()?;
        let overlay = compute_overlay_rect(rendered, self.target_aspect)?;
        map_overlay_to_native_crop(
            self.container,
            rendered,
            overlay,
            self.native_width,
            self.native_height,
        )
    }
}

/// Fit-cover scale of a native image under a crop frame of `frame_width x
/// frame_height` screen pixels.
pub fn cover_base_scale(
    frame_width: f64,
    frame_height: f64,
    native_width: u32,
    native_height: u32,
) -> Option<f64> {
    if !is_positive(frame_width) || !is_positive(frame_height) {
        return None;
    }
    if native_width == 0 || native_height == 0 {
        return None;
    }
    Some((frame_width / native_width as f64).max(frame_height / native_height as f64))
}

/// Keep the pan offset inside the range where the scaled image still covers
/// the whole frame. Re-run after every zoom or aspect change.
pub fn clamp_offset(
    offset: CropOffset,
    frame_width: f64,
    frame_height: f64,
    native_width: u32,
    native_height: u32,
    zoom: f64,
) -> CropOffset {
    let Some(base) = cover_base_scale(frame_width, frame_height, native_width, native_height)
    else {
        return CropOffset::default();
    };
    let scale = base * zoom.max(1.0);
    let max_x = ((native_width as f64 * scale - frame_width) / 2.0).max(0.0);
    let max_y = ((native_height as f64 * scale - frame_height) / 2.0).max(0.0);
    let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
    CropOffset {
        x: finite_or_zero(offset.x).clamp(-max_x, max_x),
        y: finite_or_zero(offset.y).clamp(-max_y, max_y),
    }
}

/// Native crop rectangle visible through the frame for a zoom and pan.
///
/// The offset is the screen-space displacement of the image centre from the
/// frame centre; it is clamped first, so the result always lies inside the
/// native bounds.
pub fn crop_from_pan_zoom(
    frame_width: f64,
    frame_height: f64,
    native_width: u32,
    native_height: u32,
    zoom: f64,
    offset: CropOffset,
) -> Option<PixelRect> {
    let base = cover_base_scale(frame_width, frame_height, native_width, native_height)?;
    let zoom = if zoom.is_finite() { zoom.max(1.0) } else { 1.0 };
    let scale = base * zoom;
    let offset = clamp_offset(
        offset,
        frame_width,
        frame_height,
        native_width,
        native_height,
        zoom,
    );

    let width = (frame_width / scale).round().clamp(1.0, native_width as f64);
    let height = (frame_height / scale).round().clamp(1.0, native_height as f64);
    let centre_x = native_width as f64 / 2.0 - offset.x / scale;
    let centre_y = native_height as f64 / 2.0 - offset.y / scale;
    let left = (centre_x - width / 2.0)
        .round()
        .clamp(0.0, native_width as f64 - width);
    let top = (centre_y - height / 2.0)
        .round()
        .clamp(0.0, native_height as f64 - height);

    Some(PixelRect::new(
        left as u32,
        top as u32,
        width as u32,
        height as u32,
    ))
}

/// Largest crop of `target_aspect` centred on the source.
pub fn centered_crop(
    native_width: u32,
    native_height: u32,
    target_aspect: f64,
) -> Option<PixelRect> {
    if native_width == 0 || native_height == 0 || !is_positive(target_aspect) {
        return None;
    }
    let native_aspect = native_width as f64 / native_height as f64;
    let (width, height) = if native_aspect > target_aspect {
        let width = ((native_height as f64 * target_aspect).round() as u32).clamp(1, native_width);
        (width, native_height)
    } else {
        let height = ((native_width as f64 / target_aspect).round() as u32).clamp(1, native_height);
        (native_width, height)
    };
    Some(PixelRect::new(
        (native_width - width) / 2,
        (native_height - height) / 2,
        width,
        height,
    ))
}

/// Centred square of the smaller source side.
pub fn centered_square(native_width: u32, native_height: u32) -> Option<PixelRect> {
    centered_crop(native_width, native_height, 1.0)
}

fn even_at_least_two(value: u32) -> u32 {
    let even = value - value % 2;
    even.max(2)
}

/// Encoded output size for a video crop: keeps the crop aspect, caps the long
/// side at `max_long_side` and forces both sides to even integers >= 2.
pub fn video_output_size(crop_width: u32, crop_height: u32, max_long_side: u32) -> (u32, u32) {
    let crop_width = crop_width.max(1);
    let crop_height = crop_height.max(1);
    let long_side = crop_width.max(crop_height);
    let scale = if long_side > max_long_side {
        max_long_side as f64 / long_side as f64
    } else {
        1.0
    };
    let width = (crop_width as f64 * scale).round() as u32;
    let height = (crop_height as f64 * scale).round() as u32;
    (even_at_least_two(width), even_at_least_two(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_rect_letterboxes_portrait_in_landscape_container() {
        // 9:16 portrait source in a 16:9 container.
        let rendered = compute_rendered_rect(1080.0 / 1920.0, 1600.0, 900.0).unwrap();
        assert_eq!(rendered.height, 900.0);
        assert!(rendered.width < 1600.0);
        assert_eq!(rendered.width, 506.0);
    }

    #[test]
    fn test_rendered_rect_constrains_by_width() {
        let rendered = compute_rendered_rect(16.0 / 9.0, 800.0, 800.0).unwrap();
        assert_eq!(rendered.width, 800.0);
        assert_eq!(rendered.height, 450.0);
    }

    #[test]
    fn test_rendered_rect_not_ready() {
        assert!(compute_rendered_rect(1.5, 0.0, 400.0).is_none());
        assert!(compute_rendered_rect(1.5, 400.0, f64::NAN).is_none());
        assert!(compute_rendered_rect(0.0, 400.0, 400.0).is_none());
    }

    #[test]
    fn test_overlay_is_contained_in_rendered() {
        let rendered = RenderedRect {
            width: 800.0,
            height: 450.0,
        };
        let overlay = compute_overlay_rect(rendered, 1.0).unwrap();
        assert_eq!(overlay.width, 450.0);
        assert_eq!(overlay.height, 450.0);
        let overlay = compute_overlay_rect(rendered, 4.0).unwrap();
        assert_eq!(overlay.width, 800.0);
        assert_eq!(overlay.height, 200.0);
    }

    #[test]
    fn test_portrait_mapping_uses_independent_axis_scales() {
        let mut layout = CropLayout::new(1080, 1920, 1080.0 / 1920.0);
        layout.resize(1600.0, 900.0);
        let (scale_x, scale_y) = layout.scale_factors().unwrap();
        assert_ne!(scale_x, scale_y);

        let crop = layout.crop_region().unwrap();
        assert!(crop.is_within(1080, 1920));
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 0);
        assert!(crop.width >= 1079);
        assert!(crop.height >= 1918);
    }

    #[test]
    fn test_square_overlay_on_landscape_video() {
        let mut layout = CropLayout::new(1920, 1080, 1.0);
        layout.resize(960.0, 540.0);
        let crop = layout.crop_region().unwrap();
        assert_eq!(crop, PixelRect::new(420, 0, 1080, 1080));
    }

    #[test]
    fn test_layout_recomputes_after_resize() {
        let mut layout = CropLayout::new(1920, 1080, 1.0);
        assert!(layout.crop_region().is_none());
        layout.resize(960.0, 540.0);
        let before = layout.crop_region().unwrap();
        layout.resize(333.0, 777.0);
        let after = layout.crop_region().unwrap();
        assert!(after.is_within(1920, 1080));
        assert_ne!(before, after);
        layout.set_target_aspect(9.0 / 16.0);
        let vertical = layout.crop_region().unwrap();
        assert!(vertical.width < vertical.height);
    }

    #[test]
    fn test_crop_containment_grid() {
        let natives = [(1920, 1080), (1080, 1920), (4000, 3000), (7, 5), (1, 1)];
        let containers = [(1.0, 1.0), (320.0, 180.0), (1600.0, 900.0), (333.3, 777.7)];
        let aspects = [0.25, 9.0 / 16.0, 0.8, 1.0, 16.0 / 9.0, 3.0];
        for (nw, nh) in natives {
            for (cw, ch) in containers {
                for aspect in aspects {
                    let mut layout = CropLayout::new(nw, nh, aspect);
                    layout.resize(cw, ch);
                    if let Some(crop) = layout.crop_region() {
                        assert!(crop.width > 0 && crop.height > 0);
                        assert!(
                            crop.is_within(nw, nh),
                            "{:?} escapes {}x{} (container {}x{}, aspect {})",
                            crop,
                            nw,
                            nh,
                            cw,
                            ch,
                            aspect
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_centered_square_on_landscape_image() {
        let crop = centered_crop(4000, 3000, 1.0).unwrap();
        assert_eq!(crop, PixelRect::new(500, 0, 3000, 3000));
        assert_eq!(centered_square(3000, 4000).unwrap(), PixelRect::new(0, 500, 3000, 3000));
    }

    #[test]
    fn test_pan_zoom_default_matches_centered_crop() {
        let crop =
            crop_from_pan_zoom(500.0, 500.0, 4000, 3000, 1.0, CropOffset::default()).unwrap();
        assert_eq!(crop, PixelRect::new(500, 0, 3000, 3000));
    }

    #[test]
    fn test_pan_is_clamped_to_source() {
        let offset = CropOffset { x: 10_000.0, y: -10_000.0 };
        let clamped = clamp_offset(offset, 500.0, 500.0, 4000, 3000, 1.0);
        // Image is 666.67 wide on screen at zoom 1: 83.3 px of slack each side.
        assert!((clamped.x - 83.333).abs() < 0.01);
        assert_eq!(clamped.y, 0.0);

        let crop = crop_from_pan_zoom(500.0, 500.0, 4000, 3000, 1.0, offset).unwrap();
        assert_eq!(crop, PixelRect::new(0, 0, 3000, 3000));
    }

    #[test]
    fn test_zoom_shrinks_crop() {
        let crop =
            crop_from_pan_zoom(500.0, 500.0, 4000, 3000, 2.0, CropOffset::default()).unwrap();
        assert_eq!(crop, PixelRect::new(1250, 750, 1500, 1500));
    }

    #[test]
    fn test_video_output_size_caps_and_evens() {
        assert_eq!(video_output_size(1920, 1080, 1920), (1920, 1080));
        assert_eq!(video_output_size(3840, 2160, 1920), (1920, 1080));
        assert_eq!(video_output_size(1081, 1921, 1920), (1080, 1920));
        assert_eq!(video_output_size(1, 1, 1920), (2, 2));
        assert_eq!(video_output_size(0, 5, 1920), (2, 4));
    }

    #[test]
    fn test_video_output_size_always_even() {
        for width in (1..4000).step_by(37) {
            for height in (1..4000).step_by(53) {
                let (w, h) = video_output_size(width, height, 1920);
                assert!(w % 2 == 0 && h % 2 == 0);
                assert!(w >= 2 && h >= 2);
                assert!(w <= 1920 && h <= 1920);
            }
        }
    }
}
