use image::{Rgba, RgbaImage};

use super::style::FilterOp;

/// 3x3 colour matrix applied to linear-ish RGB in `0..=255`.
type ColorMatrix = [[f32; 3]; 3];

/// Pixel-wise implementation of the filter functions a browser canvas
/// applies during `drawImage`.
pub struct ImageFilters;

impl ImageFilters {
    /// Apply every op in order, in place.
    pub fn apply_ops(img: &mut RgbaImage, ops: &[FilterOp]) {
        for op in ops {
            if op.is_identity() {
                continue;
            }
            match *op {
                FilterOp::Brightness(amount) => Self::adjust_brightness(img, amount),
                FilterOp::Contrast(amount) => Self::adjust_contrast(img, amount),
                FilterOp::Saturate(amount) => Self::apply_matrix(img, &saturate_matrix(amount)),
                FilterOp::Sepia(amount) => Self::apply_matrix(img, &sepia_matrix(amount)),
                FilterOp::Grayscale(amount) => Self::apply_matrix(img, &grayscale_matrix(amount)),
                FilterOp::HueRotate(degrees) => {
                    Self::apply_matrix(img, &hue_rotate_matrix(degrees))
                }
            }
        }
    }

    /// Multiply RGB by `amount` (1.0 is no change).
    pub fn adjust_brightness(img: &mut RgbaImage, amount: f32) {
        for pixel in img.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            *pixel = Rgba([
                clamp_channel(r as f32 * amount),
                clamp_channel(g as f32 * amount),
                clamp_channel(b as f32 * amount),
                a,
            ]);
        }
    }

    /// Scale distance from mid-grey by `amount` (1.0 is no change).
    pub fn adjust_contrast(img: &mut RgbaImage, amount: f32) {
        let intercept = 128.0 * (1.0 - amount);
        for pixel in img.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            *pixel = Rgba([
                clamp_channel(r as f32 * amount + intercept),
                clamp_channel(g as f32 * amount + intercept),
                clamp_channel(b as f32 * amount + intercept),
                a,
            ]);
        }
    }

    fn apply_matrix(img: &mut RgbaImage, m: &ColorMatrix) {
        for pixel in img.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let (r, g, b) = (r as f32, g as f32, b as f32);
            *pixel = Rgba([
                clamp_channel(m[0][0] * r + m[0][1] * g + m[0][2] * b),
                clamp_channel(m[1][0] * r + m[1][1] * g + m[1][2] * b),
                clamp_channel(m[2][0] * r + m[2][1] * g + m[2][2] * b),
                a,
            ]);
        }
    }

    /// Composite onto an opaque black surface with a global alpha of
    /// `opacity`. The result is fully opaque, as a JPEG surface would be.
    pub fn flatten_onto_black(img: &mut RgbaImage, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        for pixel in img.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let coverage = opacity * (a as f32 / 255.0);
            *pixel = Rgba([
                clamp_channel(r as f32 * coverage),
                clamp_channel(g as f32 * coverage),
                clamp_channel(b as f32 * coverage),
                255,
            ]);
        }
    }
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn saturate_matrix(s: f32) -> ColorMatrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn sepia_matrix(amount: f32) -> ColorMatrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> ColorMatrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}
