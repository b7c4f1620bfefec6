//! Test fixtures: in-memory images and clips.

use image::{ImageFormat, Rgba, RgbaImage};
use reelkit_core::models::{MediaAsset, MediaFile};
use reelkit_processing::video::DecodedClip;
use std::io::Cursor;

/// PNG with a left/right colour split, so crops are visible in the output.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([220, 40, 40, 255])
        } else {
            Rgba([40, 40, 220, 255])
        }
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode test png");
    buffer
}

/// Animated GIF of `frames` frames, each shown for `frame_seconds`.
pub fn create_test_gif(width: u32, height: u32, frames: usize, frame_seconds: f64) -> Vec<u8> {
    let images = (0..frames)
        .map(|i| RgbaImage::from_pixel(width, height, Rgba([(i * 7) as u8, 90, 160, 255])))
        .collect();
    DecodedClip::from_frames(images, frame_seconds)
        .and_then(|clip| clip.encode_gif())
        .expect("encode test gif")
        .to_vec()
}

pub fn image_asset(name: &str, width: u32, height: u32) -> MediaAsset {
    let file = MediaFile::new(name, "image/png", create_test_png(width, height));
    MediaAsset::new_image(file, width, height).expect("image asset")
}

/// Video asset whose bytes are irrelevant (for hosts that ignore them).
pub fn opaque_video_asset(width: u32, height: u32, duration: f64) -> MediaAsset {
    let file = MediaFile::new("clip.mp4", "video/mp4", vec![0u8; 32]);
    MediaAsset::new_video(file, width, height, duration).expect("video asset")
}
