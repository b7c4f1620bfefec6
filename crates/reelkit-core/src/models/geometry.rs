use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in native pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies fully within `[0, width] x [0, height]`.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// Intersect with `[0, width] x [0, height]`. Returns `None` when nothing
    /// of the rectangle remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped = Self {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        };
        if clamped.width == 0 || clamped.height == 0 {
            None
        } else {
            Some(clamped)
        }
    }

    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_within() {
        assert!(PixelRect::new(500, 0, 3000, 3000).is_within(4000, 3000));
        assert!(!PixelRect::new(1001, 0, 3000, 3000).is_within(4000, 3000));
    }

    #[test]
    fn test_clamp_to() {
        let rect = PixelRect::new(100, 50, 400, 400).clamp_to(300, 300).unwrap();
        assert_eq!(rect, PixelRect::new(100, 50, 200, 250));
        assert!(PixelRect::new(300, 0, 10, 10).clamp_to(300, 300).is_none());
        assert!(PixelRect::new(0, 0, 0, 10).clamp_to(300, 300).is_none());
    }
}
