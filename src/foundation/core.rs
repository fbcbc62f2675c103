use crate::foundation::error::{CutoutError, CutoutResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Smallest scale magnitude a layer may carry. Keeps the inverse transform
/// defined when a scrub drags a scale track toward zero.
pub const MIN_SCALE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> CutoutResult<Self> {
        if width == 0 || height == 0 {
            return Err(CutoutError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Clamp a scale component to at least [`MIN_SCALE`]. Non-finite inputs
/// collapse to the minimum.
pub fn clamp_scale(s: f64) -> f64 {
    if !s.is_finite() {
        return MIN_SCALE;
    }
    s.max(MIN_SCALE)
}
