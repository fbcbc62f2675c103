use crate::foundation::{
    core::Canvas,
    error::{CutoutError, CutoutResult},
};

pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 8192;
pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 120;

/// Canvas resolution and timing for one composition. Duration is always
/// derived from `total_frames / fps` so it can never drift out of sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_frames: u32,
    /// Grow (positive) or shrink (negative) the rendered alpha mask, in
    /// 3x3 dilation/erosion passes.
    #[serde(default)]
    pub mask_expansion: i32,
    /// Gaussian feather radius applied to the rendered alpha mask.
    #[serde(default)]
    pub mask_feather: u32,
}

impl Project {
    pub fn new(width: u32, height: u32, fps: u32, total_frames: u32) -> CutoutResult<Self> {
        let p = Self {
            width,
            height,
            fps,
            total_frames,
            mask_expansion: 0,
            mask_feather: 0,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> CutoutResult<()> {
        for (name, dim) in [("width", self.width), ("height", self.height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&dim) {
                return Err(CutoutError::validation(format!(
                    "project {name} must be within {MIN_DIMENSION}..={MAX_DIMENSION}, got {dim}"
                )));
            }
        }
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(CutoutError::validation(format!(
                "project fps must be within {MIN_FPS}..={MAX_FPS}, got {}",
                self.fps
            )));
        }
        if self.total_frames == 0 {
            return Err(CutoutError::validation("project total_frames must be >= 1"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Derived, never stored.
    pub fn duration_secs(&self) -> f64 {
        f64::from(self.total_frames) / f64::from(self.fps)
    }

    pub fn frame_to_secs(&self, frame: u32) -> f64 {
        f64::from(frame) / f64::from(self.fps)
    }

    pub fn set_fps(&mut self, fps: u32) -> CutoutResult<()> {
        if !(MIN_FPS..=MAX_FPS).contains(&fps) {
            return Err(CutoutError::validation(format!(
                "project fps must be within {MIN_FPS}..={MAX_FPS}, got {fps}"
            )));
        }
        self.fps = fps;
        Ok(())
    }

    pub fn set_total_frames(&mut self, total_frames: u32) -> CutoutResult<()> {
        if total_frames == 0 {
            return Err(CutoutError::validation("project total_frames must be >= 1"));
        }
        self.total_frames = total_frames;
        Ok(())
    }
}
