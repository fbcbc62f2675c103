use crate::{
    assets::raster::Raster,
    foundation::error::CutoutResult,
    render::blur::blur_gray,
};

/// Grow (`amount > 0`) or shrink (`amount < 0`) a mask by repeated 3x3
/// dilation/erosion passes.
pub fn expand_mask(mask: &Raster, amount: i32) -> CutoutResult<Raster> {
    if amount == 0 {
        return Ok(mask.clone());
    }
    let dilate = amount > 0;
    let mut gray = mask.to_gray();
    for _ in 0..amount.unsigned_abs() {
        gray = morph_3x3(&gray, mask.width(), mask.height(), dilate);
    }
    Raster::from_gray(mask.width(), mask.height(), gray)
}

fn morph_3x3(src: &[u8], width: u32, height: u32, dilate: bool) -> Vec<u8> {
    let w = width as i32;
    let h = height as i32;
    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut best = if dilate { 0u8 } else { 255u8 };
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let sx = (x + dx).clamp(0, w - 1);
                    let sy = (y + dy).clamp(0, h - 1);
                    let v = src[(sy * w + sx) as usize];
                    best = if dilate { best.max(v) } else { best.min(v) };
                }
            }
            out[(y * w + x) as usize] = best;
        }
    }
    out
}

/// Soften mask edges with a gaussian of kernel size `2*feather + 1`.
pub fn feather_mask(mask: &Raster, feather: u32) -> CutoutResult<Raster> {
    if feather == 0 {
        return Ok(mask.clone());
    }
    let ksize = 2 * feather + 1;
    // sigma derived from kernel size the way OpenCV does when given none
    let sigma = 0.3 * ((f64::from(ksize) - 1.0) * 0.5 - 1.0) + 0.8;
    let gray = blur_gray(
        &mask.to_gray(),
        mask.width(),
        mask.height(),
        feather,
        sigma as f32,
    )?;
    Raster::from_gray(mask.width(), mask.height(), gray)
}
