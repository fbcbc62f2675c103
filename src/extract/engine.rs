use crate::{
    assets::{decode::encode_png, raster::Raster},
    composition::{layer::Layer, registry::LayerRegistry},
    foundation::error::{CutoutError, CutoutResult},
    render::blur::blur_rgba8,
};

/// Mask value above which a pixel counts as selected.
pub const SELECT_THRESHOLD: u8 = 128;
/// Looser threshold used by the smoothing passes so the blend bleeds
/// slightly past the hard selection edge.
pub const BLEED_THRESHOLD: u8 = 64;
/// Disk radius for the distance-weighted hole fill. Selections wider than
/// twice this leave their innermost pixels untouched.
pub const FILL_RADIUS: u32 = 10;
/// 3x3 convolution iterations in [`SmoothStrategy::Convolution`] mode.
pub const CONV_ITERATIONS: u32 = 5;

/// How the filled hole gets its final smoothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothStrategy {
    /// Iterated 3x3 weighted-average kernel over the bled selection.
    Convolution,
    /// Blur the original background at decreasing radii and composite each
    /// pass at partial opacity, approximating a radial falloff.
    RadialComposite,
}

/// Outcome of one extraction: the id of the new foreground layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub layer_id: String,
}

/// Carve the selected region out of the background into a new foreground
/// layer and fill the hole in place.
///
/// Validates everything before touching the registry, so a failed call
/// leaves no partial state behind. May be invoked repeatedly against the
/// same background; each call creates an independently numbered layer.
#[tracing::instrument(skip(registry, mask), fields(strategy = ?strategy))]
pub fn extract_region(
    registry: &mut LayerRegistry,
    mask: &Raster,
    strategy: SmoothStrategy,
) -> CutoutResult<Extraction> {
    let background = registry
        .background()
        .ok_or_else(|| CutoutError::extraction("no background layer to extract from"))?;
    let bg_id = background.id.clone();
    let bg_raster = background
        .raster
        .clone()
        .ok_or_else(|| CutoutError::extraction("background layer has no decoded raster"))?;

    if !bg_raster.same_dims(mask) {
        return Err(CutoutError::validation(format!(
            "selection mask {}x{} does not match background {}x{}",
            mask.width(),
            mask.height(),
            bg_raster.width(),
            bg_raster.height()
        )));
    }
    if !has_selection(mask) {
        return Err(CutoutError::validation(
            "selection mask has no pixel above the selection threshold",
        ));
    }

    let cutout = cut_foreground(&bg_raster, mask);
    let filled = fill_hole(&bg_raster, mask);
    let smoothed = match strategy {
        SmoothStrategy::Convolution => smooth_convolution(&filled, mask),
        SmoothStrategy::RadialComposite => smooth_radial(&bg_raster, filled, mask)?,
    };

    let layer_id = registry.next_extracted_id();
    let number = layer_id.rsplit('_').next().unwrap_or("0");
    let mut layer = Layer::new_foreground(&layer_id, format!("Extracted {number}"));
    let encoded = encode_png(&cutout)?;
    layer.attach_raster(cutout, Some(encoded));

    let new_encoded = encode_png(&smoothed)?;
    let bg = registry
        .get_mut(&bg_id)
        .ok_or_else(|| CutoutError::extraction("background layer disappeared mid-extraction"))?;
    // pixels change; identity, transform and keyframes do not
    bg.attach_raster(smoothed, Some(new_encoded));

    registry.add(layer)?;
    tracing::debug!(layer = %layer_id, "extracted foreground layer");
    Ok(Extraction { layer_id })
}

fn has_selection(mask: &Raster) -> bool {
    (0..mask.height()).any(|y| (0..mask.width()).any(|x| mask.mask_value(x, y) > SELECT_THRESHOLD))
}

/// Step 1: selected pixels become opaque copies of the background, the rest
/// transparent. With default placement (offset 0, scale 1) the cut-out maps
/// back onto its original footprint.
fn cut_foreground(bg: &Raster, mask: &Raster) -> Raster {
    let mut out = Raster::new(bg.width(), bg.height());
    for y in 0..bg.height() {
        for x in 0..bg.width() {
            if mask.mask_value(x, y) > SELECT_THRESHOLD {
                let [r, g, b, _] = bg.pixel(x, y);
                out.put_pixel(x, y, [r, g, b, 255]);
            }
        }
    }
    out
}

/// Step 2: distance-weighted average of unselected neighbors within
/// [`FILL_RADIUS`]. Pixels with no unselected neighbor in range keep their
/// original color.
fn fill_hole(bg: &Raster, mask: &Raster) -> Raster {
    let mut out = bg.clone();
    let r = FILL_RADIUS as i64;
    let radius = FILL_RADIUS as f64;
    let w = i64::from(bg.width());
    let h = i64::from(bg.height());

    for y in 0..h {
        for x in 0..w {
            if mask.mask_value(x as u32, y as u32) <= SELECT_THRESHOLD {
                continue;
            }

            let mut weight_sum = 0.0f64;
            let mut acc = [0.0f64; 4];
            for dy in -r..=r {
                for dx in -r..=r {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || nx >= w || ny < 0 || ny >= h {
                        continue;
                    }
                    if mask.mask_value(nx as u32, ny as u32) > SELECT_THRESHOLD {
                        continue;
                    }
                    let dist = ((dx * dx + dy * dy) as f64).sqrt();
                    let weight = radius - dist;
                    if weight <= 0.0 {
                        continue;
                    }
                    let px = bg.pixel(nx as u32, ny as u32);
                    for (a, &v) in acc.iter_mut().zip(px.iter()) {
                        *a += weight * f64::from(v);
                    }
                    weight_sum += weight;
                }
            }

            if weight_sum > 0.0 {
                let mut px = [0u8; 4];
                for (o, a) in px.iter_mut().zip(acc.iter()) {
                    *o = (a / weight_sum).round().clamp(0.0, 255.0) as u8;
                }
                out.put_pixel(x as u32, y as u32, px);
            }
        }
    }
    out
}

/// Step 3, convolution mode: iterate a 3x3 weighted-average kernel over the
/// bled selection, always reading from the previous iteration's snapshot.
fn smooth_convolution(filled: &Raster, mask: &Raster) -> Raster {
    const KERNEL: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];
    const KERNEL_SUM: f64 = 16.0;

    let w = i64::from(filled.width());
    let h = i64::from(filled.height());
    let mut current = filled.clone();

    for _ in 0..CONV_ITERATIONS {
        let snapshot = current.clone();
        for y in 0..h {
            for x in 0..w {
                if mask.mask_value(x as u32, y as u32) <= BLEED_THRESHOLD {
                    continue;
                }
                let mut acc = [0.0f64; 4];
                for (ky, row) in KERNEL.iter().enumerate() {
                    for (kx, &weight) in row.iter().enumerate() {
                        let sx = (x + kx as i64 - 1).clamp(0, w - 1);
                        let sy = (y + ky as i64 - 1).clamp(0, h - 1);
                        let px = snapshot.pixel(sx as u32, sy as u32);
                        for (a, &v) in acc.iter_mut().zip(px.iter()) {
                            *a += weight * f64::from(v);
                        }
                    }
                }
                let mut px = [0u8; 4];
                for (o, a) in px.iter_mut().zip(acc.iter()) {
                    *o = (a / KERNEL_SUM).round().clamp(0.0, 255.0) as u8;
                }
                current.put_pixel(x as u32, y as u32, px);
            }
        }
    }
    current
}

/// Step 3, decreasing-radius mode: blur the original background at
/// shrinking radii and blend each pass at half opacity into the selected
/// region, sharper toward the mask's outer edge.
fn smooth_radial(original: &Raster, filled: Raster, mask: &Raster) -> CutoutResult<Raster> {
    const PASSES: [u32; 5] = [10, 8, 6, 4, 2];
    const PASS_OPACITY: f64 = 0.5;

    let mut out = filled;
    for radius in PASSES {
        let sigma = radius as f32 / 2.0;
        let blurred = blur_rgba8(
            original.data(),
            original.width(),
            original.height(),
            radius,
            sigma,
        )?;
        for y in 0..out.height() {
            for x in 0..out.width() {
                if mask.mask_value(x, y) <= BLEED_THRESHOLD {
                    continue;
                }
                let idx = ((y as usize) * (out.width() as usize) + (x as usize)) * 4;
                let dst = out.pixel(x, y);
                let mut px = [0u8; 4];
                for c in 0..4 {
                    let blended = f64::from(dst[c]) * (1.0 - PASS_OPACITY)
                        + f64::from(blurred[idx + c]) * PASS_OPACITY;
                    px[c] = blended.round().clamp(0.0, 255.0) as u8;
                }
                out.put_pixel(x, y, px);
            }
        }
    }
    Ok(out)
}
