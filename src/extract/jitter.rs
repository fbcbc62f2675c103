use crate::{
    assets::raster::Raster,
    foundation::{
        error::{CutoutError, CutoutResult},
        math::SplitMix64,
    },
};

pub const MIN_JITTER: u32 = 1;
pub const MAX_JITTER: u32 = 10;

/// Roughen a mask's edges by resampling every pixel from a randomly
/// displaced source position within a disk of radius `amount`.
///
/// Polar sampling (`radius = amount * sqrt(u)`) keeps the displacement
/// uniform over the disk rather than clustered at the center. The operation
/// is stochastic and non-idempotent: feeding the output back in compounds
/// the irregularity. Deterministic for a given `seed`. Masks only.
pub fn jitter_mask(mask: &Raster, amount: u32, seed: u64) -> CutoutResult<Raster> {
    if !(MIN_JITTER..=MAX_JITTER).contains(&amount) {
        return Err(CutoutError::validation(format!(
            "jitter amount must be within {MIN_JITTER}..={MAX_JITTER}, got {amount}"
        )));
    }

    let mut rng = SplitMix64::new(seed);
    let w = i64::from(mask.width());
    let h = i64::from(mask.height());
    let mut out = Raster::new(mask.width(), mask.height());

    for y in 0..h {
        for x in 0..w {
            let angle = rng.next_f64() * std::f64::consts::TAU;
            let radius = f64::from(amount) * rng.next_f64().sqrt();
            let dx = (radius * angle.cos()).round() as i64;
            let dy = (radius * angle.sin()).round() as i64;

            let sx = (x + dx).clamp(0, w - 1) as u32;
            let sy = (y + dy).clamp(0, h - 1) as u32;
            out.put_pixel(x as u32, y as u32, mask.pixel(sx, sy));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_mask(w: u32, h: u32) -> Raster {
        let mut m = Raster::new(w, h);
        for y in 0..h {
            for x in 0..w / 2 {
                m.put_mask_value(x, y, 255);
            }
        }
        m
    }

    #[test]
    fn amount_bounds_are_enforced() {
        let m = half_mask(8, 8);
        assert!(jitter_mask(&m, 0, 1).is_err());
        assert!(jitter_mask(&m, 11, 1).is_err());
        assert!(jitter_mask(&m, 1, 1).is_ok());
        assert!(jitter_mask(&m, 10, 1).is_ok());
    }

    #[test]
    fn same_seed_same_result() {
        let m = half_mask(32, 32);
        let a = jitter_mask(&m, 5, 42).unwrap();
        let b = jitter_mask(&m, 5, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let m = half_mask(32, 32);
        let a = jitter_mask(&m, 5, 1).unwrap();
        let b = jitter_mask(&m, 5, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn output_values_come_from_the_input() {
        let m = half_mask(16, 16);
        let out = jitter_mask(&m, 3, 7).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                let v = out.mask_value(x, y);
                assert!(v == 0 || v == 255);
            }
        }
    }

    #[test]
    fn edge_becomes_irregular() {
        let m = half_mask(64, 64);
        let out = jitter_mask(&m, 8, 3).unwrap();
        // column 32 sat entirely unselected before; displacement should
        // drag some selected pixels across the boundary
        let crossed = (0..64).filter(|&y| out.mask_value(33, y) > 0).count();
        assert!(crossed > 0);
    }
}
