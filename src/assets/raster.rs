use crate::foundation::error::{CutoutError, CutoutResult};

/// Straight-alpha RGBA8 pixel buffer, row-major.
///
/// Masks use the same storage; the mask value of a pixel is read from
/// channel 0 (threshold 128 separates selected from unselected).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Fully transparent raster of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> CutoutResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| CutoutError::validation("raster size overflow"))?;
        if data.len() != expected {
            return Err(CutoutError::validation(format!(
                "raster buffer length {} does not match {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grayscale source, expanded to opaque gray RGBA.
    pub fn from_gray(width: u32, height: u32, gray: Vec<u8>) -> CutoutResult<Self> {
        let expected = (width as usize) * (height as usize);
        if gray.len() != expected {
            return Err(CutoutError::validation(format!(
                "gray buffer length {} does not match {width}x{height}",
                gray.len()
            )));
        }
        let mut data = Vec::with_capacity(expected * 4);
        for v in gray {
            data.extend_from_slice(&[v, v, v, 255]);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn same_dims(&self, other: &Raster) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Mask value of a pixel (channel 0).
    #[inline]
    pub fn mask_value(&self, x: u32, y: u32) -> u8 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn put_mask_value(&mut self, x: u32, y: u32, v: u8) {
        self.put_pixel(x, y, [v, v, v, 255]);
    }

    /// Channel 0 extracted as a flat grayscale buffer.
    pub fn to_gray(&self) -> Vec<u8> {
        self.data.chunks_exact(4).map(|px| px[0]).collect()
    }

    /// Bilinear sample at fractional pixel coordinates. Coordinates outside
    /// the raster clamp to the edge; callers reject fully-outside points
    /// before sampling.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> [u8; 4] {
        let max_x = f64::from(self.width - 1);
        let max_y = f64::from(self.height - 1);
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - f64::from(x0);
        let fy = y - f64::from(y0);

        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x1, y0);
        let p01 = self.pixel(x0, y1);
        let p11 = self.pixel(x1, y1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
            let bot = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
            out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Nearest-neighbor sample, clamped to bounds.
    pub fn sample_nearest(&self, x: f64, y: f64) -> [u8; 4] {
        let xi = (x.round() as i64).clamp(0, i64::from(self.width) - 1) as u32;
        let yi = (y.round() as i64).clamp(0, i64::from(self.height) - 1) as u32;
        self.pixel(xi, yi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_validates_length() {
        assert!(Raster::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(Raster::from_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn pixel_roundtrip() {
        let mut r = Raster::new(3, 2);
        r.put_pixel(2, 1, [1, 2, 3, 4]);
        assert_eq!(r.pixel(2, 1), [1, 2, 3, 4]);
        assert_eq!(r.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn mask_value_reads_channel_zero() {
        let mut r = Raster::new(2, 2);
        r.put_mask_value(1, 0, 200);
        assert_eq!(r.mask_value(1, 0), 200);
        assert_eq!(r.pixel(1, 0), [200, 200, 200, 255]);
    }

    #[test]
    fn gray_roundtrip() {
        let r = Raster::from_gray(2, 1, vec![10, 250]).unwrap();
        assert_eq!(r.to_gray(), vec![10, 250]);
    }

    #[test]
    fn bilinear_midpoint_averages() {
        let mut r = Raster::new(2, 1);
        r.put_pixel(0, 0, [0, 0, 0, 0]);
        r.put_pixel(1, 0, [100, 100, 100, 100]);
        assert_eq!(r.sample_bilinear(0.5, 0.0), [50, 50, 50, 50]);
        // clamped outside
        assert_eq!(r.sample_bilinear(-5.0, 0.0), [0, 0, 0, 0]);
    }
}
