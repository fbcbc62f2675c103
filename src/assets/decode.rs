use std::io::Cursor;

use anyhow::Context;

use crate::{assets::raster::Raster, foundation::error::CutoutResult};

pub fn decode_raster(bytes: &[u8]) -> CutoutResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Raster::from_rgba8(width, height, rgba.into_raw())
}

/// Decode an encoded image as a grayscale mask (luma into channel 0).
pub fn decode_mask(bytes: &[u8]) -> CutoutResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode mask from memory")?;
    let luma = dyn_img.to_luma8();
    let (width, height) = luma.dimensions();
    Raster::from_gray(width, height, luma.into_raw())
}

pub fn encode_png(raster: &Raster) -> CutoutResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(raster.width(), raster.height(), raster.data().to_vec())
        .context("raster buffer does not match its dimensions")?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode raster as png")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let mut r = Raster::new(2, 2);
        r.put_pixel(0, 0, [10, 20, 30, 255]);
        r.put_pixel(1, 1, [200, 150, 100, 128]);

        let png = encode_png(&r).unwrap();
        let back = decode_raster(&png).unwrap();
        assert_eq!(back.width(), 2);
        assert_eq!(back.height(), 2);
        assert_eq!(back.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(back.pixel(1, 1), [200, 150, 100, 128]);
    }

    #[test]
    fn decode_garbage_is_an_error() {
        assert!(decode_raster(b"not an image").is_err());
        assert!(decode_mask(b"not an image").is_err());
    }

    #[test]
    fn mask_decode_reads_luma() {
        let mut r = Raster::new(1, 1);
        r.put_pixel(0, 0, [255, 255, 255, 255]);
        let png = encode_png(&r).unwrap();
        let mask = decode_mask(&png).unwrap();
        assert_eq!(mask.mask_value(0, 0), 255);
    }
}
