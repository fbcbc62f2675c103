use crate::foundation::error::{CutoutError, CutoutResult};

/// Separable gaussian blur over interleaved `channels`-per-pixel u8 data,
/// with Q16 fixed-point weights so equal inputs always blur identically.
pub fn blur_u8(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    radius: u32,
    sigma: f32,
) -> CutoutResult<Vec<u8>> {
    if channels == 0 || channels > 4 {
        return Err(CutoutError::validation("blur channels must be within 1..=4"));
    }
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| CutoutError::evaluation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(CutoutError::evaluation(
            "blur_u8 expects src matching width*height*channels",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, channels, &kernel);
    vertical_pass(&tmp, &mut out, width, height, channels, &kernel);
    Ok(out)
}

/// Convenience wrappers for the two buffer shapes the crate uses.
pub fn blur_rgba8(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> CutoutResult<Vec<u8>> {
    blur_u8(src, width, height, 4, radius, sigma)
}

pub fn blur_gray(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> CutoutResult<Vec<u8>> {
    blur_u8(src, width, height, 1, radius, sigma)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CutoutResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CutoutError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(CutoutError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // push rounding residue into the center tap so the kernel sums to 1.0
    let delta = 65536i64 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let mid_val = i64::from(weights[mid]);
        weights[mid] = (mid_val + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, channels: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dx = ki as i32 - radius;
                let sx = (x + dx).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * channels;
                for c in 0..channels {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * channels;
            for c in 0..channels {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, channels: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dy = ki as i32 - radius;
                let sy = (y + dy).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * channels;
                for c in 0..channels {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * channels;
            for c in 0..channels {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}
