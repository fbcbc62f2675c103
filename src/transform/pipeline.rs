use kurbo::{Affine, Point, Rect};

use crate::{
    animation::eval::PropertySnapshot,
    composition::layer::{BgMode, LayerKind},
    foundation::core::{Canvas, clamp_scale},
};

/// The scale a background plate picks up from its fit mode before user
/// scaling. Foregrounds place 1:1, so their base is (1, 1).
pub fn base_scale(kind: &LayerKind, canvas: Canvas, raster_w: u32, raster_h: u32) -> (f64, f64) {
    let LayerKind::Background(bg) = kind else {
        return (1.0, 1.0);
    };
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let iw = f64::from(raster_w.max(1));
    let ih = f64::from(raster_h.max(1));
    match bg.bg_mode {
        BgMode::Fit => {
            let s = (cw / iw).min(ch / ih);
            (s, s)
        }
        BgMode::Fill => {
            let s = (cw / iw).max(ch / ih);
            (s, s)
        }
        // canvas dimensions become the draw size directly
        BgMode::Stretch => (cw / iw, ch / ih),
    }
}

/// Fully resolved mapping between a layer's raster pixels and the canvas.
///
/// The forward chain is translate(center + offset) * rotate * scale, with
/// flip folded into the scale signs; raster pixels are first re-centered on
/// their own midpoint so the layer draws centered at the transformed origin.
#[derive(Clone, Copy, Debug)]
pub struct LayerMapping {
    translate_x: f64,
    translate_y: f64,
    rotation_rad: f64,
    scale_x: f64, // signed: base * uniform * axis scale * flip
    scale_y: f64,
    raster_w: f64,
    raster_h: f64,
}

impl LayerMapping {
    pub fn new(
        snap: &PropertySnapshot,
        kind: &LayerKind,
        canvas: Canvas,
        raster_w: u32,
        raster_h: u32,
    ) -> Self {
        let (base_x, base_y) = base_scale(kind, canvas, raster_w, raster_h);
        let uniform = clamp_scale(snap.scale);
        let flip_h = if snap.flipped_h() { -1.0 } else { 1.0 };
        let flip_v = if snap.flipped_v() { -1.0 } else { 1.0 };
        Self {
            translate_x: f64::from(canvas.width) / 2.0 + snap.x,
            translate_y: f64::from(canvas.height) / 2.0 + snap.y,
            rotation_rad: snap.rotation.to_radians(),
            scale_x: base_x * uniform * clamp_scale(snap.scale_x) * flip_h,
            scale_y: base_y * uniform * clamp_scale(snap.scale_y) * flip_v,
            raster_w: f64::from(raster_w),
            raster_h: f64::from(raster_h),
        }
    }

    /// Forward affine over centered local coordinates (raster midpoint at
    /// the origin).
    pub fn forward(&self) -> Affine {
        Affine::translate((self.translate_x, self.translate_y))
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Map a raster pixel coordinate onto the canvas.
    pub fn local_to_canvas(&self, local: Point) -> Point {
        let centered = Point::new(local.x - self.raster_w / 2.0, local.y - self.raster_h / 2.0);
        self.forward() * centered
    }

    /// Exact inverse of [`LayerMapping::local_to_canvas`]: un-translate,
    /// rotate back, divide by the same signed scales, then shift into
    /// raster pixel space. Scales were clamped at construction so the
    /// division is always defined.
    pub fn canvas_to_local(&self, canvas_pt: Point) -> Point {
        let dx = canvas_pt.x - self.translate_x;
        let dy = canvas_pt.y - self.translate_y;

        let (sin, cos) = (-self.rotation_rad).sin_cos();
        let rx = dx * cos - dy * sin;
        let ry = dx * sin + dy * cos;

        Point::new(
            rx / self.scale_x + self.raster_w / 2.0,
            ry / self.scale_y + self.raster_h / 2.0,
        )
    }

    /// Axis-aligned canvas bounds of the transformed raster, for clipping
    /// the per-pixel sampling loop.
    pub fn canvas_bounds(&self) -> Rect {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(self.raster_w, 0.0),
            Point::new(0.0, self.raster_h),
            Point::new(self.raster_w, self.raster_h),
        ];
        let mut rect: Option<Rect> = None;
        for c in corners {
            let p = self.local_to_canvas(c);
            let r = Rect::new(p.x, p.y, p.x, p.y);
            rect = Some(match rect {
                Some(acc) => acc.union(r),
                None => r,
            });
        }
        rect.unwrap_or(Rect::ZERO)
    }

    /// Mask-size overlay rectangle in centered local space. Visualization
    /// only; it does not crop.
    pub fn overlay_rect(&self, mask_size: f64) -> Rect {
        let hw = self.raster_w * mask_size / 2.0;
        let hh = self.raster_h * mask_size / 2.0;
        Rect::new(-hw, -hh, hw, hh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::layer::{BackgroundExtras, ForegroundExtras};

    fn canvas() -> Canvas {
        Canvas {
            width: 1280,
            height: 720,
        }
    }

    fn fg_kind() -> LayerKind {
        LayerKind::Foreground(ForegroundExtras::default())
    }

    fn snap() -> PropertySnapshot {
        PropertySnapshot {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            mask_size: 1.0,
            flip_h: 0.0,
            flip_v: 0.0,
        }
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn identity_snapshot_centers_the_raster() {
        let m = LayerMapping::new(&snap(), &fg_kind(), canvas(), 100, 50);
        assert_close(m.local_to_canvas(Point::new(50.0, 25.0)), Point::new(640.0, 360.0));
        assert_close(m.canvas_to_local(Point::new(640.0, 360.0)), Point::new(50.0, 25.0));
    }

    #[test]
    fn roundtrip_across_transform_grid() {
        let rotations = [0.0, 45.0, 90.0, -30.0];
        let flips = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        let local_points = [
            Point::new(0.0, 0.0),
            Point::new(99.0, 0.0),
            Point::new(13.0, 37.0),
        ];
        for rot in rotations {
            for (fh, fv) in flips {
                let s = PropertySnapshot {
                    x: -55.0,
                    y: 20.0,
                    scale_x: 1.5,
                    scale_y: 0.4,
                    rotation: rot,
                    flip_h: fh,
                    flip_v: fv,
                    ..snap()
                };
                let m = LayerMapping::new(&s, &fg_kind(), canvas(), 100, 60);
                for p in local_points {
                    assert_close(m.canvas_to_local(m.local_to_canvas(p)), p);
                }
            }
        }
    }

    #[test]
    fn fit_mode_base_scale_matches_smaller_ratio() {
        let kind = LayerKind::Background(BackgroundExtras { bg_mode: BgMode::Fit });
        let (sx, sy) = base_scale(&kind, canvas(), 1000, 500);
        assert_eq!(sx, 1.28);
        assert_eq!(sy, 1.28);

        // drawn width: raster width * base scale * user scale
        let m = LayerMapping::new(&snap(), &kind, canvas(), 1000, 500);
        let left = m.local_to_canvas(Point::new(0.0, 250.0));
        let right = m.local_to_canvas(Point::new(1000.0, 250.0));
        assert!((right.x - left.x - 1280.0).abs() < 1e-9);
    }

    #[test]
    fn fill_and_stretch_base_scales() {
        let c = canvas();
        let fill = LayerKind::Background(BackgroundExtras { bg_mode: BgMode::Fill });
        assert_eq!(base_scale(&fill, c, 1000, 500), (1.44, 1.44));

        let stretch = LayerKind::Background(BackgroundExtras {
            bg_mode: BgMode::Stretch,
        });
        assert_eq!(base_scale(&stretch, c, 1000, 500), (1.28, 1.44));
    }

    #[test]
    fn background_inverse_goes_through_base_scale() {
        let kind = LayerKind::Background(BackgroundExtras { bg_mode: BgMode::Fit });
        let m = LayerMapping::new(&snap(), &kind, canvas(), 1000, 500);
        for p in [Point::new(0.0, 0.0), Point::new(900.0, 499.0)] {
            let back = m.canvas_to_local(m.local_to_canvas(p));
            assert_close(back, p);
        }
    }

    #[test]
    fn degenerate_scale_still_inverts() {
        let s = PropertySnapshot {
            scale_x: 0.0,
            scale_y: -1.0,
            ..snap()
        };
        let m = LayerMapping::new(&s, &fg_kind(), canvas(), 10, 10);
        let p = Point::new(3.0, 7.0);
        let back = m.canvas_to_local(m.local_to_canvas(p));
        assert_close(back, p);
    }

    #[test]
    fn uniform_scale_multiplies_both_axes() {
        let s = PropertySnapshot {
            scale: 2.0,
            scale_x: 1.5,
            scale_y: 0.5,
            ..snap()
        };
        let m = LayerMapping::new(&s, &fg_kind(), canvas(), 100, 100);
        // effective scales: 2.0 * 1.5 = 3.0 and 2.0 * 0.5 = 1.0
        let p = m.local_to_canvas(Point::new(51.0, 51.0));
        assert_close(p, Point::new(643.0, 361.0));
        assert_close(m.canvas_to_local(p), Point::new(51.0, 51.0));
    }

    #[test]
    fn overlay_rect_scales_with_mask_size() {
        let m = LayerMapping::new(&snap(), &fg_kind(), canvas(), 200, 100);
        let r = m.overlay_rect(1.5);
        assert_eq!(r.width(), 300.0);
        assert_eq!(r.height(), 150.0);
        assert_eq!(r.center(), Point::new(0.0, 0.0));
    }

    #[test]
    fn ninety_degree_rotation_swaps_axes() {
        let s = PropertySnapshot {
            rotation: 90.0,
            ..snap()
        };
        let m = LayerMapping::new(&s, &fg_kind(), canvas(), 100, 100);
        // a point one pixel right of center maps one pixel down from center
        let p = m.local_to_canvas(Point::new(51.0, 50.0));
        assert_close(p, Point::new(640.0, 361.0));
    }
}
