use crate::{
    animation::eval::evaluate,
    assets::raster::Raster,
    composition::{layer::Layer, project::Project, registry::LayerRegistry},
    foundation::error::CutoutResult,
    foundation::math::mul_div255_u8,
    render::mask_ops::{expand_mask, feather_mask},
    transform::pipeline::LayerMapping,
};

/// One composited frame: the color canvas plus the accumulated foreground
/// alpha mask.
#[derive(Clone, Debug)]
pub struct ComposedFrame {
    pub color: Raster,
    pub mask: Raster,
}

/// Composite every layer of `registry` at time `t` (seconds) onto a canvas
/// of the project's size. Layers paint in registry order, bottom first,
/// with simple source-over at uniform layer opacity. Layers whose pixels
/// are not decoded are skipped.
pub fn compose_frame(
    project: &Project,
    registry: &LayerRegistry,
    t: f64,
) -> CutoutResult<ComposedFrame> {
    project.validate()?;
    let canvas = project.canvas();
    let mut color = Raster::new(canvas.width, canvas.height);
    let mut mask = Raster::new(canvas.width, canvas.height);

    for layer in registry.iter() {
        let Some(raster) = layer.raster.as_ref() else {
            tracing::debug!(layer = %layer.id, "skipping layer without decoded pixels");
            continue;
        };
        paint_layer(layer, raster, project, t, &mut color, &mut mask);
    }

    if project.mask_expansion != 0 {
        mask = expand_mask(&mask, project.mask_expansion)?;
    }
    if project.mask_feather > 0 {
        mask = feather_mask(&mask, project.mask_feather)?;
    }

    Ok(ComposedFrame { color, mask })
}

fn paint_layer(
    layer: &Layer,
    raster: &Raster,
    project: &Project,
    t: f64,
    color: &mut Raster,
    mask: &mut Raster,
) {
    let canvas = project.canvas();
    let snap = evaluate(layer, t);
    let mapping = LayerMapping::new(&snap, &layer.kind, canvas, raster.width(), raster.height());

    let is_foreground = !layer.is_background();
    let opacity = if is_foreground { snap.opacity } else { 1.0 };
    let op = (opacity * 255.0).round().clamp(0.0, 255.0) as u16;
    if op == 0 {
        return;
    }

    let custom_mask = layer.foreground_extras().and_then(|fg| fg.custom_mask.as_ref());

    // Destination-driven sampling: walk only the canvas pixels the layer's
    // transformed bounds can touch, and pull each one through the inverse
    // mapping.
    let bounds = mapping.canvas_bounds();
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = (bounds.x1.ceil() as i64).clamp(0, i64::from(canvas.width)) as u32;
    let y1 = (bounds.y1.ceil() as i64).clamp(0, i64::from(canvas.height)) as u32;

    let rw = f64::from(raster.width());
    let rh = f64::from(raster.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let local = mapping.canvas_to_local(kurbo::Point::new(f64::from(x), f64::from(y)));
            if local.x < -0.5 || local.x > rw - 0.5 || local.y < -0.5 || local.y > rh - 0.5 {
                continue;
            }

            let src = raster.sample_bilinear(local.x, local.y);
            let mut a8 = mul_div255_u8(u16::from(src[3]), op);

            if let Some(cm) = custom_mask {
                let mx = local.x * f64::from(cm.width()) / rw;
                let my = local.y * f64::from(cm.height()) / rh;
                let cut = cm.sample_nearest(mx, my)[0];
                a8 = mul_div255_u8(u16::from(a8), u16::from(cut));
            }
            if a8 == 0 {
                continue;
            }

            let dst = color.pixel(x, y);
            let inv = 255u16 - u16::from(a8);
            let mut out = [0u8; 4];
            for c in 0..3 {
                out[c] = mul_div255_u8(u16::from(dst[c]), inv)
                    .saturating_add(mul_div255_u8(u16::from(src[c]), u16::from(a8)));
            }
            out[3] = dst[3].max(a8);
            color.put_pixel(x, y, out);

            if is_foreground {
                let prev = mask.mask_value(x, y);
                mask.put_mask_value(x, y, prev.max(a8));
            }
        }
    }
}
