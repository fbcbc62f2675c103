use crate::{
    animation::track::{Prop, Track},
    composition::layer::Layer,
    foundation::core::clamp_scale,
};

/// Guard against zero-length keyframe intervals surviving time rounding.
const EPS: f64 = 1e-9;

/// Every animatable property of one layer resolved at a single time.
///
/// Flip values are carried as the raw interpolated numbers; consumers apply
/// the step rule through [`PropertySnapshot::flipped_h`] and
/// [`PropertySnapshot::flipped_v`] so flips snap instead of tweening.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertySnapshot {
    pub x: f64,
    pub y: f64,
    /// Uniform zoom; the transform multiplies it into both axis scales.
    pub scale: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub mask_size: f64,
    pub flip_h: f64,
    pub flip_v: f64,
}

impl PropertySnapshot {
    pub fn flipped_h(&self) -> bool {
        self.flip_h > 0.5
    }

    pub fn flipped_v(&self) -> bool {
        self.flip_v > 0.5
    }
}

/// Sample one track at time `t` with flat extrapolation outside the keyed
/// range and linear interpolation inside it. Pure: identical inputs give
/// bit-identical results.
pub fn sample_track(track: &Track, t: f64, fallback: f64) -> f64 {
    let keys = track.keys();
    let Some(first) = keys.first() else {
        return fallback;
    };
    if t <= first.time {
        return first.value;
    }
    let last = keys[keys.len() - 1];
    if t >= last.time {
        return last.value;
    }

    // keys are sorted and t is strictly inside (first.time, last.time)
    let idx = keys.partition_point(|k| k.time <= t);
    let a = keys[idx - 1];
    let b = keys[idx];
    let span = (b.time - a.time).max(EPS);
    a.value + (b.value - a.value) * (t - a.time) / span
}

/// Evaluate every animatable property of `layer` at time `t` (seconds).
pub fn evaluate(layer: &Layer, t: f64) -> PropertySnapshot {
    let value = |prop: Prop| -> f64 {
        match layer.track(prop) {
            Some(track) => sample_track(track, t, layer.base_value(prop)),
            None => layer.base_value(prop),
        }
    };

    PropertySnapshot {
        x: value(Prop::X),
        y: value(Prop::Y),
        scale: clamp_scale(value(Prop::Scale)),
        scale_x: clamp_scale(value(Prop::ScaleX)),
        scale_y: clamp_scale(value(Prop::ScaleY)),
        rotation: value(Prop::Rotation),
        opacity: value(Prop::Opacity).clamp(0.0, 1.0),
        mask_size: value(Prop::MaskSize),
        flip_h: value(Prop::FlipH),
        flip_v: value(Prop::FlipV),
    }
}
