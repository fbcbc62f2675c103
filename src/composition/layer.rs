use std::collections::BTreeMap;

use crate::{
    animation::{
        path::BezierPathSpec,
        track::{Prop, Track},
    },
    assets::raster::Raster,
    foundation::core::clamp_scale,
};

/// How a background plate maps onto the canvas before user scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BgMode {
    #[default]
    Fit,
    Fill,
    Stretch,
}

#[derive(Clone, Debug, Default)]
pub struct BackgroundExtras {
    pub bg_mode: BgMode,
}

#[derive(Clone, Debug)]
pub struct ForegroundExtras {
    pub opacity: f64,
    /// Visual-only overlay scalar; draws an unfilled rectangle, never crops.
    pub mask_size: f64,
    pub custom_mask: Option<Raster>,
    pub bezier_path: Option<BezierPathSpec>,
}

impl Default for ForegroundExtras {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            mask_size: 1.0,
            custom_mask: None,
            bezier_path: None,
        }
    }
}

/// Kind-specific payload. Background-only and foreground-only fields never
/// coexist on one layer.
#[derive(Clone, Debug)]
pub enum LayerKind {
    Background(BackgroundExtras),
    Foreground(ForegroundExtras),
}

/// One compositing layer: identity, base transform, keyframe tracks, and an
/// optional decoded raster backed by a retained encoded blob.
///
/// Base transform fields are the values a property takes when its track is
/// empty. Decoded pixels may be evicted at any time; `encoded` survives so
/// they can be lazily brought back.
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,

    pub x: f64,
    pub y: f64,
    /// Uniform zoom, multiplied into both axis scales at evaluation.
    pub scale: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub flip_h: f64,
    pub flip_v: f64,

    pub raster: Option<Raster>,
    pub encoded: Option<Vec<u8>>,

    tracks: BTreeMap<Prop, Track>,

    /// Set when the layer has local edits not yet flushed to the host;
    /// a non-forced descriptor reconcile leaves such layers' tracks alone.
    pub dirty: bool,
}

impl Layer {
    fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            flip_h: 0.0,
            flip_v: 0.0,
            raster: None,
            encoded: None,
            tracks: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn new_background(id: impl Into<String>, name: impl Into<String>, bg_mode: BgMode) -> Self {
        Self::new(id, name, LayerKind::Background(BackgroundExtras { bg_mode }))
    }

    pub fn new_foreground(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, LayerKind::Foreground(ForegroundExtras::default()))
    }

    pub fn is_background(&self) -> bool {
        matches!(self.kind, LayerKind::Background(_))
    }

    pub fn foreground_extras(&self) -> Option<&ForegroundExtras> {
        match &self.kind {
            LayerKind::Foreground(fg) => Some(fg),
            LayerKind::Background(_) => None,
        }
    }

    pub fn foreground_extras_mut(&mut self) -> Option<&mut ForegroundExtras> {
        match &mut self.kind {
            LayerKind::Foreground(fg) => Some(fg),
            LayerKind::Background(_) => None,
        }
    }

    pub fn has_pixels(&self) -> bool {
        self.raster.is_some()
    }

    /// Attach decoded pixels together with the encoded form they came
    /// from, so eviction can always be undone later.
    pub fn attach_raster(&mut self, raster: Raster, encoded: Option<Vec<u8>>) {
        self.raster = Some(raster);
        if encoded.is_some() {
            self.encoded = encoded;
        }
    }

    /// Drop decoded pixels only. Metadata, keyframes and the encoded blob
    /// are never discarded this way.
    pub fn evict_pixels(&mut self) {
        self.raster = None;
    }

    pub fn track(&self, prop: Prop) -> Option<&Track> {
        self.tracks.get(&prop)
    }

    pub fn set_keyframe(&mut self, prop: Prop, time: f64, value: f64) {
        self.tracks.entry(prop).or_default().set_sample(time, value);
    }

    pub fn remove_keyframe(&mut self, prop: Prop, time: f64) -> bool {
        let removed = self
            .tracks
            .get_mut(&prop)
            .is_some_and(|t| t.remove_sample(time));
        if removed && self.tracks.get(&prop).is_some_and(Track::is_empty) {
            self.tracks.remove(&prop);
        }
        removed
    }

    pub fn clear_keyframes(&mut self) {
        self.tracks.clear();
    }

    pub fn replace_track(&mut self, prop: Prop, track: Track) {
        if track.is_empty() {
            self.tracks.remove(&prop);
        } else {
            self.tracks.insert(prop, track);
        }
    }

    pub fn tracks(&self) -> impl Iterator<Item = (Prop, &Track)> {
        self.tracks.iter().map(|(p, t)| (*p, t))
    }

    /// The value a property holds when it has no keyframes.
    pub fn base_value(&self, prop: Prop) -> f64 {
        match prop {
            Prop::X => self.x,
            Prop::Y => self.y,
            Prop::Scale => self.scale,
            Prop::ScaleX => self.scale_x,
            Prop::ScaleY => self.scale_y,
            Prop::Rotation => self.rotation,
            Prop::FlipH => self.flip_h,
            Prop::FlipV => self.flip_v,
            Prop::Opacity => self.foreground_extras().map_or(1.0, |fg| fg.opacity),
            Prop::MaskSize => self.foreground_extras().map_or(1.0, |fg| fg.mask_size),
        }
    }

    pub fn set_base_value(&mut self, prop: Prop, value: f64) {
        match prop {
            Prop::X => self.x = value,
            Prop::Y => self.y = value,
            Prop::Scale => self.scale = clamp_scale(value),
            Prop::ScaleX => self.scale_x = clamp_scale(value),
            Prop::ScaleY => self.scale_y = clamp_scale(value),
            Prop::Rotation => self.rotation = value,
            Prop::FlipH => self.flip_h = value,
            Prop::FlipV => self.flip_v = value,
            Prop::Opacity => {
                if let Some(fg) = self.foreground_extras_mut() {
                    fg.opacity = value.clamp(0.0, 1.0);
                }
            }
            Prop::MaskSize => {
                if let Some(fg) = self.foreground_extras_mut() {
                    fg.mask_size = value.max(f64::MIN_POSITIVE);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_ignores_foreground_only_props() {
        let mut bg = Layer::new_background("background", "Background", BgMode::Fit);
        bg.set_base_value(Prop::Opacity, 0.2);
        assert_eq!(bg.base_value(Prop::Opacity), 1.0);
        assert_eq!(bg.base_value(Prop::MaskSize), 1.0);
    }

    #[test]
    fn scale_base_values_clamp_above_zero() {
        let mut fg = Layer::new_foreground("layer_0", "Image 1");
        fg.set_base_value(Prop::ScaleX, 0.0);
        fg.set_base_value(Prop::ScaleY, -4.0);
        assert!(fg.scale_x > 0.0);
        assert!(fg.scale_y > 0.0);
    }

    #[test]
    fn removing_last_keyframe_drops_the_track() {
        let mut fg = Layer::new_foreground("layer_0", "Image 1");
        fg.set_keyframe(Prop::X, 1.0, 5.0);
        assert!(fg.track(Prop::X).is_some());
        assert!(fg.remove_keyframe(Prop::X, 1.0));
        assert!(fg.track(Prop::X).is_none());
    }

    #[test]
    fn eviction_keeps_encoded_blob() {
        let mut fg = Layer::new_foreground("layer_0", "Image 1");
        fg.attach_raster(crate::assets::raster::Raster::new(2, 2), Some(vec![1, 2, 3]));
        fg.set_keyframe(Prop::Y, 0.0, 1.0);
        fg.evict_pixels();
        assert!(!fg.has_pixels());
        assert_eq!(fg.encoded.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(fg.track(Prop::Y).is_some());
    }
}
