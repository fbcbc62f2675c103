use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{
    animation::{path::BezierPathSpec, track::Prop, track::Track},
    assets::decode::{decode_mask, decode_raster, encode_png},
    composition::{
        layer::{BgMode, Layer},
        project::Project,
        registry::LayerRegistry,
    },
    foundation::error::{CutoutError, CutoutResult},
};

/// Project half of the serialized contract with the hosting collaborator.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectDescriptor {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_frames: u32,
    pub mask_expansion: i32,
    pub mask_feather: u32,
}

impl Default for ProjectDescriptor {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 16,
            total_frames: 81,
            mask_expansion: 0,
            mask_feather: 0,
        }
    }
}

impl From<&Project> for ProjectDescriptor {
    fn from(p: &Project) -> Self {
        Self {
            width: p.width,
            height: p.height,
            fps: p.fps,
            total_frames: p.total_frames,
            mask_expansion: p.mask_expansion,
            mask_feather: p.mask_feather,
        }
    }
}

impl ProjectDescriptor {
    pub fn to_project(&self) -> CutoutResult<Project> {
        let mut p = Project::new(self.width, self.height, self.fps, self.total_frames)?;
        p.mask_expansion = self.mask_expansion;
        p.mask_feather = self.mask_feather;
        Ok(p)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeySample {
    pub time: f64,
    pub value: f64,
}

/// One layer of the serialized contract. Numeric fields deserialize
/// leniently: a string that fails to parse becomes `None`, which leaves the
/// prior value untouched during reconcile.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayerDescriptor {
    pub id: String,
    pub name: String,
    /// "background" or "foreground".
    pub kind: String,
    pub keyframes: BTreeMap<String, Vec<KeySample>>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Uniform zoom, multiplied with the per-axis scales.
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub mask_size: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub flip_h: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub flip_v: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_mode: Option<BgMode>,
    /// Encoded raster as a base64 PNG data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_mask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bezier_path: Option<BezierPathSpec>,
}

/// Everything the host persists for one editor instance.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub project: ProjectDescriptor,
    pub layers: Vec<LayerDescriptor>,
}

fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let v = serde_json::Value::deserialize(de)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    })
}

pub fn encode_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}

/// Accepts both raw base64 and `data:<mime>;base64,` wrapped payloads.
pub fn decode_data_url(s: &str) -> CutoutResult<Vec<u8>> {
    let payload = if s.starts_with("data:") {
        s.split_once(',')
            .map(|(_, body)| body)
            .ok_or_else(|| CutoutError::decode("data URL has no comma separator"))?
    } else {
        s
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| CutoutError::decode(format!("invalid base64 payload: {e}")))
}

/// Parse a persisted descriptor list, falling back to empty on malformed
/// input rather than raising to the caller.
pub fn parse_layer_descriptors(json: &str) -> Vec<LayerDescriptor> {
    match serde_json::from_str(json) {
        Ok(layers) => layers,
        Err(e) => {
            tracing::warn!(error = %e, "malformed layer descriptor list, falling back to empty");
            Vec::new()
        }
    }
}

/// Parse a whole persisted state blob with the same fallback rule.
pub fn parse_persisted_state(json: &str) -> PersistedState {
    match serde_json::from_str(json) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "malformed persisted state, falling back to defaults");
            PersistedState::default()
        }
    }
}

pub fn layer_to_descriptor(layer: &Layer) -> CutoutResult<LayerDescriptor> {
    let mut keyframes = BTreeMap::new();
    for (prop, track) in layer.tracks() {
        let samples: Vec<KeySample> = track
            .keys()
            .iter()
            .map(|k| KeySample {
                time: k.time,
                value: k.value,
            })
            .collect();
        keyframes.insert(prop.name().to_string(), samples);
    }

    let image_data = match (&layer.encoded, &layer.raster) {
        (Some(blob), _) => Some(encode_data_url(blob)),
        (None, Some(raster)) => Some(encode_data_url(&encode_png(raster)?)),
        (None, None) => None,
    };

    let fg = layer.foreground_extras();
    let custom_mask = match fg.and_then(|f| f.custom_mask.as_ref()) {
        Some(mask) => Some(encode_data_url(&encode_png(mask)?)),
        None => None,
    };

    Ok(LayerDescriptor {
        id: layer.id.clone(),
        name: layer.name.clone(),
        kind: if layer.is_background() {
            "background".to_string()
        } else {
            "foreground".to_string()
        },
        keyframes,
        x: Some(layer.x),
        y: Some(layer.y),
        scale: Some(layer.scale),
        scale_x: Some(layer.scale_x),
        scale_y: Some(layer.scale_y),
        rotation: Some(layer.rotation),
        opacity: fg.map(|f| f.opacity),
        mask_size: fg.map(|f| f.mask_size),
        flip_h: Some(layer.flip_h),
        flip_v: Some(layer.flip_v),
        bg_mode: match &layer.kind {
            crate::composition::layer::LayerKind::Background(bg) => Some(bg.bg_mode),
            crate::composition::layer::LayerKind::Foreground(_) => None,
        },
        image_data,
        custom_mask,
        bezier_path: fg.and_then(|f| f.bezier_path.clone()),
    })
}

pub fn registry_to_descriptors(registry: &LayerRegistry) -> CutoutResult<Vec<LayerDescriptor>> {
    registry.iter().map(layer_to_descriptor).collect()
}

fn build_layer(desc: &LayerDescriptor) -> CutoutResult<Layer> {
    if desc.id.is_empty() {
        return Err(CutoutError::validation("layer descriptor id must be non-empty"));
    }
    let mut layer = if desc.kind == "background" {
        Layer::new_background(&desc.id, &desc.name, desc.bg_mode.unwrap_or_default())
    } else {
        Layer::new_foreground(&desc.id, &desc.name)
    };
    apply_props(&mut layer, desc);
    apply_tracks(&mut layer, desc);
    apply_raster(&mut layer, desc);
    Ok(layer)
}

fn apply_props(layer: &mut Layer, desc: &LayerDescriptor) {
    let pairs = [
        (Prop::X, desc.x),
        (Prop::Y, desc.y),
        (Prop::Scale, desc.scale),
        (Prop::ScaleX, desc.scale_x),
        (Prop::ScaleY, desc.scale_y),
        (Prop::Rotation, desc.rotation),
        (Prop::Opacity, desc.opacity),
        (Prop::MaskSize, desc.mask_size),
        (Prop::FlipH, desc.flip_h),
        (Prop::FlipV, desc.flip_v),
    ];
    for (prop, value) in pairs {
        // None covers both "absent" and "failed to parse": prior value wins
        if let Some(v) = value {
            layer.set_base_value(prop, v);
        }
    }
    if let (Some(mode), crate::composition::layer::LayerKind::Background(bg)) =
        (desc.bg_mode, &mut layer.kind)
    {
        bg.bg_mode = mode;
    }
    if let Some(fg) = layer.foreground_extras_mut() {
        if desc.bezier_path.is_some() {
            fg.bezier_path = desc.bezier_path.clone();
        }
    }
}

fn apply_tracks(layer: &mut Layer, desc: &LayerDescriptor) {
    layer.clear_keyframes();
    for (name, samples) in &desc.keyframes {
        let Some(prop) = Prop::from_name(name) else {
            tracing::warn!(layer = %layer.id, property = %name, "unknown keyframe property, skipping");
            continue;
        };
        layer.replace_track(
            prop,
            Track::from_samples(samples.iter().map(|s| (s.time, s.value))),
        );
    }
}

fn apply_raster(layer: &mut Layer, desc: &LayerDescriptor) {
    if let Some(data_url) = &desc.image_data {
        match decode_data_url(data_url) {
            Ok(bytes) => match decode_raster(&bytes) {
                Ok(raster) => layer.attach_raster(raster, Some(bytes)),
                Err(e) => {
                    // keep the blob so a later redecode attempt can retry
                    tracing::warn!(layer = %layer.id, error = %e, "raster decode failed, layer kept without pixels");
                    layer.encoded = Some(bytes);
                }
            },
            Err(e) => {
                tracing::warn!(layer = %layer.id, error = %e, "image_data payload unreadable");
            }
        }
    }
    if let Some(mask_url) = &desc.custom_mask {
        let decoded = decode_data_url(mask_url).and_then(|bytes| decode_mask(&bytes));
        match decoded {
            Ok(mask) => {
                if let Some(fg) = layer.foreground_extras_mut() {
                    fg.custom_mask = Some(mask);
                }
            }
            Err(e) => {
                tracing::warn!(layer = %layer.id, error = %e, "custom mask unreadable, ignoring");
            }
        }
    }
}

/// Reconcile a pushed descriptor set into the registry.
///
/// Known ids are updated, unknown ids inserted. Without `force`, a layer
/// whose local edits have not been flushed keeps its tracks and base
/// transform; only its raster is refreshed. Individual bad descriptors are
/// logged and skipped rather than failing the whole batch.
pub fn apply_descriptors(registry: &mut LayerRegistry, descs: &[LayerDescriptor], force: bool) {
    for desc in descs {
        if let Some(layer) = registry.get_mut(&desc.id) {
            if force || !layer.dirty {
                apply_props(layer, desc);
                apply_tracks(layer, desc);
                if force {
                    layer.dirty = false;
                }
            }
            apply_raster(layer, desc);
        } else {
            match build_layer(desc) {
                Ok(layer) => {
                    if let Err(e) = registry.add(layer) {
                        tracing::warn!(layer = %desc.id, error = %e, "descriptor rejected by registry");
                    }
                }
                Err(e) => {
                    tracing::warn!(layer = %desc.id, error = %e, "unusable layer descriptor, skipping");
                }
            }
        }
    }
}
