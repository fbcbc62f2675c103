/// Animatable layer properties. Booleans (the flips) are carried as 0/1
/// samples so every track shares one numeric representation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    X,
    Y,
    /// Uniform zoom, multiplied into both per-axis scales.
    Scale,
    ScaleX,
    ScaleY,
    Rotation,
    Opacity,
    MaskSize,
    FlipH,
    FlipV,
}

impl Prop {
    pub const ALL: [Prop; 10] = [
        Prop::X,
        Prop::Y,
        Prop::Scale,
        Prop::ScaleX,
        Prop::ScaleY,
        Prop::Rotation,
        Prop::Opacity,
        Prop::MaskSize,
        Prop::FlipH,
        Prop::FlipV,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Prop::X => "x",
            Prop::Y => "y",
            Prop::Scale => "scale",
            Prop::ScaleX => "scale_x",
            Prop::ScaleY => "scale_y",
            Prop::Rotation => "rotation",
            Prop::Opacity => "opacity",
            Prop::MaskSize => "mask_size",
            Prop::FlipH => "flip_h",
            Prop::FlipV => "flip_v",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// One (time, value) sample on a property track. Times are seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

/// Keyframe times round to two decimals; this is the 10^2 scale factor.
const TIME_SCALE: f64 = 100.0;

pub fn round_time(t: f64) -> f64 {
    (t * TIME_SCALE).round() / TIME_SCALE
}

/// Strictly time-ascending keyframe sequence for a single property.
/// Inserting at an existing (rounded) time replaces the sample.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    keys: Vec<Keyframe>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn set_sample(&mut self, time: f64, value: f64) {
        let time = round_time(time);
        match self
            .keys
            .binary_search_by(|k| k.time.partial_cmp(&time).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(idx) => self.keys[idx].value = value,
            Err(idx) => self.keys.insert(idx, Keyframe { time, value }),
        }
    }

    pub fn remove_sample(&mut self, time: f64) -> bool {
        let time = round_time(time);
        let before = self.keys.len();
        self.keys.retain(|k| k.time != time);
        self.keys.len() != before
    }

    /// Rebuild the track from arbitrary (possibly unsorted, duplicated)
    /// samples, applying the same rounding/replacement rules as
    /// [`Track::set_sample`].
    pub fn from_samples(samples: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut track = Self::new();
        for (t, v) in samples {
            track.set_sample(t, v);
        }
        track
    }
}
