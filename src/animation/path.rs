use kurbo::{BezPath, ParamCurve, PathSeg, Point};

use crate::{
    animation::track::{Prop, Track},
    composition::layer::Layer,
    foundation::error::{CutoutError, CutoutResult},
};

/// A cubic bezier motion path: a start point followed by (control, control,
/// end) triples, in canvas-offset coordinates, traversed over `duration`
/// seconds. Used only to generate x/y keyframes, never as a live binding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BezierPathSpec {
    pub points: Vec<PathPoint>,
    pub duration: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl BezierPathSpec {
    pub fn validate(&self) -> CutoutResult<()> {
        if self.points.len() < 4 || (self.points.len() - 1) % 3 != 0 {
            return Err(CutoutError::animation(
                "bezier path needs a start point plus (control, control, end) triples",
            ));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(CutoutError::animation("bezier path duration must be > 0"));
        }
        Ok(())
    }

    fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let pt = |p: PathPoint| Point::new(p.x, p.y);
        path.move_to(pt(self.points[0]));
        for triple in self.points[1..].chunks_exact(3) {
            path.curve_to(pt(triple[0]), pt(triple[1]), pt(triple[2]));
        }
        path
    }
}

/// Sample `spec` at `samples + 1` evenly spaced times, parameter-uniform
/// across segments.
pub fn sample_path(spec: &BezierPathSpec, samples: usize) -> CutoutResult<Vec<(f64, Point)>> {
    spec.validate()?;
    if samples == 0 {
        return Err(CutoutError::animation("sample count must be > 0"));
    }

    let segs: Vec<PathSeg> = spec.to_bez_path().segments().collect();
    let n_segs = segs.len() as f64;

    let mut out = Vec::with_capacity(samples + 1);
    for i in 0..=samples {
        let u = (i as f64 / samples as f64) * n_segs;
        let (seg_idx, local_t) = if i == samples {
            (segs.len() - 1, 1.0)
        } else {
            (u.floor() as usize, u.fract())
        };
        let time = spec.duration * (i as f64) / (samples as f64);
        out.push((time, segs[seg_idx].eval(local_t)));
    }
    Ok(out)
}

/// Write x/y keyframes generated from the layer's bezier path into its
/// tracks, replacing what was there. One-shot: later edits to the path do
/// not retroactively move the keys.
pub fn apply_path_keyframes(layer: &mut Layer, samples: usize) -> CutoutResult<()> {
    let spec = layer
        .foreground_extras()
        .and_then(|fg| fg.bezier_path.clone())
        .ok_or_else(|| CutoutError::animation("layer has no bezier path"))?;

    let points = sample_path(&spec, samples)?;
    layer.replace_track(
        Prop::X,
        Track::from_samples(points.iter().map(|(t, p)| (*t, p.x))),
    );
    layer.replace_track(
        Prop::Y,
        Track::from_samples(points.iter().map(|(t, p)| (*t, p.y))),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_spec() -> BezierPathSpec {
        // degenerate cubic tracing the straight segment (0,0) -> (90,0)
        BezierPathSpec {
            points: vec![
                PathPoint { x: 0.0, y: 0.0 },
                PathPoint { x: 30.0, y: 0.0 },
                PathPoint { x: 60.0, y: 0.0 },
                PathPoint { x: 90.0, y: 0.0 },
            ],
            duration: 3.0,
        }
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut spec = line_spec();
        spec.points.pop();
        assert!(spec.validate().is_err());

        let mut spec = line_spec();
        spec.duration = 0.0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn samples_span_the_full_duration() {
        let points = sample_path(&line_spec(), 10).unwrap();
        assert_eq!(points.len(), 11);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[10].0, 3.0);
        assert!((points[0].1.x - 0.0).abs() < 1e-9);
        assert!((points[10].1.x - 90.0).abs() < 1e-9);
    }

    #[test]
    fn generated_keyframes_land_in_tracks() {
        let mut layer = Layer::new_foreground("layer_0", "Image 1");
        layer.foreground_extras_mut().unwrap().bezier_path = Some(line_spec());
        apply_path_keyframes(&mut layer, 6).unwrap();

        let x_track = layer.track(Prop::X).unwrap();
        assert_eq!(x_track.len(), 7);
        // endpoints of the path become first/last keys
        assert!((x_track.keys()[0].value - 0.0).abs() < 1e-9);
        assert!((x_track.keys()[6].value - 90.0).abs() < 1e-9);
        assert!(layer.track(Prop::Y).is_some());
    }

    #[test]
    fn apply_without_path_is_an_error() {
        let mut layer = Layer::new_foreground("layer_0", "Image 1");
        assert!(apply_path_keyframes(&mut layer, 4).is_err());
    }
}
