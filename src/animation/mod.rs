//! Keyframe tracks, time-to-value interpolation, and bezier motion paths.

pub mod eval;
pub mod path;
pub mod track;
