//! Region extraction: cut-out, hole fill, smoothing, and mask jitter.

pub mod engine;
pub mod jitter;
