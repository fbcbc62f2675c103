//! Per-layer affine mapping between raster pixels and the canvas.

pub mod pipeline;
