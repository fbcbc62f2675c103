//! CPU compositing of the layer stack into single frames.

pub mod blur;
pub mod compose;
pub mod mask_ops;
