//! The scene data model: project timing, layers, and the ordered registry.

pub mod layer;
pub mod project;
pub mod registry;
