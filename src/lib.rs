//! Cutout is a keyframe animation and compositing engine.
//!
//! A scene is a background plate plus any number of foreground cut-outs.
//! Layer transforms animate over time through per-property keyframe tracks,
//! and a painted selection can be carved out of the background into a new
//! foreground layer while the hole is plausibly filled.
//!
//! # Pipeline overview
//!
//! 1. **Model**: [`Project`] timing/resolution plus an ordered [`LayerRegistry`]
//! 2. **Evaluate**: `Layer + time -> PropertySnapshot` (pure, per displayed frame)
//! 3. **Transform**: snapshot -> forward/inverse affine ([`LayerMapping`])
//! 4. **Compose**: layer stack -> one RGBA frame plus its alpha mask
//! 5. **Extract**: selection mask -> foreground cut-out + inpainted background
//!
//! Rendering a frame *sequence* and everything UI-shaped (panels, dialogs,
//! event wiring) live with the hosting collaborator; the boundary is the
//! serialized descriptor set in [`schema::descriptor`].
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod composition;
pub mod extract;
pub mod foundation;
pub mod render;
pub mod schema;
pub mod session;
pub mod transform;

pub use animation::eval::{PropertySnapshot, evaluate, sample_track};
pub use animation::track::{Keyframe, Prop, Track};
pub use assets::raster::Raster;
pub use composition::layer::{BgMode, Layer, LayerKind};
pub use composition::project::Project;
pub use composition::registry::LayerRegistry;
pub use extract::engine::{Extraction, SmoothStrategy, extract_region};
pub use extract::jitter::jitter_mask;
pub use foundation::error::{CutoutError, CutoutResult};
pub use render::compose::{ComposedFrame, compose_frame};
pub use session::{Session, ToolMode};
pub use transform::pipeline::LayerMapping;
