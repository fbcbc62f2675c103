//! Shared error types, geometry primitives, and deterministic math helpers.

pub mod core;
pub mod error;
pub(crate) mod math;
