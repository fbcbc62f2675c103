//! Raster buffers, encoded-image decode/encode, and cache bookkeeping.

pub mod cache;
pub mod decode;
pub mod raster;
