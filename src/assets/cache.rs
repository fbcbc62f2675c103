use std::collections::HashSet;

/// Decode bookkeeping for the raster cache.
///
/// Layers keep their decoded pixels in [`crate::composition::layer::Layer`];
/// this tracks which layers have a decode outstanding so eviction and
/// re-entrant decode requests can be refused while one is in flight.
#[derive(Clone, Debug, Default)]
pub struct RasterCache {
    in_flight: HashSet<String>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// Mark a decode as started. Returns false (and changes nothing) when
    /// one is already outstanding for this layer.
    pub fn begin_decode(&mut self, id: &str) -> bool {
        if self.in_flight.contains(id) {
            tracing::debug!(layer = %id, "decode already in flight, ignoring request");
            return false;
        }
        self.in_flight.insert(id.to_string());
        true
    }

    pub fn finish_decode(&mut self, id: &str) {
        self.in_flight.remove(id);
    }

    /// Whether `id` may have its pixels evicted right now: never the
    /// selected layer, never a layer with a decode outstanding.
    pub fn can_evict(&self, id: &str, selected: Option<&str>) -> bool {
        if selected == Some(id) {
            return false;
        }
        !self.is_in_flight(id)
    }
}
