use std::time::{Duration, Instant};

use crate::{
    assets::{cache::RasterCache, decode::decode_raster},
    composition::{project::Project, registry::LayerRegistry},
    foundation::error::{CutoutError, CutoutResult},
    schema::descriptor::{PersistedState, ProjectDescriptor, registry_to_descriptors},
};

/// Writes to the host are coalesced within this window.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(300);

/// Mutually exclusive interaction modes. A single enum instead of parallel
/// booleans, so the session can never be painting and extracting at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Idle,
    Painting,
    PathEditing,
    Extracting,
}

#[derive(Clone, Copy, Debug)]
enum Playback {
    Stopped { at: f64 },
    Playing { started: Instant, offset: f64 },
}

/// One editor instance: project, layer stack, cache bookkeeping, and the
/// time-driven scheduling state (playback clock, repaint coalescing,
/// debounced persistence).
///
/// All methods take the current instant explicitly, so scheduling behavior
/// is a pure function of the clock the caller supplies.
#[derive(Debug)]
pub struct Session {
    pub project: Project,
    pub registry: LayerRegistry,
    cache: RasterCache,
    tool: ToolMode,
    playback: Playback,
    dirty: bool,
    last_flush: Option<Instant>,
    repaint_requested: bool,
}

impl Session {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            registry: LayerRegistry::new(),
            cache: RasterCache::new(),
            tool: ToolMode::Idle,
            playback: Playback::Stopped { at: 0.0 },
            dirty: false,
            last_flush: None,
            repaint_requested: false,
        }
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    /// Switch interaction mode. Entering [`ToolMode::Extracting`] requires
    /// a background layer with decoded pixels.
    pub fn set_tool(&mut self, mode: ToolMode) -> CutoutResult<()> {
        if mode == ToolMode::Extracting {
            let ready = self
                .registry
                .background()
                .is_some_and(|bg| bg.has_pixels());
            if !ready {
                return Err(CutoutError::validation(
                    "extracting requires a background layer with decoded pixels",
                ));
            }
        }
        self.tool = mode;
        Ok(())
    }

    // ---- repaint coalescing ----

    /// Any number of calls within one tick collapse into one redraw.
    pub fn request_repaint(&mut self) {
        self.repaint_requested = true;
    }

    /// Returns whether a redraw is due and clears the flag.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    // ---- debounced persistence ----

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_layer_dirty(&mut self, id: &str) {
        if let Some(layer) = self.registry.get_mut(id) {
            layer.dirty = true;
        }
        self.dirty = true;
    }

    /// Cancel a pending flush by clearing the flag before the tick fires.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the debounce window has passed and a flush should happen.
    pub fn persist_due(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_flush {
            Some(last) => now.duration_since(last) >= PERSIST_DEBOUNCE,
            None => true,
        }
    }

    /// Serialize the full state for the host and clear the dirty flags.
    pub fn flush_persisted(&mut self, now: Instant) -> CutoutResult<String> {
        let state = PersistedState {
            project: ProjectDescriptor::from(&self.project),
            layers: registry_to_descriptors(&self.registry)?,
        };
        let json = serde_json::to_string(&state)
            .map_err(|e| CutoutError::serde(format!("serialize persisted state: {e}")))?;
        self.dirty = false;
        self.last_flush = Some(now);
        for layer in self.registry.iter_mut() {
            layer.dirty = false;
        }
        Ok(json)
    }

    // ---- playback ----

    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    pub fn play(&mut self, now: Instant) {
        if let Playback::Stopped { at } = self.playback {
            self.playback = Playback::Playing {
                started: now,
                offset: at,
            };
        }
    }

    /// Freeze the displayed time where it is; nothing to roll back since
    /// state is time-driven, not accumulated.
    pub fn stop(&mut self, now: Instant) {
        if self.is_playing() {
            let at = self.current_time(now);
            self.playback = Playback::Stopped { at };
        }
    }

    pub fn scrub(&mut self, t: f64) {
        let clamped = t.clamp(0.0, self.project.duration_secs());
        self.playback = Playback::Stopped { at: clamped };
    }

    /// Displayed time as a pure function of wall-clock elapsed time modulo
    /// duration, so frame drops never desynchronize playback speed.
    pub fn current_time(&self, now: Instant) -> f64 {
        match self.playback {
            Playback::Stopped { at } => at,
            Playback::Playing { started, offset } => {
                let elapsed = now.duration_since(started).as_secs_f64() + offset;
                elapsed % self.project.duration_secs()
            }
        }
    }

    // ---- raster cache ----

    pub fn is_decode_in_flight(&self, id: &str) -> bool {
        self.cache.is_in_flight(id)
    }

    /// Free a layer's decoded pixels. Refused for the selected layer and
    /// for layers with a decode outstanding; metadata, keyframes and the
    /// encoded blob always survive.
    pub fn evict_raster(&mut self, id: &str) -> bool {
        if !self.cache.can_evict(id, self.registry.selected_id()) {
            tracing::debug!(layer = %id, "eviction refused");
            return false;
        }
        match self.registry.get_mut(id) {
            Some(layer) if layer.has_pixels() => {
                layer.evict_pixels();
                true
            }
            _ => false,
        }
    }

    /// Bring back evicted pixels from the retained encoded form. No-op when
    /// pixels are already decoded; refused while a decode is outstanding.
    pub fn ensure_decoded(&mut self, id: &str) -> CutoutResult<()> {
        let layer = self
            .registry
            .get(id)
            .ok_or_else(|| CutoutError::validation(format!("unknown layer id '{id}'")))?;
        if layer.has_pixels() {
            return Ok(());
        }
        let Some(encoded) = layer.encoded.clone() else {
            return Err(CutoutError::decode(format!(
                "layer '{id}' has no encoded raster to decode"
            )));
        };
        if !self.cache.begin_decode(id) {
            return Ok(());
        }

        let result = decode_raster(&encoded);
        self.cache.finish_decode(id);
        match result {
            Ok(raster) => {
                if let Some(layer) = self.registry.get_mut(id) {
                    layer.attach_raster(raster, None);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(layer = %id, error = %e, "redecode failed, layer kept without pixels");
                Ok(())
            }
        }
    }
}
