use crate::{
    composition::layer::Layer,
    foundation::error::{CutoutError, CutoutResult},
};

/// Ordered layer collection. Vec order is paint order: first entry is the
/// bottom of the stack. The background, when present, is found by kind,
/// never by position.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    selected: Option<String>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: Layer) -> CutoutResult<()> {
        if layer.id.is_empty() {
            return Err(CutoutError::validation("layer id must be non-empty"));
        }
        if self.get(&layer.id).is_some() {
            return Err(CutoutError::validation(format!(
                "duplicate layer id '{}'",
                layer.id
            )));
        }
        if layer.is_background() && self.background().is_some() {
            return Err(CutoutError::validation(
                "registry already holds a background layer",
            ));
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn background(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.is_background())
    }

    pub fn background_mut(&mut self) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.is_background())
    }

    /// Move a layer to `new_index` in paint order, shifting the rest.
    pub fn reorder(&mut self, id: &str, new_index: usize) -> CutoutResult<()> {
        let from = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CutoutError::validation(format!("unknown layer id '{id}'")))?;
        if new_index >= self.layers.len() {
            return Err(CutoutError::validation(format!(
                "reorder index {new_index} out of range for {} layers",
                self.layers.len()
            )));
        }
        let layer = self.layers.remove(from);
        self.layers.insert(new_index, layer);
        Ok(())
    }

    pub fn select(&mut self, id: &str) -> CutoutResult<()> {
        if self.get(id).is_none() {
            return Err(CutoutError::validation(format!("unknown layer id '{id}'")));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Next free id in the `extracted_0`, `extracted_1`, ... sequence.
    pub fn next_extracted_id(&self) -> String {
        let mut n = 0usize;
        loop {
            let candidate = format!("extracted_{n}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
