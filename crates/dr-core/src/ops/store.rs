use std::collections::{BTreeMap, HashMap};

use crate::errors::{DrError, Result};
use crate::model::{Element, LayerName, Manifest};

/// In-memory Element Store
///
/// Arena per layer: elements live in a `Vec` in insertion order, and a flat
/// index maps each id to its (layer, slot). Ids are unique across all
/// layers. Only layers present in the store can hold elements.
///
/// Not thread-safe on its own; the model manager owns the single mutable
/// copy and hands out clones as snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    layers: BTreeMap<LayerName, Vec<Element>>,
    index: HashMap<String, (LayerName, usize)>,
}

impl ElementStore {
    /// Create a store with empty arenas for the given layers
    pub fn new(layers: &[LayerName]) -> Self {
        Self {
            layers: layers.iter().map(|l| (*l, Vec::new())).collect(),
            index: HashMap::new(),
        }
    }

    /// Create a store with an arena for every enabled manifest layer
    pub fn for_manifest(manifest: &Manifest) -> Self {
        Self::new(&manifest.enabled_layers())
    }

    /// Layers held by the store, in layer order
    pub fn layers(&self) -> Vec<LayerName> {
        self.layers.keys().copied().collect()
    }

    pub fn has_layer(&self, layer: LayerName) -> bool {
        self.layers.contains_key(&layer)
    }

    /// Add an empty arena; no-op if the layer is present
    pub fn add_layer(&mut self, layer: LayerName) {
        self.layers.entry(layer).or_default();
    }

    /// Drop a layer with all its elements, returning them
    pub fn remove_layer(&mut self, layer: LayerName) -> Vec<Element> {
        let removed = self.layers.remove(&layer).unwrap_or_default();
        for element in &removed {
            self.index.remove(&element.id);
        }
        removed
    }

    /// Get an element by ID
    pub fn get(&self, id: &str) -> Option<&Element> {
        let (layer, slot) = self.index.get(id)?;
        self.layers.get(layer).and_then(|arena| arena.get(*slot))
    }

    /// Get an element by ID, failing when absent
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if no layer holds the id.
    pub fn require(&self, id: &str) -> Result<&Element> {
        self.get(id).ok_or_else(|| DrError::ElementNotFound {
            element_id: id.to_string(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn layer_of(&self, id: &str) -> Option<LayerName> {
        self.index.get(id).map(|(layer, _)| *layer)
    }

    /// Elements of one layer in insertion order
    pub fn elements_in(&self, layer: LayerName) -> &[Element] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All elements: layer order, then insertion order within the layer
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.layers.values().flat_map(|arena| arena.iter())
    }

    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append an element to the end of its layer
    ///
    /// # Errors
    ///
    /// Returns `LayerNotEnabled` if the element's layer has no arena, or
    /// `DuplicateElementId` if any layer already holds the id.
    pub fn insert(&mut self, element: Element) -> Result<()> {
        if let Some((existing, _)) = self.index.get(&element.id) {
            return Err(DrError::DuplicateElementId {
                element_id: element.id.clone(),
                existing_layer: existing.to_string(),
            });
        }
        let arena = self
            .layers
            .get_mut(&element.layer)
            .ok_or_else(|| DrError::LayerNotEnabled {
                layer: element.layer.to_string(),
            })?;
        self.index
            .insert(element.id.clone(), (element.layer, arena.len()));
        arena.push(element);
        Ok(())
    }

    /// Replace an element in place, keeping its slot. Returns the old value.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the id is unknown, or `InvalidDraft` if
    /// the replacement would move the element to another layer.
    pub fn replace(&mut self, element: Element) -> Result<Element> {
        let (layer, slot) =
            *self
                .index
                .get(&element.id)
                .ok_or_else(|| DrError::ElementNotFound {
                    element_id: element.id.clone(),
                })?;
        if layer != element.layer {
            return Err(DrError::InvalidDraft {
                reason: format!(
                    "element {} belongs to layer {} and cannot move to {}",
                    element.id, layer, element.layer
                ),
            });
        }
        let arena = self.arena_mut(layer)?;
        let current = arena.get_mut(slot).ok_or_else(|| DrError::Internal {
            message: format!("index points past arena end for {}", element.id),
        })?;
        Ok(std::mem::replace(current, element))
    }

    /// Remove an element, shifting later slots of its layer down
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the id is unknown.
    pub fn remove(&mut self, id: &str) -> Result<Element> {
        let (layer, slot) = self
            .index
            .remove(id)
            .ok_or_else(|| DrError::ElementNotFound {
                element_id: id.to_string(),
            })?;
        let arena = self
            .layers
            .get_mut(&layer)
            .ok_or_else(|| DrError::LayerNotEnabled {
                layer: layer.to_string(),
            })?;
        if slot >= arena.len() {
            return Err(DrError::Internal {
                message: format!("index points past arena end for {}", id),
            });
        }
        let removed = arena.remove(slot);
        for element in &arena[slot..] {
            if let Some(entry) = self.index.get_mut(&element.id) {
                entry.1 -= 1;
            }
        }
        Ok(removed)
    }

    /// Elements with at least one link field targeting `id`, in store order
    pub fn referrers(&self, id: &str) -> Vec<&Element> {
        self.iter().filter(|e| e.id != id && e.references(id)).collect()
    }

    fn arena_mut(&mut self, layer: LayerName) -> Result<&mut Vec<Element>> {
        self.layers
            .get_mut(&layer)
            .ok_or_else(|| DrError::LayerNotEnabled {
                layer: layer.to_string(),
            })
    }
}
