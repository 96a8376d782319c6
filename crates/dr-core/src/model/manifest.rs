use serde::{Deserialize, Serialize};

use super::layer::LayerName;

/// Specification version written into new manifests
pub const SPEC_VERSION: &str = "0.6.0";

/// Model-level metadata.
///
/// Created once at model initialization; mutated only when layers are
/// enabled or disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub spec_version: String,
    /// Layer entries sorted by `order`
    pub layers: Vec<LayerEntry>,
}

/// A layer's identity and storage path within the model root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name: LayerName,
    pub order: u32,
    pub path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl LayerEntry {
    pub fn new(name: LayerName) -> Self {
        Self {
            name,
            order: name.order(),
            path: name.default_dir(),
            enabled: true,
        }
    }
}

impl Manifest {
    /// Create a manifest with the given layers enabled
    pub fn new(name: impl Into<String>, layers: &[LayerName]) -> Self {
        let mut manifest = Self {
            name: name.into(),
            spec_version: SPEC_VERSION.to_string(),
            layers: Vec::new(),
        };
        for layer in layers {
            manifest.enable(*layer);
        }
        manifest
    }

    /// Enabled layers in layer order
    pub fn enabled_layers(&self) -> Vec<LayerName> {
        self.layers
            .iter()
            .filter(|l| l.enabled)
            .map(|l| l.name)
            .collect()
    }

    pub fn is_enabled(&self, layer: LayerName) -> bool {
        self.entry(layer).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn entry(&self, layer: LayerName) -> Option<&LayerEntry> {
        self.layers.iter().find(|l| l.name == layer)
    }

    /// Enable a layer, adding an entry if needed. Returns false if it was
    /// already enabled.
    pub fn enable(&mut self, layer: LayerName) -> bool {
        if let Some(entry) = self.layers.iter_mut().find(|l| l.name == layer) {
            let changed = !entry.enabled;
            entry.enabled = true;
            return changed;
        }
        self.layers.push(LayerEntry::new(layer));
        self.layers.sort_by_key(|l| l.order);
        true
    }

    /// Disable a layer; its entry (and path) are kept. Returns false if it
    /// was not enabled.
    pub fn disable(&mut self, layer: LayerName) -> bool {
        match self.layers.iter_mut().find(|l| l.name == layer) {
            Some(entry) if entry.enabled => {
                entry.enabled = false;
                true
            }
            _ => false,
        }
    }
}
