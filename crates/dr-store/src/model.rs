//! Whole-model load, save and initialization

use crate::atomic::WriteBatch;
use crate::errors::{io_error_at, model_root_error, serialize_error, Result};
use crate::layer_file::{read_layer, stage_layer, SaveSummary};
use crate::manifest::{layer_dir, manifest_path, read_manifest, write_manifest};
use dr_core::errors::{DrError, ExError};
use dr_core::model::{LayerName, Manifest};
use dr_core::ops::ElementStore;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Result of reading a model root.
///
/// Files that failed to load are listed in `failures` and contribute no
/// elements; everything else is in `store`.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub manifest: Manifest,
    pub store: ElementStore,
    pub failures: Vec<ExError>,
}

impl LoadedModel {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The manifest and store, or the first file failure
    pub fn into_strict(self) -> Result<(Manifest, ElementStore)> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok((self.manifest, self.store)),
        }
    }
}

/// Create a new model root with the given layers enabled
pub fn init_model(root: &Path, name: &str, layers: &[LayerName]) -> Result<Manifest> {
    if manifest_path(root).exists() {
        return Err(model_root_error(root, "model already initialized"));
    }
    let manifest = Manifest::new(name, layers);
    update_manifest(root, &manifest)?;
    tracing::debug!(root = %root.display(), layers = manifest.layers.len(), "model initialized");
    Ok(manifest)
}

/// Read the manifest and every enabled layer.
///
/// Parse errors are collected per file. A file whose element ids clash with
/// already loaded elements is rejected as a whole.
pub fn load_model(root: &Path) -> Result<LoadedModel> {
    let start = Instant::now();
    let manifest = read_manifest(root)?;
    let mut store = ElementStore::for_manifest(&manifest);
    let mut failures = Vec::new();

    for entry in manifest.layers.iter().filter(|l| l.enabled) {
        let dir = layer_dir(root, entry);
        for file in read_layer(&dir, entry.name)? {
            let file = match file {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(error = %err, "category file skipped");
                    failures.push(err);
                    continue;
                }
            };
            if let Some(clash) = file.elements.iter().find(|e| store.contains(&e.id)) {
                let err = ExError::from(DrError::DuplicateElementId {
                    element_id: clash.id.clone(),
                    existing_layer: store
                        .layer_of(&clash.id)
                        .map(|l| l.to_string())
                        .unwrap_or_default(),
                })
                .with_op("load_model")
                .with_location(file.path.display().to_string(), None);
                tracing::warn!(error = %err, "category file skipped");
                failures.push(err);
                continue;
            }
            for element in file.elements {
                store.insert(element)?;
            }
        }
    }

    tracing::debug!(
        root = %root.display(),
        elements = store.len(),
        failures = failures.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "model loaded"
    );
    Ok(LoadedModel {
        manifest,
        store,
        failures,
    })
}

/// Write the given layers of the store back to their directories.
///
/// All affected files are rendered before any is replaced. If one cannot
/// be written, files already replaced get their previous contents back.
pub fn save_layers(
    root: &Path,
    manifest: &Manifest,
    store: &ElementStore,
    layers: &[LayerName],
) -> Result<SaveSummary> {
    let mut batch = WriteBatch::new();
    let summary = stage_layers(&mut batch, root, manifest, store, layers)?;
    batch.commit()?;
    Ok(summary)
}

/// Write the manifest (when changed) and every layer of the store as one batch
pub fn save_model(root: &Path, manifest: &Manifest, store: &ElementStore) -> Result<SaveSummary> {
    let path = manifest_path(root);
    let text = serde_yaml::to_string(manifest).map_err(|e| serialize_error(&path, &e))?;
    let mut batch = WriteBatch::new();
    let mut summary = SaveSummary::default();
    if batch.write_if_changed(&path, text.into_bytes()) {
        summary.written.push(path);
    }
    let part = stage_layers(&mut batch, root, manifest, store, &store.layers())?;
    summary.written.extend(part.written);
    summary.removed.extend(part.removed);
    batch.commit()?;
    Ok(summary)
}

fn stage_layers(
    batch: &mut WriteBatch,
    root: &Path,
    manifest: &Manifest,
    store: &ElementStore,
    layers: &[LayerName],
) -> Result<SaveSummary> {
    let mut summary = SaveSummary::default();
    for layer in layers {
        let Some(entry) = manifest.entry(*layer) else {
            continue;
        };
        let part = stage_layer(batch, &layer_dir(root, entry), *layer, store.elements_in(*layer))?;
        summary.written.extend(part.written);
        summary.removed.extend(part.removed);
    }
    Ok(summary)
}

/// Persist a manifest change, creating directories of enabled layers
pub fn update_manifest(root: &Path, manifest: &Manifest) -> Result<()> {
    for entry in manifest.layers.iter().filter(|l| l.enabled) {
        let dir = layer_dir(root, entry);
        fs::create_dir_all(&dir).map_err(|e| io_error_at("create_layer_dir", &dir, e))?;
    }
    write_manifest(root, manifest)
}
