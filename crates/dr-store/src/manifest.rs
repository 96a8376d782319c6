//! Manifest document (`manifest.yaml` at the model root)

use crate::atomic::atomic_write;
use crate::errors::{io_error_at, model_root_error, parse_error, serialize_error, Result};
use dr_core::errors::{ExError, ExErrorKind};
use dr_core::model::{LayerEntry, Manifest};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name of the manifest inside a model root
pub const MANIFEST_FILE: &str = "manifest.yaml";

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Read and check the manifest of a model root
pub fn read_manifest(root: &Path) -> Result<Manifest> {
    let path = manifest_path(root);
    if !path.is_file() {
        return Err(model_root_error(root, "no manifest.yaml found"));
    }
    let text = fs::read_to_string(&path).map_err(|e| io_error_at("read_manifest", &path, e))?;
    let mut manifest: Manifest =
        serde_yaml::from_str(&text).map_err(|e| parse_error(&path, &e))?;

    for entry in &manifest.layers {
        check_layer_path(entry).map_err(|e| e.with_location(path.display().to_string(), None))?;
    }
    let mut seen = Vec::new();
    for entry in &manifest.layers {
        if seen.contains(&entry.name) {
            return Err(ExError::new(ExErrorKind::Parse)
                .with_op("read_manifest")
                .with_layer(entry.name.as_str())
                .with_location(path.display().to_string(), None)
                .with_message("Layer listed twice"));
        }
        seen.push(entry.name);
    }
    manifest.layers.sort_by_key(|l| l.order);
    Ok(manifest)
}

/// Write the manifest atomically
pub fn write_manifest(root: &Path, manifest: &Manifest) -> Result<()> {
    let path = manifest_path(root);
    let text = serde_yaml::to_string(manifest).map_err(|e| serialize_error(&path, &e))?;
    atomic_write(&path, text.as_bytes())
}

/// Directory holding a layer's category files
pub fn layer_dir(root: &Path, entry: &LayerEntry) -> PathBuf {
    root.join(&entry.path)
}

// Layer paths must stay inside the model root
fn check_layer_path(entry: &LayerEntry) -> Result<()> {
    let path = Path::new(&entry.path);
    let inside = !entry.path.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(())
    } else {
        Err(ExError::new(ExErrorKind::Parse)
            .with_op("read_manifest")
            .with_layer(entry.name.as_str())
            .with_message(format!("Layer path `{}` leaves the model root", entry.path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_core::model::LayerName;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_round_trip() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::new("shop", &[LayerName::Motivation, LayerName::Business]);

        write_manifest(dir.path(), &manifest).unwrap();
        let loaded = read_manifest(dir.path()).unwrap();

        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_missing_manifest_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }

    #[test]
    fn test_layers_sorted_by_order_on_read() {
        let dir = TempDir::new().unwrap();
        let yaml = "\
name: shop
spec_version: 0.6.0
layers:
  - name: business
    order: 2
    path: 02_business
  - name: motivation
    order: 1
    path: 01_motivation
";
        fs::write(manifest_path(dir.path()), yaml).unwrap();

        let manifest = read_manifest(dir.path()).unwrap();
        assert_eq!(
            manifest.enabled_layers(),
            vec![LayerName::Motivation, LayerName::Business]
        );
    }

    #[test]
    fn test_escaping_layer_path_rejected() {
        let dir = TempDir::new().unwrap();
        let yaml = "\
name: shop
spec_version: 0.6.0
layers:
  - name: motivation
    order: 1
    path: ../elsewhere
";
        fs::write(manifest_path(dir.path()), yaml).unwrap();

        let err = read_manifest(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Parse);
        assert_eq!(err.layer(), Some("motivation"));
    }

    #[test]
    fn test_unknown_layer_name_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let yaml = "\
name: shop
spec_version: 0.6.0
layers:
  - name: marketing
    order: 1
    path: 01_marketing
";
        fs::write(manifest_path(dir.path()), yaml).unwrap();

        let err = read_manifest(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Parse);
        assert!(err.line().is_some());
    }
}
