//! Per-layer category files
//!
//! A layer's storage path is a directory. Every `*.yaml` file in it is a
//! category document; files load in file-name order and elements keep the
//! order they have inside their file.

use crate::atomic::WriteBatch;
use crate::errors::{io_error_at, Result};
use crate::format::{parse_category, render_category};
use dr_core::errors::{ExError, ExErrorKind};
use dr_core::model::{Element, LayerName};
use std::fs;
use std::path::{Path, PathBuf};

const CATEGORY_EXT: &str = "yaml";

/// Elements parsed from one category file
#[derive(Debug, Clone)]
pub struct CategoryFile {
    pub path: PathBuf,
    pub category: String,
    pub elements: Vec<Element>,
}

/// What a `save_layer` call touched on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSummary {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl SaveSummary {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Category files of a layer directory, sorted by file name.
///
/// A missing directory is an empty layer.
pub fn category_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| io_error_at("read_layer", dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error_at("read_layer", dir, e))?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(CATEGORY_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one category file
pub fn read_category(path: &Path, layer: LayerName) -> Result<CategoryFile> {
    let category = category_of(path);
    let text = fs::read_to_string(path).map_err(|e| io_error_at("read_category", path, e))?;
    let doc = parse_category(&text, path)?;
    let elements = doc
        .0
        .into_iter()
        .map(|(id, body)| body.into_element(id, layer, &category))
        .collect();
    Ok(CategoryFile {
        path: path.to_path_buf(),
        category,
        elements,
    })
}

/// Parse every category file of a layer, one result per file.
///
/// A malformed file fails on its own; the other files still load. The outer
/// error only covers a directory that cannot be listed.
pub fn read_layer(dir: &Path, layer: LayerName) -> Result<Vec<Result<CategoryFile>>> {
    let files = category_files(dir)?;
    Ok(files
        .iter()
        .map(|path| read_category(path, layer).map_err(|e| e.with_layer(layer.as_str())))
        .collect())
}

/// Load a layer's elements in persisted order, failing on the first
/// malformed file
pub fn load_layer(dir: &Path, layer: LayerName) -> Result<Vec<Element>> {
    let mut elements = Vec::new();
    for file in read_layer(dir, layer)? {
        elements.extend(file?.elements);
    }
    tracing::debug!(layer = layer.as_str(), count = elements.len(), "layer loaded");
    Ok(elements)
}

/// Write a layer's elements back, one file per category.
///
/// Categories are written in first-appearance order with elements in the
/// given order. Files whose bytes would not change are left alone; category
/// files with no remaining elements are deleted. The layer's files change
/// together or not at all.
pub fn save_layer(dir: &Path, layer: LayerName, elements: &[Element]) -> Result<SaveSummary> {
    let mut batch = WriteBatch::new();
    let summary = stage_layer(&mut batch, dir, layer, elements)?;
    batch.commit()?;
    Ok(summary)
}

/// Render a layer into `batch` without touching disk.
///
/// The returned summary describes what committing the batch will do.
pub fn stage_layer(
    batch: &mut WriteBatch,
    dir: &Path,
    layer: LayerName,
    elements: &[Element],
) -> Result<SaveSummary> {
    let mut groups: Vec<(&str, Vec<&Element>)> = Vec::new();
    for element in elements {
        if element.layer != layer {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("save_layer")
                .with_element_id(element.id.clone())
                .with_layer(layer.as_str())
                .with_message(format!("Element belongs to layer {}", element.layer)));
        }
        check_category(element)?;
        match groups.iter_mut().find(|(c, _)| *c == element.category) {
            Some((_, members)) => members.push(element),
            None => groups.push((element.category.as_str(), vec![element])),
        }
    }

    let mut summary = SaveSummary::default();
    let mut kept = Vec::new();
    for (category, members) in &groups {
        let path = dir.join(format!("{}.{}", category, CATEGORY_EXT));
        let text = render_category(members.iter().copied(), &path)?;
        if batch.write_if_changed(&path, text.into_bytes()) {
            summary.written.push(path.clone());
        }
        kept.push(path);
    }

    for stale in category_files(dir)? {
        if !kept.contains(&stale) {
            batch.remove(&stale);
            summary.removed.push(stale);
        }
    }

    tracing::debug!(
        layer = layer.as_str(),
        written = summary.written.len(),
        removed = summary.removed.len(),
        "layer staged"
    );
    Ok(summary)
}

fn category_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

// Categories become file names inside the layer directory
fn check_category(element: &Element) -> Result<()> {
    let valid = !element.category.is_empty()
        && element
            .category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("save_layer")
            .with_element_id(element.id.clone())
            .with_message(format!("Invalid category name `{}`", element.category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn goal(id: &str) -> Element {
        Element::new(id, LayerName::Motivation, "goal", id)
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let elements = vec![goal("goal-b"), goal("goal-a"), goal("goal-c")];

        save_layer(dir.path(), LayerName::Motivation, &elements).unwrap();
        let loaded = load_layer(dir.path(), LayerName::Motivation).unwrap();

        assert_eq!(loaded, elements);
    }

    #[test]
    fn test_one_file_per_category() {
        let dir = TempDir::new().unwrap();
        let driver = Element::new("driver-1", LayerName::Motivation, "driver", "Market");
        let elements = vec![goal("goal-1"), driver];

        let summary = save_layer(dir.path(), LayerName::Motivation, &elements).unwrap();

        assert_eq!(summary.written.len(), 2);
        assert!(dir.path().join("goals.yaml").is_file());
        assert!(dir.path().join("drivers.yaml").is_file());
    }

    #[test]
    fn test_unchanged_save_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let elements = vec![goal("goal-1")];

        save_layer(dir.path(), LayerName::Motivation, &elements).unwrap();
        let summary = save_layer(dir.path(), LayerName::Motivation, &elements).unwrap();

        assert!(summary.is_noop());
    }

    #[test]
    fn test_emptied_category_file_is_removed() {
        let dir = TempDir::new().unwrap();
        save_layer(dir.path(), LayerName::Motivation, &[goal("goal-1")]).unwrap();

        let summary = save_layer(dir.path(), LayerName::Motivation, &[]).unwrap();

        assert_eq!(summary.removed, vec![dir.path().join("goals.yaml")]);
        assert!(category_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_empty_layer() {
        let dir = TempDir::new().unwrap();
        let loaded = load_layer(&dir.path().join("01_motivation"), LayerName::Motivation).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_foreign_layer_element_rejected() {
        let dir = TempDir::new().unwrap();
        let service = Element::new("service-1", LayerName::Business, "service", "Checkout");

        let err = save_layer(dir.path(), LayerName::Motivation, &[service]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_category_with_path_separator_rejected() {
        let dir = TempDir::new().unwrap();
        let mut element = goal("goal-1");
        element.category = "../goals".to_string();

        let err = save_layer(dir.path(), LayerName::Motivation, &[element]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_read_layer_isolates_bad_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("drivers.yaml"),
            "driver-1:\n  type: driver\n  name: Market\n",
        )
        .unwrap();
        fs::write(dir.path().join("goals.yaml"), "goal-1:\n  type: [goal\n").unwrap();

        let files = read_layer(dir.path(), LayerName::Motivation).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].is_ok());
        let err = files[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Parse);
        assert_eq!(err.layer(), Some("motivation"));
        assert!(err.file().unwrap().ends_with("goals.yaml"));
    }
}
