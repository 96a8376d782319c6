//! Atomic write primitives
//!
//! Uses temp→rename so a reader never observes a half-written document.
//! [`WriteBatch`] extends that to a group of files: all of them change or
//! none of them do.

use crate::errors::{io_error_at, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = stage(target_path, content)?;

    if let Err(e) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error_at("rename_temp", target_path, e));
    }

    Ok(())
}

/// File writes and removals applied as one unit.
///
/// Every new file body is written to a temp sibling before any target is
/// touched, so a failure while staging leaves the directory as it was. If a
/// rename or removal fails afterwards, targets already changed get their
/// previous bytes back.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<(PathBuf, Vec<u8>)>,
    removals: Vec<PathBuf>,
}

enum Undo {
    Restore(PathBuf, Vec<u8>),
    Remove(PathBuf),
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write unless the file already holds exactly these bytes.
    /// Returns true if the write was queued.
    pub fn write_if_changed(&mut self, path: &Path, content: Vec<u8>) -> bool {
        if fs::read(path).is_ok_and(|existing| existing == content) {
            return false;
        }
        self.writes.push((path.to_path_buf(), content));
        true
    }

    pub fn remove(&mut self, path: &Path) {
        self.removals.push(path.to_path_buf());
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removals.is_empty()
    }

    /// Apply every queued change, or none of them.
    ///
    /// # Errors
    ///
    /// `Io` naming the file that failed; the files of the batch are back to
    /// their previous contents.
    pub fn commit(self) -> Result<()> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.writes.len());
        for (target, content) in &self.writes {
            match stage(target, content) {
                Ok(temp) => staged.push((temp, target.clone())),
                Err(err) => {
                    discard(&staged);
                    return Err(err);
                }
            }
        }

        let mut undo = Vec::new();
        for (i, (temp, target)) in staged.iter().enumerate() {
            let previous = fs::read(target).ok();
            if let Err(e) = fs::rename(temp, target) {
                discard(&staged[i..]);
                roll_back(undo);
                return Err(io_error_at("rename_temp", target, e));
            }
            undo.push(match previous {
                Some(bytes) => Undo::Restore(target.clone(), bytes),
                None => Undo::Remove(target.clone()),
            });
        }

        for path in &self.removals {
            let removed = fs::read(path).and_then(|bytes| fs::remove_file(path).map(|()| bytes));
            match removed {
                Ok(bytes) => undo.push(Undo::Restore(path.clone(), bytes)),
                Err(e) => {
                    roll_back(undo);
                    return Err(io_error_at("remove_file", path, e));
                }
            }
        }

        Ok(())
    }
}

// Temp file lives beside the target so the rename stays on one filesystem
fn stage(target_path: &Path, content: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error_at("create_dir", parent, e))?;
    }
    let temp_path = target_path.with_extension("tmp");
    if let Err(e) = fs::write(&temp_path, content) {
        if temp_path.is_file() {
            let _ = fs::remove_file(&temp_path);
        }
        return Err(io_error_at("write_temp", &temp_path, e));
    }
    Ok(temp_path)
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (temp, _) in staged {
        let _ = fs::remove_file(temp);
    }
}

fn roll_back(undo: Vec<Undo>) {
    for step in undo.into_iter().rev() {
        let result = match &step {
            Undo::Restore(path, bytes) => atomic_write(path, bytes),
            Undo::Remove(path) => fs::remove_file(path).map_err(|e| io_error_at("remove_file", path, e)),
        };
        if let Err(err) = result {
            tracing::error!(error = %err, "write batch rollback step failed");
        }
    }
}
