//! Discovery of Wavefront `.obj` files on disk.
//!
//! The render path draws a fixed quad; the discovered list is reported at
//! startup but not loaded.

use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Collects the regular files in `dir` whose extension is exactly `obj`,
/// sorted by path. Symlinks count when their target is a regular file.
/// Subdirectories are not searched.
///
/// # Errors
///
/// Returns `HarnessError::Io` if `dir` cannot be read.
pub fn find_obj_files(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| HarnessError::Io(format!("{}: {e}", dir.display())))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::Io(e.to_string()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "obj") {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
