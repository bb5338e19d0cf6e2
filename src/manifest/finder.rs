//! # Manifest Finder
//!
//! Discovers manifest files under an input path.

use crate::constants::MANIFEST_EXTENSIONS;
use crate::error::TransformError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}

/// Map a directory-walk failure to the path it occurred on
fn walk_error(input: &Path, err: walkdir::Error) -> TransformError {
    let path = err.path().map_or_else(|| input.to_path_buf(), Path::to_path_buf);
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    TransformError::io(path, source)
}

/// Collect the manifest files to process, sorted by path
///
/// A file given directly is always returned, whatever its extension.
/// Directories are walked recursively for `.yaml` and `.yml` files.
///
/// # Errors
///
/// Returns [`TransformError::Io`] when the input does not exist or any entry
/// below it cannot be read.
pub fn find_manifests(input: &Path) -> Result<Vec<PathBuf>, TransformError> {
    let metadata = std::fs::metadata(input).map_err(|e| TransformError::io(input, e))?;
    if metadata.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut manifests = Vec::new();
    for entry in WalkDir::new(input) {
        let entry = entry.map_err(|e| walk_error(input, e))?;
        if entry.file_type().is_file() && is_manifest(entry.path()) {
            manifests.push(entry.into_path());
        }
    }
    manifests.sort();

    debug!(
        "Found {} manifest file(s) under {}",
        manifests.len(),
        input.display()
    );
    Ok(manifests)
}
