//! # Manifest Writer
//!
//! Output naming and atomic writes.

use crate::constants::OUTPUT_FILE_SUFFIX;
use crate::error::TransformError;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Where the secured form of `input` is written
///
/// `deploy/web.yaml` becomes `deploy/web-sc.yaml`. With an output directory
/// the input path is re-rooted beneath it; root, drive, `.` and `..`
/// components are dropped so the result never escapes that directory.
#[must_use]
pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}{OUTPUT_FILE_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_FILE_SUFFIX}"),
    };
    let sibling = input.with_file_name(file_name);

    match output_dir {
        None => sibling,
        Some(dir) => dir.join(
            sibling
                .components()
                .filter(|component| matches!(component, Component::Normal(_)))
                .collect::<PathBuf>(),
        ),
    }
}

/// Write `contents` to `path` through a temporary file in the same directory
///
/// Parent directories are created as needed. A reader never observes a
/// partially written file.
///
/// # Errors
///
/// Returns [`TransformError::Io`] when a directory, the temporary file, or
/// the final rename fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), TransformError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| TransformError::io(parent, e))?;

    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| TransformError::io(parent, e))?;
    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| TransformError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| TransformError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod output_path_tests {
        use super::*;

        #[test]
        fn test_suffix_before_extension() {
            assert_eq!(
                output_path(Path::new("deploy/web.yaml"), None),
                PathBuf::from("deploy/web-sc.yaml")
            );
            assert_eq!(
                output_path(Path::new("job.yml"), None),
                PathBuf::from("job-sc.yml")
            );
            assert_eq!(
                output_path(Path::new("manifests/pod"), None),
                PathBuf::from("manifests/pod-sc")
            );
        }

        #[test]
        fn test_only_last_extension_is_kept() {
            assert_eq!(
                output_path(Path::new("app.v2.yaml"), None),
                PathBuf::from("app.v2-sc.yaml")
            );
        }

        #[test]
        fn test_rerooted_under_output_dir() {
            let out = Path::new("/tmp/out");
            assert_eq!(
                output_path(Path::new("/srv/deploy/web.yaml"), Some(out)),
                PathBuf::from("/tmp/out/srv/deploy/web-sc.yaml")
            );
            assert_eq!(
                output_path(Path::new("./deploy/web.yaml"), Some(out)),
                PathBuf::from("/tmp/out/deploy/web-sc.yaml")
            );
            assert_eq!(
                output_path(Path::new("../shared/web.yaml"), Some(out)),
                PathBuf::from("/tmp/out/shared/web-sc.yaml")
            );
        }
    }

    mod write_atomic_tests {
        use super::*;

        #[test]
        fn test_creates_parent_directories() {
            let temp = TempDir::new().unwrap();
            let target = temp.path().join("a/b/out.yaml");

            write_atomic(&target, "---\nkind: ConfigMap\n").unwrap();
            assert_eq!(
                std::fs::read_to_string(&target).unwrap(),
                "---\nkind: ConfigMap\n"
            );
        }

        #[test]
        fn test_replaces_existing_file_without_leftovers() {
            let temp = TempDir::new().unwrap();
            let target = temp.path().join("out.yaml");
            std::fs::write(&target, "old contents that are longer").unwrap();

            write_atomic(&target, "new").unwrap();
            assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");

            let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
            assert_eq!(entries.len(), 1);
        }
    }
}
