//! Input discovery: recursive, sorted, artifact-free file lists.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{EtlError, EtlResult};

/// Marker carried by notebook checkpoint directories and files.
const ARTIFACT_MARKER: &str = "checkpoint";

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// A path is an artifact if any component below `root` mentions a checkpoint.
fn is_artifact(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| {
            c.as_os_str()
                .to_string_lossy()
                .to_lowercase()
                .contains(ARTIFACT_MARKER)
        })
}

/// Find every file with the given extension under `root`.
///
/// Paths are absolute, sorted and free of duplicates. Files under notebook
/// checkpoint directories are skipped.
pub fn discover_files(root: &Path, extension: &str) -> EtlResult<Vec<PathBuf>> {
    let root = root.canonicalize().map_err(|e| EtlError::io(root, e))?;
    let mut files = Vec::new();

    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extension) {
            continue;
        }
        if is_artifact(&root, path) {
            log::debug!("Skipping artifact: {}", path.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("/data/a.json"), "json"));
        assert!(has_extension(Path::new("/data/a.JSON"), "json"));
        assert!(!has_extension(Path::new("/data/a.txt"), "json"));
        assert!(!has_extension(Path::new("/data/json"), "json"));
    }

    #[test]
    fn test_is_artifact_only_looks_below_root() {
        let root = Path::new("/checkpoints/data");
        assert!(!is_artifact(root, Path::new("/checkpoints/data/a/b.json")));
        assert!(is_artifact(
            root,
            Path::new("/checkpoints/data/.ipynb_checkpoints/b.json")
        ));
        assert!(is_artifact(root, Path::new("/checkpoints/data/b-checkpoint.json")));
    }

    #[test]
    fn test_discover_sorted_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("B/A")).unwrap();
        fs::create_dir_all(root.join("A")).unwrap();
        fs::write(root.join("B/A/two.json"), "{}").unwrap();
        fs::write(root.join("A/one.json"), "{}").unwrap();
        fs::write(root.join("A/notes.txt"), "").unwrap();

        let files = discover_files(root, "json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["one.json", "two.json"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_discover_skips_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".ipynb_checkpoints")).unwrap();
        fs::write(root.join(".ipynb_checkpoints/a-checkpoint.json"), "{}").unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();

        let files = discover_files(root, "json").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.json"));
    }

    #[test]
    fn test_discover_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_files(&temp_dir.path().join("nope"), "json").unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
