use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Expand files and directories into a list of files.
///
/// Explicit files are kept as given regardless of extension. Directories are
/// walked recursively and contribute every file ending in `.{extension}`,
/// sorted so results do not depend on directory iteration order.
pub fn expand(paths: &[impl AsRef<Path>], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let meta = path
            .metadata()
            .with_context(|| format!("cannot access {}", path.display()))?;
        if meta.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == extension))
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directories_are_filtered_by_extension_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.json"), "{}").unwrap();

        let files = expand(&[dir.path()], "json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "nested/c.json"]);
    }

    #[test]
    fn test_explicit_file_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("colors.txt");
        fs::write(&file, "{}").unwrap();
        assert_eq!(expand(&[&file], "json").unwrap(), vec![file]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(expand(&[dir.path().join("nope")], "json").is_err());
    }
}
