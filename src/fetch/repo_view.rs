//! Read-only, path-addressable view of one fetched artifact tree.
//!
//! All operations take paths relative to the view's root. Absolute paths and
//! `..` traversal are rejected so a view can never read outside the snapshot
//! it was created for. Paths become invalid once the enclosing fetch scope
//! exits.

use crate::Result;
use crate::error::Error;
use globset::Glob;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Returns true when `path` is relative and free of `..` components.
pub(crate) fn is_clean_relative(path: &str) -> bool {
    let p = Path::new(path);
    !p.is_absolute()
        && p.components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Navigable snapshot of a fetched artifact.
#[derive(Debug, Clone)]
pub struct RepoView {
    root: PathBuf,
}

impl RepoView {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        if !is_clean_relative(rel) {
            return Err(Error::io(
                format!("path escapes snapshot root: {rel}"),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path not relative to view root"),
            ));
        }
        Ok(self.root.join(rel))
    }

    /// True when the relative path exists inside the view (file or directory).
    /// Paths outside the root are reported as absent rather than an error.
    #[must_use]
    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).is_ok_and(|p| p.exists())
    }

    /// Read a file as UTF-8 text. Missing paths are an error, never an empty
    /// result; check [`Self::exists`] first when absence is expected.
    pub fn read_text(&self, rel: &str) -> Result<String> {
        let path = self.resolve(rel)?;
        fs::read_to_string(&path).map_err(|e| Error::io(format!("reading {rel}"), e))
    }

    /// Read and parse a JSON file.
    pub fn read_json(&self, rel: &str) -> Result<serde_json::Value> {
        let text = self.read_text(rel)?;
        serde_json::from_str(&text).map_err(|e| Error::schema(rel, format!("invalid JSON: {e}")))
    }

    /// List files matching a glob pattern, as paths relative to the root,
    /// sorted for determinism.
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::Pattern {
                pattern: pattern.to_owned(),
                message: e.to_string(),
            })?
            .compile_matcher();

        let mut matches = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if matcher.is_match(rel) {
                matches.push(rel.to_path_buf());
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// Size of a file in bytes.
    pub fn size_bytes(&self, rel: &str) -> Result<u64> {
        let path = self.resolve(rel)?;
        let meta = fs::metadata(&path).map_err(|e| Error::io(format!("sizing {rel}"), e))?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_view() -> (tempfile::TempDir, RepoView) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hello\n").unwrap();
        fs::write(dir.path().join("config.json"), r#"{"layers": 12}"#).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/train.csv"), "a,b\n1,2\n").unwrap();
        let view = RepoView::new(dir.path());
        (dir, view)
    }

    #[test]
    fn test_exists() {
        let (_dir, view) = sample_view();
        assert!(view.exists("README.md"));
        assert!(view.exists("data"));
        assert!(view.exists("data/train.csv"));
        assert!(!view.exists("missing.txt"));
    }

    #[test]
    fn test_read_text() {
        let (_dir, view) = sample_view();
        assert_eq!(view.read_text("README.md").unwrap(), "# hello\n");
    }

    #[test]
    fn test_read_text_missing_is_error() {
        let (_dir, view) = sample_view();
        let err = view.read_text("missing.txt").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_read_json() {
        let (_dir, view) = sample_view();
        let value = view.read_json("config.json").unwrap();
        assert_eq!(value["layers"], 12);
    }

    #[test]
    fn test_read_json_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let view = RepoView::new(dir.path());
        assert!(matches!(view.read_json("bad.json").unwrap_err(), Error::Schema { .. }));
    }

    #[test]
    fn test_glob_matches_nested_files() {
        let (_dir, view) = sample_view();
        let found = view.glob("*.csv").unwrap();
        assert_eq!(found, vec![PathBuf::from("data/train.csv")]);
    }

    #[test]
    fn test_glob_readme_pattern() {
        let (_dir, view) = sample_view();
        let found = view.glob("README.*").unwrap();
        assert_eq!(found, vec![PathBuf::from("README.md")]);
    }

    #[test]
    fn test_glob_no_matches() {
        let (_dir, view) = sample_view();
        assert!(view.glob("*.onnx").unwrap().is_empty());
    }

    #[test]
    fn test_glob_invalid_pattern() {
        let (_dir, view) = sample_view();
        assert!(matches!(view.glob("a{b").unwrap_err(), Error::Pattern { .. }));
    }

    #[test]
    fn test_size_bytes() {
        let (_dir, view) = sample_view();
        assert_eq!(view.size_bytes("README.md").unwrap(), 8);
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let (_dir, view) = sample_view();
        assert!(!view.exists("../README.md"));
        assert!(view.read_text("../../etc/passwd").is_err());
        assert!(view.size_bytes("..").is_err());
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_dir, view) = sample_view();
        assert!(!view.exists("/etc/passwd"));
        assert!(view.read_text("/etc/passwd").is_err());
    }

    #[test]
    fn test_is_clean_relative() {
        assert!(is_clean_relative("a/b.txt"));
        assert!(is_clean_relative("./a"));
        assert!(!is_clean_relative("../a"));
        assert!(!is_clean_relative("/a"));
        assert!(!is_clean_relative("a/../../b"));
    }
}
