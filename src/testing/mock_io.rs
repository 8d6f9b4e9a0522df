//! Mock I/O helpers for testing against the local file system.
//!
//! This module provides temporary directories that clean up on drop, plus small
//! helpers to lay out input trees and read back what a sender wrote.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory as a UTF-8 string, the form configurations take.
    #[must_use]
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Write `contents` to `relative`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be created.
    pub fn write_file(
        &self,
        relative: &str,
        contents: impl AsRef<[u8]>,
    ) -> std::io::Result<PathBuf> {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl Default for TempDirPath {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// Read an output file as UTF-8 for assertion.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_output<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Relative paths of every regular file under `root`, sorted.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed.
pub fn list_files<P: AsRef<Path>>(root: P) -> std::io::Result<Vec<String>> {
    let root = root.as_ref();
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_string_lossy().into_owned());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_path() {
        let temp_dir = TempDirPath::new().unwrap();
        assert!(temp_dir.path().exists());
        assert!(temp_dir.path().is_dir());
    }

    #[test]
    fn test_write_and_list_files() {
        let temp_dir = TempDirPath::new().unwrap();
        temp_dir.write_file("b/c.ldjson", "{}\n").unwrap();
        temp_dir.write_file("a.csv", "x\n").unwrap();
        let files = list_files(temp_dir.path()).unwrap();
        assert_eq!(files, vec!["a.csv".to_string(), "b/c.ldjson".to_string()]);
        assert_eq!(read_output(temp_dir.file_path("a.csv")).unwrap(), "x\n");
    }
}
