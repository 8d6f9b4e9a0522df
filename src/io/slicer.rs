//! Worklist generation: discover files and cut them into slices.
//!
//! [`Slicer::slice`] is called repeatedly and returns `None` once every file has
//! been sliced. [`DirectorySlicer`] walks a directory tree depth first and serves
//! both the local file system and HDFS through [`DirLister`]; the object store
//! slicer lives with its backend in [`crate::io::object`].

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::slice::{FileSlice, slices_for_file};

/// A source of slices.
pub trait Slicer {
    /// The next batch of slices, or `None` when exhausted.
    fn slice(&mut self) -> Option<Vec<FileSlice>>;

    /// Drain the slicer into one worklist, in emission order.
    fn slice_all(&mut self) -> Vec<FileSlice> {
        let mut all = Vec::new();
        while let Some(batch) = self.slice() {
            all.extend(batch);
        }
        all
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Directory listing primitive of a hierarchical file system.
pub trait DirLister {
    /// Direct children of `dir`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if `dir` cannot be listed.
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>>;
}

/// Whether any segment of `path` below `root` starts with a dot.
#[must_use]
pub fn is_hidden(root: &str, path: &str) -> bool {
    let relative = path.strip_prefix(root.trim_end_matches('/')).unwrap_or(path);
    relative.split('/').any(|segment| segment.starts_with('.'))
}

/// Depth-first directory walker.
///
/// Each call to [`Slicer::slice`] pops directories until one contains files,
/// queueing its subdirectories and returning the slices of its files. A
/// directory that cannot be listed is logged and skipped.
pub struct DirectorySlicer<L> {
    lister: L,
    config: ReaderConfig,
    pending: Vec<String>,
}

impl<L: DirLister> DirectorySlicer<L> {
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if `config` does not validate.
    pub fn new(config: ReaderConfig, lister: L) -> Result<Self> {
        config.validate()?;
        let pending = vec![config.path.clone()];
        Ok(Self {
            lister,
            config,
            pending,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

impl<L: DirLister> Slicer for DirectorySlicer<L> {
    fn slice(&mut self) -> Option<Vec<FileSlice>> {
        loop {
            let dir = self.pending.pop()?;
            let entries = match self.lister.list(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("failed to list {dir}, skipping it: {err}");
                    continue;
                }
            };

            let mut slices = Vec::new();
            for entry in entries {
                if is_hidden(&self.config.path, &entry.path) {
                    continue;
                }
                if entry.is_dir {
                    self.pending.push(entry.path);
                } else {
                    slices.extend(slices_for_file(&entry.path, entry.size, &self.config));
                }
            }
            if !slices.is_empty() {
                log::debug!("{dir}: {} slices", slices.len());
                return Some(slices);
            }
        }
    }
}
