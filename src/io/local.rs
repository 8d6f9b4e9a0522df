//! Local file system backend.

use crate::error::{IoContext, Result};
use crate::io::reader::RangeFetch;
use crate::io::slicer::{DirEntry, DirLister};
use crate::io::writer::Destination;
use crate::io::writer::chunks::{ChunkGenerator, ChunkLimits};
use crate::slice::FileSlice;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Reads slices straight from local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl RangeFetch for FileFetcher {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        let context = || {
            format!(
                "reading {} bytes at {} of {}",
                slice.length, slice.offset, slice.path
            )
        };
        let mut file = File::open(&slice.path).with_context(context)?;
        file.seek(SeekFrom::Start(slice.offset)).with_context(context)?;
        let mut data = Vec::new();
        file.take(slice.length)
            .read_to_end(&mut data)
            .with_context(context)?;
        Ok(data)
    }
}

/// Appends payloads to local files, creating directories on first use.
#[derive(Debug, Default)]
pub struct FsDestination {
    ensured: Mutex<HashSet<PathBuf>>,
}

impl FsDestination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        let mut ensured = self.ensured.lock().expect("directory cache mutex poisoned");
        if ensured.contains(dir) {
            return Ok(());
        }
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        ensured.insert(dir.to_path_buf());
        Ok(())
    }
}

impl Destination for FsDestination {
    fn chunk_limits(&self, chunk_size: usize) -> ChunkLimits {
        ChunkLimits::exact(chunk_size)
    }

    fn send_to_destination(&self, name: &str, chunks: ChunkGenerator<'_>) -> Result<()> {
        let path = Path::new(name);
        let mut file: Option<File> = None;
        for chunk in chunks {
            let chunk = chunk?;
            let out = match &mut file {
                Some(out) => out,
                None => {
                    if let Some(parent) = path.parent() {
                        self.ensure_dir(parent)?;
                    }
                    let opened = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .with_context(|| format!("opening {name} for append"))?;
                    file.insert(opened)
                }
            };
            out.write_all(&chunk.data)
                .with_context(|| format!("appending chunk {} to {name}", chunk.index))?;
        }
        if let Some(mut out) = file {
            out.flush().with_context(|| format!("flushing {name}"))?;
        }
        Ok(())
    }

    fn verify(&self, path: &str) -> Result<()> {
        self.ensure_dir(Path::new(path))
    }
}

/// Lists local directories for [`crate::io::slicer::DirectorySlicer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLister;

impl DirLister for LocalLister {
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>> {
        let context = || format!("listing {dir}");
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(context)? {
            let entry = entry.with_context(context)?;
            let metadata = entry.metadata().with_context(context)?;
            if !metadata.is_dir() && !metadata.is_file() {
                continue;
            }
            entries.push(DirEntry {
                path: entry.path().to_string_lossy().into_owned(),
                size: metadata.len(),
                is_dir: metadata.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
