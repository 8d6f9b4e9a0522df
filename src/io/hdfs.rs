//! HDFS backend over an [`HdfsClient`].

use crate::error::Result;
use crate::io::cloud::HdfsClient;
use crate::io::reader::RangeFetch;
use crate::io::slicer::{DirEntry, DirLister};
use crate::io::writer::Destination;
use crate::io::writer::chunks::{ChunkGenerator, ChunkLimits};
use crate::slice::FileSlice;
use std::collections::HashSet;
use std::sync::Mutex;

/// Reads slices with positioned HDFS reads.
#[derive(Debug, Clone)]
pub struct HdfsFetcher<C> {
    client: C,
}

impl<C: HdfsClient> HdfsFetcher<C> {
    pub const fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: HdfsClient> RangeFetch for HdfsFetcher<C> {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        Ok(self.client.open(&slice.path, slice.offset, slice.length)?)
    }
}

/// Lists HDFS directories for [`crate::io::slicer::DirectorySlicer`].
#[derive(Debug, Clone)]
pub struct HdfsLister<C> {
    client: C,
}

impl<C: HdfsClient> HdfsLister<C> {
    pub const fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: HdfsClient> DirLister for HdfsLister<C> {
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>> {
        Ok(self
            .client
            .list_status(dir)?
            .into_iter()
            .map(|status| DirEntry {
                path: status.path,
                size: status.length,
                is_dir: status.is_dir,
            })
            .collect())
    }
}

/// Appends payloads to HDFS files, creating each file on first use.
pub struct HdfsDestination<C> {
    client: C,
    ensured: Mutex<HashSet<String>>,
}

impl<C: HdfsClient> HdfsDestination<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            ensured: Mutex::new(HashSet::new()),
        }
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    fn ensure_file(&self, name: &str) -> Result<()> {
        if self.ensured.lock().expect("file cache mutex poisoned").contains(name) {
            return Ok(());
        }
        match self.client.status(name) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                log::debug!("creating {name}");
                self.client.create(name)?;
            }
            Err(err) => return Err(err.into()),
        }
        self.ensured
            .lock()
            .expect("file cache mutex poisoned")
            .insert(name.to_string());
        Ok(())
    }
}

impl<C: HdfsClient> Destination for HdfsDestination<C> {
    fn chunk_limits(&self, chunk_size: usize) -> ChunkLimits {
        ChunkLimits::exact(chunk_size)
    }

    fn send_to_destination(&self, name: &str, chunks: ChunkGenerator<'_>) -> Result<()> {
        let mut created = false;
        for chunk in chunks {
            let chunk = chunk?;
            if !created {
                self.ensure_file(name)?;
                created = true;
            }
            self.client.append(name, &chunk.data)?;
        }
        Ok(())
    }

    fn verify(&self, path: &str) -> Result<()> {
        Ok(self.client.mkdirs(path)?)
    }
}
