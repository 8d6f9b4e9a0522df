//! Object storage backend over an [`ObjectStore`].
//!
//! Paths are `bucket/key` strings: the first segment names the bucket. A payload
//! that fits in one chunk is written with a single put; anything larger goes
//! through a multipart upload whose parts are uploaded in bounded windows and
//! which is aborted if any step fails.

use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::io::cloud::{
    CompletedPart, ErrorKind, ObjectStore, batch_in_chunks, split_bucket_path, split_object_path,
};
use crate::io::reader::RangeFetch;
use crate::io::slicer::{Slicer, is_hidden};
use crate::io::writer::Destination;
use crate::io::writer::chunks::{Chunk, ChunkGenerator};
use crate::slice::{FileSlice, slices_for_file};
use rayon::prelude::*;

/// Reads slices with ranged GETs.
#[derive(Debug, Clone)]
pub struct ObjectFetcher<S> {
    store: S,
}

impl<S: ObjectStore> ObjectFetcher<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ObjectStore> RangeFetch for ObjectFetcher<S> {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        let (bucket, key) = split_object_path(&slice.path)?;
        Ok(self.store.get_range(&bucket, &key, slice.offset, slice.length)?)
    }
}

/// Create the bucket of a `bucket/prefix` path if it does not exist yet.
///
/// # Errors
///
/// Returns the store's error, or an `InvalidInput` storage error for a
/// malformed path.
pub fn ensure_bucket<S: ObjectStore + ?Sized>(store: &S, path: &str) -> Result<()> {
    let (bucket, _) = split_bucket_path(path)?;
    if store.bucket_exists(&bucket)? {
        return Ok(());
    }
    log::debug!("creating bucket {bucket}");
    match store.create_bucket(&bucket) {
        Err(err) if err.kind == ErrorKind::AlreadyExists => Ok(()),
        other => Ok(other?),
    }
}

/// Writes payloads as objects.
#[derive(Debug, Clone)]
pub struct ObjectDestination<S> {
    store: S,
    concurrency: usize,
}

impl<S: ObjectStore> ObjectDestination<S> {
    /// `concurrency` bounds the number of parts held and uploaded at once.
    pub fn new(store: S, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the bucket of `path` if needed.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub fn ensure_bucket(&self, path: &str) -> Result<()> {
        ensure_bucket(&self.store, path)
    }

    fn upload_parts<I>(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        chunks: I,
    ) -> Result<Vec<CompletedPart>>
    where
        I: Iterator<Item = Result<Chunk>>,
    {
        batch_in_chunks(chunks, self.concurrency, |window| {
            window
                .into_par_iter()
                .map(|chunk| {
                    let chunk = chunk?;
                    let part_number = chunk.index + 1;
                    log::debug!(
                        "uploading part {part_number} of {bucket}/{key} ({} bytes)",
                        chunk.data.len()
                    );
                    Ok(self
                        .store
                        .upload_part(bucket, key, upload_id, part_number, &chunk.data)?)
                })
                .collect::<Result<Vec<_>>>()
        })
    }

    fn multipart(
        &self,
        bucket: &str,
        key: &str,
        first: Chunk,
        rest: ChunkGenerator<'_>,
    ) -> Result<()> {
        let upload_id = self.store.create_multipart_upload(bucket, key)?;
        log::debug!("started multipart upload {upload_id} for {bucket}/{key}");

        let result = self
            .upload_parts(bucket, key, &upload_id, std::iter::once(Ok(first)).chain(rest))
            .and_then(|mut parts| {
                parts.sort_by_key(|part| part.part_number);
                Ok(self
                    .store
                    .complete_multipart_upload(bucket, key, &upload_id, &parts)?)
            });

        if let Err(err) = &result {
            log::error!("aborting multipart upload {upload_id} for {bucket}/{key}: {err}");
            if let Err(abort_err) = self.store.abort_multipart_upload(bucket, key, &upload_id) {
                log::error!("failed to abort multipart upload {upload_id}: {abort_err}");
            }
        }
        result
    }
}

impl<S: ObjectStore> Destination for ObjectDestination<S> {
    /// Every put or completed upload replaces the object.
    fn appends(&self) -> bool {
        false
    }

    fn send_to_destination(&self, name: &str, mut chunks: ChunkGenerator<'_>) -> Result<()> {
        let (bucket, key) = split_object_path(name)?;
        let Some(first) = chunks.next().transpose()? else {
            return Ok(());
        };
        if !first.has_more {
            return Ok(self.store.put_object(&bucket, &key, &first.data)?);
        }
        self.multipart(&bucket, &key, first, chunks)
    }

    fn verify(&self, path: &str) -> Result<()> {
        self.ensure_bucket(path)
    }
}

/// Paginated listing of a `bucket/prefix`.
///
/// Each call to [`Slicer::slice`] consumes listing pages until one yields
/// slices. [`ObjectSlicer::done_slicing`] turns true once the last page has
/// been consumed. A failed listing is logged and ends the walk.
pub struct ObjectSlicer<S> {
    store: S,
    config: ReaderConfig,
    bucket: String,
    prefix: String,
    token: Option<String>,
    done_slicing: bool,
}

impl<S: ObjectStore> ObjectSlicer<S> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate or its path
    /// names no bucket.
    pub fn new(config: ReaderConfig, store: S) -> Result<Self> {
        config.validate()?;
        let (bucket, prefix) =
            split_bucket_path(&config.path).map_err(|e| Error::config("path", e.to_string()))?;
        Ok(Self {
            store,
            config,
            bucket,
            prefix,
            token: None,
            done_slicing: false,
        })
    }

    #[must_use]
    pub const fn done_slicing(&self) -> bool {
        self.done_slicing
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<S: ObjectStore> Slicer for ObjectSlicer<S> {
    fn slice(&mut self) -> Option<Vec<FileSlice>> {
        while !self.done_slicing {
            let listing = match self
                .store
                .list_objects(&self.bucket, &self.prefix, self.token.as_deref())
            {
                Ok(listing) => listing,
                Err(err) => {
                    log::warn!("failed to list {}/{}: {err}", self.bucket, self.prefix);
                    self.done_slicing = true;
                    return None;
                }
            };
            self.token.clone_from(&listing.next_continuation_token);
            self.done_slicing = !listing.is_truncated();

            let mut slices = Vec::new();
            for object in listing.objects {
                if object.key.ends_with('/') || is_hidden(&self.prefix, &object.key) {
                    continue;
                }
                let path = format!("{}/{}", self.bucket, object.key);
                slices.extend(slices_for_file(&path, object.size, &self.config));
            }
            if !slices.is_empty() {
                log::debug!("{}/{}: {} slices", self.bucket, self.prefix, slices.len());
                return Some(slices);
            }
        }
        None
    }
}
