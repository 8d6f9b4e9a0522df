//! Fake implementations for testing.
//!
//! These implementations use in-memory data structures to simulate the storage
//! services, making them ideal for unit testing without external dependencies.
//! Both fakes are cheap to clone; clones share the same storage.

use crate::io::cloud::traits::{
    CompletedPart, ErrorKind, FileStatus, HdfsClient, ObjectListing, ObjectMetadata,
    ObjectStore, StorageError, StorageResult,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Type aliases for complex nested types
type BucketStorage = Arc<Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>>;
type UploadMap = Arc<Mutex<HashMap<String, PendingUpload>>>;

fn range_of(data: &[u8], offset: u64, length: u64) -> Vec<u8> {
    let len = data.len();
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
    let end = usize::try_from(offset.saturating_add(length))
        .unwrap_or(usize::MAX)
        .min(len);
    data[start..end].to_vec()
}

// ============================================================================
// FakeObjectStore
// ============================================================================

#[derive(Debug)]
struct PendingUpload {
    bucket: String,
    key: String,
    parts: BTreeMap<u32, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Counters {
    next_upload: AtomicU64,
    puts: AtomicUsize,
    completed: AtomicUsize,
    aborted: AtomicUsize,
}

/// In-memory object store with paginated listings and multipart uploads.
#[derive(Clone)]
pub struct FakeObjectStore {
    storage: BucketStorage,
    uploads: UploadMap,
    counters: Arc<Counters>,
    page_size: usize,
    failing_part: Option<u32>,
}

impl FakeObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(Mutex::new(BTreeMap::new())),
            uploads: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            page_size: 1000,
            failing_part: None,
        }
    }

    /// Limit listings to `page_size` objects per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every upload of part `part_number` fail with a network error.
    #[must_use]
    pub const fn failing_part(mut self, part_number: u32) -> Self {
        self.failing_part = Some(part_number);
        self
    }

    /// Store an object directly, creating the bucket if needed.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the storage is poisoned.
    pub fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.storage
            .lock()
            .expect("storage mutex poisoned")
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// # Panics
    ///
    /// Panics if the mutex protecting the storage is poisoned.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.storage
            .lock()
            .expect("storage mutex poisoned")
            .get(bucket)
            .and_then(|b| b.get(key))
            .cloned()
    }

    /// All keys of a bucket, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the storage is poisoned.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.storage
            .lock()
            .expect("storage mutex poisoned")
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of single-request uploads.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.counters.puts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn completed_uploads(&self) -> usize {
        self.counters.completed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn aborted_uploads(&self) -> usize {
        self.counters.aborted.load(Ordering::SeqCst)
    }

    /// Multipart uploads started but neither completed nor aborted.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the uploads is poisoned.
    #[must_use]
    pub fn in_flight_uploads(&self) -> usize {
        self.uploads.lock().expect("uploads mutex poisoned").len()
    }

    fn require_bucket(&self, bucket: &str) -> StorageResult<()> {
        if self
            .storage
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(bucket)
        {
            Ok(())
        } else {
            Err(StorageError::not_found(format!("Bucket {bucket}")))
        }
    }
}

impl Default for FakeObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for FakeObjectStore {
    fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        Ok(self
            .storage
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(bucket))
    }

    fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut storage = self.storage.lock().expect("storage mutex poisoned");
        if storage.contains_key(bucket) {
            return Err(StorageError::new(
                ErrorKind::AlreadyExists,
                format!("Bucket {bucket} already exists"),
            ));
        }
        storage.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StorageResult<ObjectListing> {
        let start = match continuation_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| {
                StorageError::new(
                    ErrorKind::InvalidInput,
                    format!("Invalid continuation token {token:?}"),
                )
            })?,
        };

        let storage = self.storage.lock().expect("storage mutex poisoned");
        let bucket_map = storage
            .get(bucket)
            .ok_or_else(|| StorageError::not_found(format!("Bucket {bucket}")))?;

        let matching: Vec<ObjectMetadata> = bucket_map
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .skip(start)
            .take(self.page_size + 1)
            .map(|(key, data)| ObjectMetadata {
                key: key.clone(),
                size: data.len() as u64,
                etag: Some(format!("etag-{key}")),
            })
            .collect();
        drop(storage);

        let mut objects = matching;
        let next_continuation_token = if objects.len() > self.page_size {
            objects.truncate(self.page_size);
            Some((start + self.page_size).to_string())
        } else {
            None
        };
        Ok(ObjectListing {
            objects,
            next_continuation_token,
        })
    }

    fn get_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> StorageResult<Vec<u8>> {
        let storage = self.storage.lock().expect("storage mutex poisoned");
        storage
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|data| range_of(data, offset, length))
            .ok_or_else(|| StorageError::not_found(format!("Object {bucket}/{key}")))
    }

    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StorageResult<()> {
        self.require_bucket(bucket)?;
        self.insert_object(bucket, key, data);
        self.counters.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_multipart_upload(&self, bucket: &str, key: &str) -> StorageResult<String> {
        self.require_bucket(bucket)?;
        let id = self.counters.next_upload.fetch_add(1, Ordering::SeqCst);
        let upload_id = format!("upload-{id}");
        self.uploads.lock().expect("uploads mutex poisoned").insert(
            upload_id.clone(),
            PendingUpload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: u32,
        data: &[u8],
    ) -> StorageResult<CompletedPart> {
        if self.failing_part == Some(part_number) {
            return Err(StorageError::new(
                ErrorKind::Network,
                format!("Injected failure uploading part {part_number} of {upload_id}"),
            ));
        }
        let mut uploads = self.uploads.lock().expect("uploads mutex poisoned");
        let upload = uploads
            .get_mut(upload_id)
            .ok_or_else(|| StorageError::not_found(format!("Upload {upload_id}")))?;
        upload.parts.insert(part_number, data.to_vec());
        Ok(CompletedPart {
            part_number,
            etag: format!("etag-{upload_id}-{part_number}"),
        })
    }

    fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        if !parts.windows(2).all(|w| w[0].part_number < w[1].part_number) {
            return Err(StorageError::new(
                ErrorKind::InvalidInput,
                "Parts must be listed in ascending part number order",
            ));
        }
        let upload = self
            .uploads
            .lock()
            .expect("uploads mutex poisoned")
            .remove(upload_id)
            .ok_or_else(|| StorageError::not_found(format!("Upload {upload_id}")))?;
        if upload.bucket != bucket || upload.key != key {
            return Err(StorageError::new(
                ErrorKind::InvalidInput,
                format!("Upload {upload_id} belongs to {}/{}", upload.bucket, upload.key),
            ));
        }

        let mut object = Vec::new();
        for part in parts {
            let data = upload.parts.get(&part.part_number).ok_or_else(|| {
                StorageError::new(
                    ErrorKind::InvalidInput,
                    format!("Part {} was never uploaded", part.part_number),
                )
            })?;
            object.extend_from_slice(data);
        }
        self.insert_object(bucket, key, object);
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn abort_multipart_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> StorageResult<()> {
        self.uploads
            .lock()
            .expect("uploads mutex poisoned")
            .remove(upload_id);
        self.counters.aborted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// FakeHdfs
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(pos) => Some(&path[..pos]),
    }
}

/// In-memory HDFS namespace.
#[derive(Clone, Default)]
pub struct FakeHdfs {
    nodes: Arc<Mutex<BTreeMap<String, Node>>>,
    unlistable: Arc<Mutex<HashSet<String>>>,
}

impl FakeHdfs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a whole file, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the namespace is poisoned.
    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        let path = normalize(path);
        let mut nodes = self.nodes.lock().expect("namespace mutex poisoned");
        let mut ancestor = parent_of(&path);
        while let Some(dir) = ancestor {
            nodes.insert(dir.to_string(), Node::Dir);
            ancestor = parent_of(dir);
        }
        nodes.insert(path, Node::File(data.into()));
    }

    /// Contents of a file, if it exists.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the namespace is poisoned.
    #[must_use]
    pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match self
            .nodes
            .lock()
            .expect("namespace mutex poisoned")
            .get(&normalize(path))
        {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Make listing `path` fail, to exercise traversal error handling.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the failure set is poisoned.
    pub fn fail_listing(&self, path: &str) {
        self.unlistable
            .lock()
            .expect("unlistable mutex poisoned")
            .insert(normalize(path));
    }
}

impl HdfsClient for FakeHdfs {
    fn status(&self, path: &str) -> StorageResult<FileStatus> {
        let path = normalize(path);
        if path == "/" {
            return Ok(FileStatus {
                path,
                length: 0,
                is_dir: true,
            });
        }
        let nodes = self.nodes.lock().expect("namespace mutex poisoned");
        match nodes.get(&path) {
            Some(Node::Dir) => Ok(FileStatus {
                path,
                length: 0,
                is_dir: true,
            }),
            Some(Node::File(data)) => Ok(FileStatus {
                length: data.len() as u64,
                path,
                is_dir: false,
            }),
            None => Err(StorageError::not_found(format!("Path {path}"))),
        }
    }

    fn list_status(&self, path: &str) -> StorageResult<Vec<FileStatus>> {
        let dir = normalize(path);
        if self
            .unlistable
            .lock()
            .expect("unlistable mutex poisoned")
            .contains(&dir)
        {
            return Err(StorageError::new(
                ErrorKind::ServiceUnavailable,
                format!("Listing {dir} failed"),
            ));
        }
        if !self.status(&dir)?.is_dir {
            return Err(StorageError::new(
                ErrorKind::InvalidInput,
                format!("{dir} is not a directory"),
            ));
        }
        let nodes = self.nodes.lock().expect("namespace mutex poisoned");
        Ok(nodes
            .iter()
            .filter(|(child, _)| parent_of(child) == Some(dir.as_str()))
            .map(|(child, node)| FileStatus {
                path: child.clone(),
                length: match node {
                    Node::Dir => 0,
                    Node::File(data) => data.len() as u64,
                },
                is_dir: matches!(node, Node::Dir),
            })
            .collect())
    }

    fn open(&self, path: &str, offset: u64, length: u64) -> StorageResult<Vec<u8>> {
        self.read_file(path)
            .map(|data| range_of(&data, offset, length))
            .ok_or_else(|| StorageError::not_found(format!("File {path}")))
    }

    fn mkdirs(&self, path: &str) -> StorageResult<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.lock().expect("namespace mutex poisoned");
        let mut current = Some(path.as_str());
        while let Some(dir) = current {
            if dir == "/" {
                break;
            }
            if let Some(Node::File(_)) = nodes.get(dir) {
                return Err(StorageError::new(
                    ErrorKind::AlreadyExists,
                    format!("{dir} exists and is a file"),
                ));
            }
            nodes.insert(dir.to_string(), Node::Dir);
            current = parent_of(dir);
        }
        Ok(())
    }

    fn create(&self, path: &str) -> StorageResult<()> {
        let path = normalize(path);
        if let Some(parent) = parent_of(&path) {
            self.mkdirs(parent)?;
        }
        let mut nodes = self.nodes.lock().expect("namespace mutex poisoned");
        if nodes.contains_key(&path) {
            return Err(StorageError::new(
                ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        nodes.insert(path, Node::File(Vec::new()));
        Ok(())
    }

    fn append(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.lock().expect("namespace mutex poisoned");
        match nodes.get_mut(&path) {
            Some(Node::File(contents)) => {
                contents.extend_from_slice(data);
                Ok(())
            }
            Some(Node::Dir) => Err(StorageError::new(
                ErrorKind::InvalidInput,
                format!("{path} is a directory"),
            )),
            None => Err(StorageError::not_found(format!("File {path}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_listing_paginates() {
        let store = FakeObjectStore::new().with_page_size(2);
        for key in ["in/a", "in/b", "in/c", "other/d"] {
            store.insert_object("bucket", key, "x");
        }
        let first = store.list_objects("bucket", "in/", None).unwrap();
        assert_eq!(first.objects.len(), 2);
        let token = first.next_continuation_token.unwrap();
        let second = store.list_objects("bucket", "in/", Some(&token)).unwrap();
        assert_eq!(second.objects[0].key, "in/c");
        assert!(!second.is_truncated());
    }

    #[test]
    fn multipart_assembles_parts_in_order() {
        let store = FakeObjectStore::new();
        store.create_bucket("b").unwrap();
        let id = store.create_multipart_upload("b", "k").unwrap();
        let second = store.upload_part("b", "k", &id, 2, b"world").unwrap();
        let first = store.upload_part("b", "k", &id, 1, b"hello ").unwrap();
        store
            .complete_multipart_upload("b", "k", &id, &[first, second])
            .unwrap();
        assert_eq!(store.object("b", "k").unwrap(), b"hello world");
        assert_eq!(store.in_flight_uploads(), 0);
        assert_eq!(store.completed_uploads(), 1);
    }

    #[test]
    fn unsorted_parts_are_refused() {
        let store = FakeObjectStore::new();
        store.create_bucket("b").unwrap();
        let id = store.create_multipart_upload("b", "k").unwrap();
        let one = store.upload_part("b", "k", &id, 1, b"a").unwrap();
        let two = store.upload_part("b", "k", &id, 2, b"b").unwrap();
        assert!(store.complete_multipart_upload("b", "k", &id, &[two, one]).is_err());
    }

    #[test]
    fn hdfs_create_append_and_list() {
        let hdfs = FakeHdfs::new();
        hdfs.create("/out/w.ldjson").unwrap();
        hdfs.append("/out/w.ldjson", b"a\n").unwrap();
        hdfs.append("/out/w.ldjson", b"b\n").unwrap();
        assert_eq!(hdfs.read_file("/out/w.ldjson").unwrap(), b"a\nb\n");
        assert!(hdfs.create("/out/w.ldjson").is_err());

        let listing = hdfs.list_status("/out").unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].length, 4);
        assert!(hdfs.status("/out").unwrap().is_dir);
        assert_eq!(hdfs.open("/out/w.ldjson", 2, 10).unwrap(), b"b\n");
    }

    #[test]
    fn hdfs_missing_paths_are_not_found() {
        let hdfs = FakeHdfs::new();
        assert!(hdfs.status("/nope").unwrap_err().is_not_found());
        assert!(hdfs.append("/nope", b"x").unwrap_err().is_not_found());
    }
}
