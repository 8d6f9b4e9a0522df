//! Core traits for storage backends.
//!
//! These traits are the collaborator boundary to the real storage clients. They
//! are synchronous; implementations wrapping an async SDK block internally.

use std::fmt;

// ============================================================================
// Core Error Type
// ============================================================================

/// Error reported by a storage client.
#[derive(Debug, Clone)]
pub struct StorageError {
    pub message: String,
    pub kind: ErrorKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    AlreadyExists,
    InvalidInput,
    Network,
    Timeout,
    ServiceUnavailable,
    RateLimited,
    InternalError,
    Other,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} not found"))
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================================
// ObjectStore - Object Storage
// ============================================================================

/// Metadata for an object in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub objects: Vec<ObjectMetadata>,
    /// Token for the next page; `None` on the last page.
    pub next_continuation_token: Option<String>,
}

impl ObjectListing {
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.next_continuation_token.is_some()
    }
}

/// Receipt for one uploaded part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// One-based part number.
    pub part_number: u32,
    pub etag: String,
}

/// Object storage operations used by readers, senders and slicers.
pub trait ObjectStore: Send + Sync {
    /// Check whether a bucket exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself fails.
    fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket already exists or creation fails.
    fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// List one page of objects under `prefix`, resuming from `continuation_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist or the listing fails.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StorageResult<ObjectListing>;

    /// Read `length` bytes starting at `offset`, truncated at the end of the object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object doesn't exist or the download fails.
    fn get_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> StorageResult<Vec<u8>>;

    /// Upload a whole object in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist or the upload fails.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Start a multipart upload and return its upload id.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket doesn't exist or the request fails.
    fn create_multipart_upload(&self, bucket: &str, key: &str) -> StorageResult<String>;

    /// Upload one part of a multipart upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload id is unknown or the upload fails.
    fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: &[u8],
    ) -> StorageResult<CompletedPart>;

    /// Assemble the object from `parts`, which must be sorted by part number.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload id is unknown or a part is missing.
    fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()>;

    /// Discard a multipart upload and every part uploaded for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the abort request fails.
    fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str) -> StorageResult<()>;
}

// ============================================================================
// HdfsClient - Distributed File System
// ============================================================================

/// Status of one HDFS path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Absolute path.
    pub path: String,
    pub length: u64,
    pub is_dir: bool,
}

/// The subset of the HDFS client API this crate needs.
pub trait HdfsClient: Send + Sync {
    /// # Errors
    ///
    /// Returns a `NotFound` error if `path` does not exist.
    fn status(&self, path: &str) -> StorageResult<FileStatus>;

    /// Direct children of a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a listable directory.
    fn list_status(&self, path: &str) -> StorageResult<Vec<FileStatus>>;

    /// Read `length` bytes at `offset`, truncated at the end of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the read fails.
    fn open(&self, path: &str, offset: u64, length: u64) -> StorageResult<Vec<u8>>;

    /// Create a directory and its missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if a path component is a file.
    fn mkdirs(&self, path: &str) -> StorageResult<()>;

    /// Create an empty file, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists.
    fn create(&self, path: &str) -> StorageResult<()>;

    /// Append bytes to an existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or the write fails.
    fn append(&self, path: &str, data: &[u8]) -> StorageResult<()>;
}
