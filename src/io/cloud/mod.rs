//! Storage client abstractions.
//!
//! Backends talk to remote storage through two small synchronous traits:
//!
//! - [`ObjectStore`] - buckets, paginated listings, ranged reads, puts and
//!   multipart uploads
//! - [`HdfsClient`] - status, listing, positioned reads, mkdirs, create and append
//!
//! Implementations wrapping an async SDK block internally. Both traits come with
//! in-memory fakes ([`FakeObjectStore`], [`FakeHdfs`]) for tests and dry runs.
//!
//! ```
//! use chunkio::io::cloud::{FakeObjectStore, ObjectStore, split_bucket_path};
//!
//! let store = FakeObjectStore::new();
//! let (bucket, prefix) = split_bucket_path("logs/2024").unwrap();
//! store.create_bucket(&bucket).unwrap();
//! store.put_object(&bucket, &format!("{prefix}a.ldjson"), b"{}\n").unwrap();
//! assert_eq!(store.keys("logs"), vec!["2024/a.ldjson".to_string()]);
//! ```

pub mod fake;
pub mod helpers;
pub mod traits;

pub use fake::*;
pub use helpers::{batch_in_chunks, split_bucket_path, split_object_path};
pub use traits::*;
