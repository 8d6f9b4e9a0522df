//! # chunkio
//!
//! Chunked, delimiter-aware reading and writing of large flat files on a local
//! file system, HDFS, or object storage.
//!
//! ## Key Features
//!
//! - **Byte-range slicing** - cut arbitrarily large files into slices that can be
//!   read independently, without knowing record lengths in advance
//! - **Margin reading** - reconstruct the record that straddles a slice end by
//!   reading past it in growing steps
//! - **Formats** - JSON documents, line-delimited JSON, CSV, TSV and raw lines
//! - **Compression** - gzip and lz4, behind cargo features
//! - **Chunked sending** - format, compress and chunk record batches, with
//!   dynamic routing and bounded concurrency
//! - **Multipart uploads** - large objects are uploaded in parts and aborted on
//!   failure
//!
//! ## Quick Start
//!
//! ```no_run
//! use chunkio::config::{Format, ReaderConfig, SenderConfig};
//! use chunkio::io::local::{FileFetcher, FsDestination, LocalLister};
//! use chunkio::io::slicer::{DirectorySlicer, Slicer};
//! use chunkio::{ChunkedReader, ChunkedSender};
//!
//! # fn main() -> chunkio::Result<()> {
//! let config = ReaderConfig::new("/data/in", Format::Csv);
//! let mut slicer = DirectorySlicer::new(config.clone(), LocalLister)?;
//! let reader = ChunkedReader::new(config, FileFetcher)?;
//!
//! let mut sender = ChunkedSender::new(
//!     SenderConfig::new("/data/out", "worker-1", Format::Ldjson),
//!     FsDestination::new(),
//! )?;
//! sender.verify(None)?;
//! while let Some(slices) = slicer.slice() {
//!     for slice in &slices {
//!         sender.send(&reader.read(slice)?)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`slice`] - File slices and the offset calculator
//! - [`config`] - Reader and sender configuration
//! - [`record`] - Decoded records and their provenance
//! - [`reject`] - Handling of records that fail to decode
//! - [`io`] - Compression, the read and write engines, and the backends
//! - [`testing`] - In-memory helpers for tests

pub mod config;
pub mod error;
pub mod io;
pub mod record;
pub mod reject;
pub mod slice;
pub mod testing;

pub use config::{Compression, Format, ReaderConfig, RejectAction, SenderConfig};
pub use error::{Error, Result};
pub use io::reader::{ChunkedReader, RangeFetch};
pub use io::slicer::Slicer;
pub use io::writer::{ChunkedSender, Destination};
pub use record::{Record, RecordMeta};
pub use reject::{RejectCollector, RejectPolicy, SharedCollector};
pub use slice::{FileSlice, compute_offsets, slices_for_file};
