//! Testing utilities for chunked readers and senders.
//!
//! This module provides the in-memory and temporary-file helpers used by the
//! crate's own tests, exposed so hosts can exercise their own backends and
//! configurations the same way:
//!
//! - **Fetch sources**: [`MemoryFetch`] serves ranges of an in-memory file;
//!   [`ScriptedFetch`] replays a fixed sequence of responses, for margin tests
//! - **Fixtures**: sample record batches and their expected serializations
//! - **Mock I/O**: temporary directories and files that clean up on drop
//!
//! The storage fakes live next to the traits they implement, in
//! [`crate::io::cloud::fake`].
//!
//! # Quick Start
//!
//! ```
//! use chunkio::config::{Format, ReaderConfig};
//! use chunkio::io::reader::ChunkedReader;
//! use chunkio::slice::slices_for_file;
//! use chunkio::testing::MemoryFetch;
//!
//! # fn main() -> chunkio::Result<()> {
//! let source = b"{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n".to_vec();
//! let mut config = ReaderConfig::new("mem", Format::Ldjson);
//! config.size = 8;
//!
//! let slices = slices_for_file("mem", source.len() as u64, &config);
//! let reader = ChunkedReader::new(config, MemoryFetch::new(source))?;
//! assert_eq!(reader.read_all(&slices)?.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod fetch;
pub mod fixtures;
pub mod mock_io;

pub use fetch::*;
pub use fixtures::*;
pub use mock_io::*;
