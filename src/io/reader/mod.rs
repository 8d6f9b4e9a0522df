//! Slice reading shared by every backend.
//!
//! A backend only provides [`RangeFetch`]; [`ChunkedReader`] does the rest:
//!
//! ```text
//! fetch -> (needs margin? -> margin loop) -> decode -> drop rejected -> records
//! ```
//!
//! Compressed files are always read as one whole slice, decompressed, then decoded.

pub mod decode;
pub mod margin;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::io::compression::Compressor;
use crate::record::Record;
use crate::reject::{RejectPolicy, SharedCollector};
use crate::slice::FileSlice;
use decode::Decoder;

pub use margin::{read_with_margin, split_records};

/// Byte-range read primitive implemented by each backend.
///
/// Implementations return the bytes of `[offset, offset + length)`, truncated at
/// the end of the file; a range starting at or past the end yields an empty vector.
pub trait RangeFetch: Send + Sync {
    /// # Errors
    ///
    /// Returns the backend's I/O or storage error.
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>>;
}

impl<T: RangeFetch + ?Sized> RangeFetch for &T {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        (**self).fetch(slice)
    }
}

/// Reads slices into records for one configuration and one backend.
#[derive(Debug)]
pub struct ChunkedReader<F> {
    config: ReaderConfig,
    fetcher: F,
    compressor: Compressor,
    decoder: Decoder,
}

impl<F: RangeFetch> ChunkedReader<F> {
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if `config` does not validate.
    pub fn new(config: ReaderConfig, fetcher: F) -> Result<Self> {
        Self::build(config, fetcher, None)
    }

    /// Like [`ChunkedReader::new`], also recording rejected records in `collector`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if `config` does not validate.
    pub fn with_collector(
        config: ReaderConfig,
        fetcher: F,
        collector: SharedCollector,
    ) -> Result<Self> {
        Self::build(config, fetcher, Some(collector))
    }

    fn build(config: ReaderConfig, fetcher: F, collector: Option<SharedCollector>) -> Result<Self> {
        config.validate()?;
        let compressor = Compressor::new(config.compression)?;
        let decoder = Decoder::new(&config, RejectPolicy::new(config.on_reject_action, collector))?;
        Ok(Self {
            config,
            fetcher,
            compressor,
            decoder,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Decode every complete record owned by `slice`, in source order.
    ///
    /// # Errors
    ///
    /// Propagates fetch and decompression failures, and decode failures when the
    /// reject action is `throw`.
    pub fn read(&self, slice: &FileSlice) -> Result<Vec<Record>> {
        let data = if self.compressor.kind().is_none() {
            read_with_margin(&self.fetcher, slice, self.config.line_delimiter.as_bytes())?
        } else {
            let packed = self.fetcher.fetch(slice)?;
            self.compressor.decompress(&packed)?
        };
        log::debug!(
            "{}@{}: decoding {} bytes as {}",
            slice.path,
            slice.offset,
            data.len(),
            self.decoder.format()
        );
        Ok(self
            .decoder
            .decode(&data, slice)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Read a worklist of slices in order and concatenate their records.
    ///
    /// # Errors
    ///
    /// Stops at the first failing slice.
    pub fn read_all<'a, I>(&self, slices: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = &'a FileSlice>,
    {
        let mut records = Vec::new();
        for slice in slices {
            records.extend(self.read(slice)?);
        }
        Ok(records)
    }
}
