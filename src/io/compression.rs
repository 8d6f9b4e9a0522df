//! Whole-payload compression codecs.
//!
//! A [`Compressor`] wraps one of the codecs selected by [`Compression`]. Payloads
//! are compressed and decompressed as a whole: a compressed file is always written
//! and read as a single slice, so no streaming or seeking is needed.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags, the following codecs are available:
//! - **Gzip** (`.gz`) - via `flate2` crate (feature: `compression-gzip`)
//! - **Lz4** (`.lz4`) - lz4 frame format via `lz4_flex` crate (feature: `compression-lz4`)
//!
//! ## Registry
//!
//! Codecs are stateless and live in a process-wide registry that is initialised
//! exactly once, on first use, and kept for the lifetime of the process.
//!
//! ```
//! use chunkio::config::Compression;
//! use chunkio::io::compression::Compressor;
//! # fn main() -> chunkio::Result<()> {
//!
//! let gzip = Compressor::new(Compression::Gzip)?;
//! let packed = gzip.compress(b"a\nb\n")?;
//! assert_eq!(gzip.decompress(&packed)?, b"a\nb\n");
//! # Ok(())
//! # }
//! ```

use crate::config::Compression;
use crate::error::{Error, Result};
use std::sync::{Arc, OnceLock};

/// Global codec registry, built on first use.
static CODEC_REGISTRY: OnceLock<Vec<Arc<dyn CompressionCodec>>> = OnceLock::new();

/// Initialize the codec registry with built-in codecs.
fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-lz4")]
        Arc::new(Lz4Codec),
    ]
}

fn lookup(compression: Compression) -> Option<Arc<dyn CompressionCodec>> {
    CODEC_REGISTRY
        .get_or_init(init_registry)
        .iter()
        .find(|codec| codec.kind() == compression)
        .cloned()
}

/// A compression algorithm operating on complete payloads.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` as they're stored in a global registry
/// and shared by concurrent senders.
pub trait CompressionCodec: Send + Sync {
    fn kind(&self) -> Compression;

    /// Human-readable codec name (e.g., "gzip").
    fn name(&self) -> &str;

    /// Magic byte signature every compressed payload starts with.
    fn magic_bytes(&self) -> &[u8];

    /// Compress a complete payload.
    ///
    /// # Errors
    /// Returns the encoder's I/O error.
    fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>>;

    /// Decompress a complete payload.
    ///
    /// # Errors
    /// Returns the decoder's I/O error for truncated or corrupt input.
    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>>;
}

/// Symmetric compress/decompress for the configured [`Compression`].
#[derive(Clone)]
pub struct Compressor {
    kind: Compression,
    codec: Option<Arc<dyn CompressionCodec>>,
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor").field("kind", &self.kind).finish()
    }
}

impl Compressor {
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the codec was not compiled in.
    pub fn new(kind: Compression) -> Result<Self> {
        if kind.is_none() {
            return Ok(Self { kind, codec: None });
        }
        let codec = lookup(kind).ok_or_else(|| {
            Error::config(
                "compression",
                format!("{kind} support is not enabled in this build"),
            )
        })?;
        Ok(Self {
            kind,
            codec: Some(codec),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> Compression {
        self.kind
    }

    /// # Errors
    ///
    /// Returns [`Error::Compression`] if the codec fails.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match &self.codec {
            None => Ok(data.to_vec()),
            Some(codec) => codec.compress(data).map_err(|source| Error::Compression {
                codec: codec.name().to_string(),
                source,
            }),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Compression`] if the payload does not carry the codec's
    /// signature or cannot be decoded.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(codec) = &self.codec else {
            return Ok(data.to_vec());
        };
        let failed = |source| Error::Compression {
            codec: codec.name().to_string(),
            source,
        };
        if !data.starts_with(codec.magic_bytes()) {
            return Err(failed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("payload is not {} compressed", codec.name()),
            )));
        }
        codec.decompress(data).map_err(failed)
    }
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn kind(&self) -> Compression {
        Compression::Gzip
    }

    fn name(&self) -> &str {
        "gzip"
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x1f, 0x8b]
    }

    fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        use flate2::Compression as Level;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Level::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let mut out = Vec::with_capacity(data.len() * 2);
        GzDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(feature = "compression-lz4")]
struct Lz4Codec;

#[cfg(feature = "compression-lz4")]
impl CompressionCodec for Lz4Codec {
    fn kind(&self) -> Compression {
        Compression::Lz4
    }

    fn name(&self) -> &str {
        "lz4"
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x04, 0x22, 0x4d, 0x18]
    }

    fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        use lz4_flex::frame::FrameEncoder;
        use std::io::Write;

        let mut encoder = FrameEncoder::new(Vec::with_capacity(data.len() / 2));
        encoder.write_all(data)?;
        encoder.finish().map_err(std::io::Error::other)
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        use lz4_flex::frame::FrameDecoder;
        use std::io::Read;

        let mut out = Vec::with_capacity(data.len() * 2);
        FrameDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enabled() -> Vec<Compressor> {
        [Compression::None, Compression::Gzip, Compression::Lz4]
            .into_iter()
            .filter_map(|kind| Compressor::new(kind).ok())
            .collect()
    }

    #[test]
    fn empty_payload_roundtrips() {
        for compressor in enabled() {
            let packed = compressor.compress(b"").unwrap();
            assert_eq!(compressor.decompress(&packed).unwrap(), b"");
        }
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_rejects_foreign_payloads() {
        let gzip = Compressor::new(Compression::Gzip).unwrap();
        let err = gzip.decompress(b"{\"plain\":true}\n").unwrap_err();
        assert!(matches!(err, Error::Compression { .. }));
    }

    #[cfg(feature = "compression-lz4")]
    #[test]
    fn lz4_output_is_framed() {
        let lz4 = Compressor::new(Compression::Lz4).unwrap();
        let packed = lz4.compress(&b"abc".repeat(100)).unwrap();
        assert!(packed.starts_with(&[0x04, 0x22, 0x4d, 0x18]));
        assert!(packed.len() < 300);
    }

    proptest! {
        #[test]
        fn every_codec_roundtrips(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            for compressor in enabled() {
                let packed = compressor.compress(&data).unwrap();
                prop_assert_eq!(compressor.decompress(&packed).unwrap(), data.clone());
            }
        }
    }
}
