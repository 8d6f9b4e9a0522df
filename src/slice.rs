//! Byte-range slices of a file and the offset calculator that produces them.
//!
//! Every slice after the first starts `delimiter.len()` bytes early. The reader
//! splits a slice on the delimiter and drops the leading fragment, so that fragment
//! is either the tail of a record owned by the previous slice or, when the
//! previous slice ended exactly on a record boundary, the empty string in front of
//! the overlapping delimiter. Either way each record is emitted by exactly one
//! slice when slices are processed in order.

use crate::config::ReaderConfig;

/// One byte range of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSlice {
    pub path: String,
    pub offset: u64,
    pub length: u64,
    /// Size of the whole file.
    pub total: u64,
}

impl FileSlice {
    #[must_use]
    pub fn new(path: impl Into<String>, offset: u64, length: u64, total: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            length,
            total,
        }
    }

    /// A slice covering the whole file.
    #[must_use]
    pub fn whole(path: impl Into<String>, total: u64) -> Self {
        Self::new(path, 0, total, total)
    }

    /// Whether the slice ends at the end of the file.
    #[must_use]
    pub const fn is_tail(&self) -> bool {
        self.offset + self.length == self.total
    }

    /// A copy of this slice moved to another range of the same file.
    #[must_use]
    pub fn at(&self, offset: u64, length: u64) -> Self {
        Self {
            path: self.path.clone(),
            offset,
            length,
            total: self.total,
        }
    }
}

/// An `{offset, length}` pair produced by [`compute_offsets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub offset: u64,
    pub length: u64,
}

impl Offset {
    #[must_use]
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }
}

/// Split a file of `total` bytes into ranges of roughly `chunk_size` bytes.
///
/// ```
/// use chunkio::slice::{compute_offsets, Offset};
///
/// assert_eq!(
///     compute_offsets(10, 21, "\r\n"),
///     vec![Offset::new(0, 10), Offset::new(8, 12), Offset::new(18, 3)],
/// );
/// ```
///
/// A `chunk_size` that does not exceed the delimiter length is raised to one byte
/// past it, so every slice after the first starts past the first byte of the file.
#[must_use]
pub fn compute_offsets(chunk_size: u64, total: u64, delimiter: &str) -> Vec<Offset> {
    let delta = delimiter.len() as u64;
    let chunk_size = chunk_size.max(delta + 1);
    if total == 0 {
        return Vec::new();
    }
    if total < chunk_size {
        return vec![Offset::new(0, total)];
    }

    let full_chunks = total / chunk_size;
    let mut offsets = Vec::with_capacity(full_chunks as usize + 1);

    // nothing precedes the first chunk
    offsets.push(Offset::new(0, chunk_size));
    for chunk in 1..full_chunks {
        offsets.push(Offset::new(chunk * chunk_size - delta, chunk_size + delta));
    }

    let remainder = total % chunk_size;
    if remainder > 0 {
        offsets.push(Offset::new(full_chunks * chunk_size - delta, remainder + delta));
    }
    offsets
}

/// Slices for one discovered file, honouring the whole-file shortcut.
#[must_use]
pub fn slices_for_file(path: &str, total: u64, config: &ReaderConfig) -> Vec<FileSlice> {
    if total == 0 {
        return Vec::new();
    }
    if config.whole_file_slices() {
        return vec![FileSlice::whole(path, total)];
    }
    compute_offsets(config.size, total, &config.line_delimiter)
        .into_iter()
        .map(|o| FileSlice::new(path, o.offset, o.length, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Compression, Format};
    use proptest::prelude::*;

    #[test]
    fn empty_file_has_no_offsets() {
        assert!(compute_offsets(10, 0, "\n").is_empty());
    }

    #[test]
    fn small_file_is_one_slice() {
        assert_eq!(compute_offsets(10, 7, "\n"), vec![Offset::new(0, 7)]);
    }

    #[test]
    fn exact_multiple_has_no_tail() {
        assert_eq!(
            compute_offsets(10, 20, "\n"),
            vec![Offset::new(0, 10), Offset::new(9, 11)]
        );
    }

    #[test]
    fn remainder_gets_a_tail_slice() {
        assert_eq!(
            compute_offsets(10, 21, "\r\n"),
            vec![Offset::new(0, 10), Offset::new(8, 12), Offset::new(18, 3)]
        );
    }

    #[test]
    fn total_equal_to_chunk_is_one_slice() {
        assert_eq!(compute_offsets(10, 10, "\n"), vec![Offset::new(0, 10)]);
    }

    #[test]
    fn chunk_no_longer_than_delimiter_is_raised() {
        assert_eq!(
            compute_offsets(1, 5, "\r\n"),
            vec![Offset::new(0, 3), Offset::new(1, 4)]
        );
        assert_eq!(compute_offsets(0, 2, "\n"), vec![Offset::new(0, 2)]);
        assert!(compute_offsets(1, 4, "\n").iter().skip(1).all(|o| o.offset > 0));
    }

    #[test]
    fn whole_file_shortcut() {
        let mut config = ReaderConfig::new("/d", Format::Ldjson);
        config.size = 4;
        assert_eq!(slices_for_file("/d/a", 10, &config).len(), 3);

        config.format = Format::Json;
        assert_eq!(slices_for_file("/d/a", 10, &config), vec![FileSlice::whole("/d/a", 10)]);

        config.format = Format::Ldjson;
        config.compression = Compression::Gzip;
        config.file_per_slice = true;
        assert_eq!(slices_for_file("/d/a", 10, &config).len(), 1);
        assert!(slices_for_file("/d/a", 0, &config).is_empty());
    }

    proptest! {
        #[test]
        fn offsets_cover_the_file_exactly(
            chunk in 0u64..64,
            total in 0u64..2048,
            delimiter in prop_oneof![Just("\n"), Just("\r\n"), Just("||"), Just("<eor>")],
        ) {
            let offsets = compute_offsets(chunk, total, delimiter);
            let delta = delimiter.len() as u64;
            prop_assert!(offsets.iter().skip(1).all(|o| o.offset > 0));
            let mut covered = 0u64;
            for (i, o) in offsets.iter().enumerate() {
                let (start, end) = if i == 0 {
                    (o.offset, o.offset + o.length)
                } else {
                    (o.offset + delta, o.offset + o.length)
                };
                prop_assert_eq!(start, covered);
                prop_assert!(end > start);
                covered = end;
            }
            prop_assert_eq!(covered, total);
        }
    }
}
