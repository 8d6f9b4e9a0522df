//! Record boundary reconstruction for byte-range slices.
//!
//! A slice rarely ends on a record boundary. [`read_with_margin`] keeps reading
//! small ranges past the end of the slice ("margin") until the record that straddles
//! the boundary is complete, and [`split_records`] drops the leading fragment that
//! belongs to the previous slice.

use super::RangeFetch;
use crate::error::Result;
use crate::slice::FileSlice;

/// Find `needle` in `haystack` at or after byte `from`.
#[must_use]
pub fn find_delimiter(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Split on every occurrence of `delimiter`, keeping empty pieces.
#[must_use]
pub fn split_on<'a>(data: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(pos) = find_delimiter(data, delimiter, start) {
        pieces.push(&data[start..pos]);
        start = pos + delimiter.len();
    }
    pieces.push(&data[start..]);
    pieces
}

/// The complete records of a reconstructed slice, in source order.
///
/// A trailing delimiter does not produce an empty record. For every slice but the
/// first of a file the leading piece is dropped: it is the tail of a record the
/// previous slice already completed through its margin, or the empty piece in
/// front of the overlapping delimiter.
#[must_use]
pub fn split_records<'a>(data: &'a [u8], delimiter: &[u8], slice: &FileSlice) -> Vec<&'a [u8]> {
    let data = data.strip_suffix(delimiter).unwrap_or(data);
    let mut records = split_on(data, delimiter);
    if slice.offset != 0 {
        records.remove(0);
    }
    records
}

/// Mean length of the delimiter-separated pieces of `data`.
#[must_use]
pub fn average_record_size(data: &[u8], delimiter: &[u8]) -> usize {
    let pieces = split_on(data, delimiter);
    let total: usize = pieces.iter().map(|p| p.len()).sum();
    total / pieces.len()
}

/// Fetch a slice and, unless it is the tail of its file or already ends with the
/// delimiter, extend it up to the end of the record that straddles its end.
///
/// Margin is fetched in steps of twice the average record size. Reading stops at
/// the first delimiter found after the slice's own complete delimiters, or when
/// the source returns no more bytes. The data is kept up to and including that
/// delimiter; bytes past it belong to the next slice and are discarded. A
/// delimiter split across the slice end is found too.
///
/// # Errors
///
/// Propagates any error from `fetcher`.
pub fn read_with_margin<F>(fetcher: &F, slice: &FileSlice, delimiter: &[u8]) -> Result<Vec<u8>>
where
    F: RangeFetch + ?Sized,
{
    let mut data = fetcher.fetch(slice)?;
    if slice.is_tail() || data.ends_with(delimiter) {
        return Ok(data);
    }

    let step = (2 * average_record_size(&data, delimiter)).max(1) as u64;
    let overlap = delimiter.len() - 1;
    let mut search_from = data.len().saturating_sub(overlap);
    let mut next = slice.at(slice.offset + slice.length, step);
    log::debug!(
        "{}@{}: reading margin in steps of {step} bytes",
        slice.path,
        slice.offset
    );

    loop {
        let margin = fetcher.fetch(&next)?;
        if margin.is_empty() {
            break;
        }
        data.extend_from_slice(&margin);
        if let Some(pos) = find_delimiter(&data, delimiter, search_from) {
            data.truncate(pos + delimiter.len());
            break;
        }
        search_from = data.len().saturating_sub(overlap);
        next = next.at(next.offset + step, step);
    }
    Ok(data)
}
