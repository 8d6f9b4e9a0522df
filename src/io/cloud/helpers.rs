//! Helpers shared by the storage backends.
//!
//! - [`split_bucket_path`] - Split a `bucket/prefix` path
//! - [`split_object_path`] - Split a `bucket/key` object name
//! - [`batch_in_chunks`] - Process a lazy sequence in bounded windows
//! - [`validate_bucket_name`] / [`validate_key_path`] - Reject malformed names early

use crate::io::cloud::traits::{ErrorKind, StorageError, StorageResult};

/// Split a combined `bucket/prefix` path.
///
/// The first segment is the bucket; the rest, if any, is the prefix, normalized
/// to end with `/`. Leading slashes are ignored.
///
/// ```
/// use chunkio::io::cloud::split_bucket_path;
///
/// assert_eq!(split_bucket_path("logs/2024/jan").unwrap(), ("logs".to_string(), "2024/jan/".to_string()));
/// assert_eq!(split_bucket_path("logs").unwrap(), ("logs".to_string(), String::new()));
/// ```
///
/// # Errors
///
/// Returns an `InvalidInput` error when no bucket name is present.
pub fn split_bucket_path(path: &str) -> StorageResult<(String, String)> {
    let trimmed = path.trim_start_matches('/');
    let (bucket, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    validate_bucket_name(bucket)?;
    let rest = rest.trim_matches('/');
    let prefix = if rest.is_empty() {
        String::new()
    } else {
        format!("{rest}/")
    };
    Ok((bucket.to_string(), prefix))
}

/// Split a `bucket/key` object name.
///
/// # Errors
///
/// Returns an `InvalidInput` error when the bucket or the key is missing or malformed.
pub fn split_object_path(name: &str) -> StorageResult<(String, String)> {
    let trimmed = name.trim_start_matches('/');
    let (bucket, key) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    validate_bucket_name(bucket)?;
    validate_key_path(key)?;
    Ok((bucket.to_string(), key.to_string()))
}

/// Pull `items` lazily in windows of at most `chunk_size` and process each window.
///
/// No more than one window of items is alive at a time.
///
/// # Errors
///
/// Returns the first error from `process_chunk`; later windows are never pulled.
pub fn batch_in_chunks<I, R, E, F>(
    items: I,
    chunk_size: usize,
    mut process_chunk: F,
) -> Result<Vec<R>, E>
where
    I: IntoIterator,
    F: FnMut(Vec<I::Item>) -> Result<Vec<R>, E>,
{
    let chunk_size = chunk_size.max(1);
    let mut items = items.into_iter();
    let mut results = Vec::new();
    loop {
        let window: Vec<I::Item> = items.by_ref().take(chunk_size).collect();
        if window.is_empty() {
            break;
        }
        results.extend(process_chunk(window)?);
    }
    Ok(results)
}

/// Validate a bucket name.
///
/// # Errors
///
/// Returns an error if:
/// - The bucket name is empty
/// - The bucket name exceeds 255 characters
/// - The bucket name contains invalid characters (only alphanumeric, hyphens, underscores, and periods are allowed)
pub fn validate_bucket_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::new(
            ErrorKind::InvalidInput,
            "Bucket name cannot be empty",
        ));
    }

    if name.len() > 255 {
        return Err(StorageError::new(
            ErrorKind::InvalidInput,
            "Bucket name too long (max 255 characters)",
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(StorageError::new(
            ErrorKind::InvalidInput,
            format!("Bucket name {name:?} contains invalid characters"),
        ));
    }

    Ok(())
}

/// Validate an object key.
///
/// # Errors
///
/// Returns an error if:
/// - The key path is empty
/// - The key path starts with a forward slash
pub fn validate_key_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::new(
            ErrorKind::InvalidInput,
            "Key path cannot be empty",
        ));
    }

    if path.starts_with('/') {
        return Err(StorageError::new(
            ErrorKind::InvalidInput,
            "Key path cannot start with '/'",
        ));
    }

    Ok(())
}
