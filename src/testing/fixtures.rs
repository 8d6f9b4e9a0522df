//! Pre-built record batches and source files for common testing scenarios.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Sample log entry structure for testing reads and writes of real-looking data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleLogEntry {
    pub timestamp: u64,
    pub ip: String,
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Generate sample log entries.
///
/// # Example
///
/// ```
/// use chunkio::testing::sample_log_entries;
///
/// let logs = sample_log_entries();
/// assert_eq!(logs.len(), 5);
/// ```
#[must_use]
pub fn sample_log_entries() -> Vec<SampleLogEntry> {
    [
        (1_000_000, "192.168.1.100", "GET", "/api/users", 200),
        (1_000_100, "192.168.1.101", "POST", "/api/users", 201),
        (1_000_200, "192.168.1.102", "GET", "/api/posts", 200),
        (1_000_300, "192.168.1.100", "GET", "/api/users", 404),
        (1_000_400, "192.168.1.103", "DELETE", "/api/posts", 500),
    ]
    .into_iter()
    .map(|(timestamp, ip, method, path, status)| SampleLogEntry {
        timestamp,
        ip: ip.to_string(),
        method: method.to_string(),
        path: path.to_string(),
        status,
    })
    .collect()
}

/// The sample log entries as records, ready to hand to a sender.
#[must_use]
pub fn sample_log_records() -> Vec<Record> {
    sample_log_entries()
        .into_iter()
        .map(|entry| Record::new(json!(entry)))
        .collect()
}

/// An ldjson source of `count` records whose lengths vary, so that slice
/// boundaries fall both inside records and exactly on delimiters.
///
/// # Example
///
/// ```
/// use chunkio::testing::ldjson_source;
///
/// let source = ldjson_source(3, "\n");
/// assert_eq!(source.lines().count(), 3);
/// ```
#[must_use]
pub fn ldjson_source(count: usize, delimiter: &str) -> String {
    (0..count)
        .map(|i| format!("{{\"id\":{i},\"pad\":\"{}\"}}{delimiter}", "x".repeat(i % 7)))
        .collect()
}

/// A csv source with a header row followed by `count` data rows.
#[must_use]
pub fn csv_source(count: usize) -> String {
    let mut out = String::from("id,name\n");
    for i in 0..count {
        out.push_str(&format!("{i},name-{}\n", "y".repeat(i % 5)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_end_with_delimiter() {
        assert!(ldjson_source(4, "\r\n").ends_with("\r\n"));
        assert_eq!(csv_source(2).lines().count(), 3);
        assert_eq!(sample_log_records()[0].get("status"), Some(&json!(200)));
    }
}
