//! Destination file names.
//!
//! `<base>/<id>[.<slice>][<suffix>]`, where the suffix is the configured
//! `extension` or, by default, `.<format>` (nothing for raw) followed by the
//! compression extension.

use crate::config::{Format, SenderConfig};

/// Suffix appended to every file name of `config`.
#[must_use]
pub fn file_suffix(config: &SenderConfig) -> String {
    if let Some(extension) = &config.extension {
        if extension.is_empty() || extension.starts_with('.') {
            return extension.clone();
        }
        return format!(".{extension}");
    }
    let mut suffix = String::new();
    if config.format != Format::Raw {
        suffix.push('.');
        suffix.push_str(config.format.as_str());
    }
    if let Some(ext) = config.compression.extension() {
        suffix.push_str(ext);
    }
    suffix
}

/// `<base>/<route>`, the base path of a dynamically routed record.
#[must_use]
pub fn route_path(base: &str, route: &str) -> String {
    let route = route.trim_matches('/');
    if route.is_empty() {
        return base.to_string();
    }
    format!("{}/{route}", base.trim_end_matches('/'))
}

/// Full destination name for one payload.
///
/// `slice` is present exactly when the sender writes one file per slice.
#[must_use]
pub fn destination_name(base: &str, config: &SenderConfig, slice: Option<u64>) -> String {
    let mut name = format!("{}/{}", base.trim_end_matches('/'), config.id);
    if let Some(slice) = slice {
        name.push_str(&format!(".{slice}"));
    }
    name.push_str(&file_suffix(config));
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Compression;

    #[test]
    fn derived_suffixes() {
        let mut config = SenderConfig::new("/out", "w", Format::Ldjson);
        assert_eq!(file_suffix(&config), ".ldjson");
        config.format = Format::Raw;
        assert_eq!(file_suffix(&config), "");
        config.compression = Compression::Gzip;
        assert_eq!(file_suffix(&config), ".gz");
        config.format = Format::Csv;
        config.compression = Compression::Lz4;
        assert_eq!(file_suffix(&config), ".csv.lz4");
    }

    #[test]
    fn extension_override() {
        let mut config = SenderConfig::new("/out", "w", Format::Ldjson);
        config.extension = Some("txt".into());
        assert_eq!(file_suffix(&config), ".txt");
        config.extension = Some(".json".into());
        assert_eq!(file_suffix(&config), ".json");
        config.extension = Some(String::new());
        assert_eq!(destination_name("/out/", &config, None), "/out/w");
    }

    #[test]
    fn per_slice_names_carry_the_counter() {
        let mut config = SenderConfig::new("/out", "worker-1", Format::Csv);
        config.file_per_slice = true;
        assert_eq!(
            destination_name("/out", &config, Some(3)),
            "/out/worker-1.3.csv"
        );
    }

    #[test]
    fn routes_nest_under_base() {
        assert_eq!(route_path("/out/", "r1"), "/out/r1");
        assert_eq!(route_path("bucket/p", "/a/b/"), "bucket/p/a/b");
        assert_eq!(route_path("/out", ""), "/out");
    }
}
