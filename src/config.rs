// src/config.rs
// =============================================================================
// Crawl configuration.
//
// Every knob the crawler reads lives in CrawlConfig. It can be loaded from a
// TOML file (`--config crawl.toml`); any field left out of the file falls back
// to the defaults below, and a handful of CLI flags override the file.
//
// Example file:
//
//   allowed_domains = ["*.ics.uci.edu", "*.cs.uci.edu"]
//   delay_ms = 500
//   query_policy = "retain"
//   subdomain_scope = "cs.uci.edu"
//
//   [traps]
//   prefixes = ["wiki.ics.uci.edu/doku.php"]
// =============================================================================

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CrawlError, Result};
use crate::trap::TrapRules;

/// What to do with the `?query` part of a discovered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryPolicy {
    /// Drop the query, so `?page=1` and `?page=2` are one resource
    #[default]
    Strip,
    /// Keep the query as part of the URL identity
    Retain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Domain patterns a URL's host must match, e.g. `*.ics.uci.edu`
    pub allowed_domains: Vec<String>,
    /// Path extensions (without the dot) that never point at HTML
    pub denied_extensions: Vec<String>,
    /// A path segment seen this many times marks a path trap
    pub max_repeated_segments: usize,
    /// Fingerprints closer than this many bits are near-duplicates
    pub simhash_threshold: u32,
    /// Expected number of distinct URLs for the seen-set
    pub bloom_capacity: usize,
    /// Target false-positive rate for the seen-set
    pub bloom_false_positive_rate: f64,
    /// Politeness delay between fetches, per worker
    pub delay_ms: u64,
    pub query_policy: QueryPolicy,
    /// Number of concurrent crawl workers
    pub workers: usize,
    /// Stop handing out URLs after this many pages (None = unbounded)
    pub max_pages: Option<usize>,
    /// Upper bound on recorded page fingerprints
    pub max_fingerprints: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Report page counts only for hosts under this domain ("" = every host)
    pub subdomain_scope: Option<String>,
    pub traps: TrapRules,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec![
                "*.ics.uci.edu".to_string(),
                "*.cs.uci.edu".to_string(),
                "*.informatics.uci.edu".to_string(),
                "*.stat.uci.edu".to_string(),
            ],
            denied_extensions: DEFAULT_DENIED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_repeated_segments: 3,
            simhash_threshold: 3,
            bloom_capacity: 10_000_000,
            bloom_false_positive_rate: 0.01,
            delay_ms: 500,
            query_policy: QueryPolicy::Strip,
            workers: 1,
            max_pages: None,
            max_fingerprints: 100_000,
            request_timeout_secs: 10,
            user_agent: format!("focus-crawler/{}", env!("CARGO_PKG_VERSION")),
            subdomain_scope: Some("ics.uci.edu".to_string()),
            traps: TrapRules::default(),
        }
    }
}

impl CrawlConfig {
    /// Load a config file, falling back to defaults for missing fields
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CrawlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bloom_false_positive_rate > 0.0 && self.bloom_false_positive_rate < 1.0) {
            return Err(CrawlError::Config(format!(
                "bloom_false_positive_rate must be in (0, 1), got {}",
                self.bloom_false_positive_rate
            )));
        }
        if self.bloom_capacity == 0 {
            return Err(CrawlError::Config("bloom_capacity must be positive".into()));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("workers must be at least 1".into()));
        }
        if self.max_repeated_segments < 2 {
            return Err(CrawlError::Config(
                "max_repeated_segments must be at least 2".into(),
            ));
        }
        if self.allowed_domains.is_empty() {
            return Err(CrawlError::Config("allowed_domains is empty".into()));
        }
        Ok(())
    }
}

const DEFAULT_DENIED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2",
    "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf",
    "ps", "eps", "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat",
    "exe", "bz2", "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf",
    "tgz", "sha1", "thmx", "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf",
    "wma", "zip", "rar", "gz", "ppsx", "class",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CrawlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_repeated_segments, 3);
        assert_eq!(config.simhash_threshold, 3);
        assert_eq!(config.query_policy, QueryPolicy::Strip);
        assert_eq!(config.subdomain_scope.as_deref(), Some("ics.uci.edu"));
    }

    #[test]
    fn test_subdomain_scope_from_toml() {
        let config: CrawlConfig = toml::from_str(r#"subdomain_scope = """#).unwrap();
        assert_eq!(config.subdomain_scope.as_deref(), Some(""));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_src = r#"
            delay_ms = 0
            query_policy = "retain"
            allowed_domains = ["*.example.edu"]

            [traps]
            prefixes = ["www.example.edu/calendar"]
        "#;
        let config: CrawlConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.query_policy, QueryPolicy::Retain);
        assert_eq!(config.allowed_domains, vec!["*.example.edu"]);
        assert_eq!(config.traps.prefixes, vec!["www.example.edu/calendar"]);
        // Untouched fields fall back
        assert_eq!(config.bloom_capacity, 10_000_000);
        assert!(config.denied_extensions.contains(&"pdf".to_string()));
    }

    #[test]
    fn test_rejects_bad_false_positive_rate() {
        let config = CrawlConfig {
            bloom_false_positive_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = CrawlConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
