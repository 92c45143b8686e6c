// src/filter/admission.rs
// =============================================================================
// The static admission filter: decides whether a normalized URL is worth
// crawling at all, without looking at any crawl state.
//
// Checks run cheapest-first and stop at the first failure:
// 1. scheme is http or https
// 2. host matches one of the allowed domain patterns
// 3. path does not end in a denied (non-HTML) extension
// 4. no single path segment repeats too often (/a/b/a/b/a/b calendar loops)
// =============================================================================

use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};

/// Why a URL was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    Scheme(String),
    Domain(String),
    Extension(String),
    RepeatedSegment(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Scheme(s) => write!(f, "scheme '{}' is not http(s)", s),
            Rejection::Domain(h) => write!(f, "host '{}' is outside the allowed domains", h),
            Rejection::Extension(e) => write!(f, "'.{}' is not an HTML extension", e),
            Rejection::RepeatedSegment(s) => write!(f, "path segment '{}' repeats", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    domains: Vec<Regex>,
    denied_extensions: HashSet<String>,
    max_repeated_segments: usize,
}

impl AdmissionFilter {
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let domains = config
            .allowed_domains
            .iter()
            .map(|pattern| compile_domain_pattern(pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            domains,
            denied_extensions: config
                .denied_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_repeated_segments: config.max_repeated_segments,
        })
    }

    #[cfg(test)]
    pub fn is_admissible(&self, url: &Url) -> bool {
        self.check(url).is_ok()
    }

    /// `Ok` when the URL is admissible, otherwise which check failed.
    pub fn check(&self, url: &Url) -> std::result::Result<(), Rejection> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Rejection::Scheme(scheme.to_string()));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !self.domains.iter().any(|re| re.is_match(&host)) {
            return Err(Rejection::Domain(host));
        }

        if let Some(ext) = path_extension(url.path()) {
            if self.denied_extensions.contains(&ext) {
                return Err(Rejection::Extension(ext));
            }
        }

        if let Some(segment) = repeated_segment(url.path(), self.max_repeated_segments) {
            return Err(Rejection::RepeatedSegment(segment));
        }

        Ok(())
    }
}

// `*.ics.uci.edu` matches ics.uci.edu itself and any subdomain of it;
// a pattern without the wildcard matches only that exact host.
fn compile_domain_pattern(pattern: &str) -> Result<Regex> {
    let pattern = pattern.trim().to_ascii_lowercase();
    let source = match pattern.strip_prefix("*.") {
        Some(suffix) => format!(r"^(?:[a-z0-9-]+\.)*{}$", regex::escape(suffix)),
        None => format!("^{}$", regex::escape(&pattern)),
    };
    Regex::new(&source)
        .map_err(|e| CrawlError::Config(format!("bad domain pattern '{}': {}", pattern, e)))
}

fn path_extension(path: &str) -> Option<String> {
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn repeated_segment(path: &str, threshold: usize) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let count = counts.entry(segment).or_insert(0);
        *count += 1;
        if *count >= threshold {
            return Some(segment.to_string());
        }
    }
    None
}
