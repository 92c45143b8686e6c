// src/error.rs
// =============================================================================
// Error types shared by the crawler modules.
//
// Only two of these ever travel through the crawl loop:
// - MalformedUrl: an href we could not turn into a crawlable URL
// - Fetch: a transport failure or a non-200 response
// Both are logged and the offending URL is dropped. Neither stops a worker.
//
// The binary entry point wraps everything in anyhow::Result instead.
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("malformed URL '{href}': {reason}")]
    MalformedUrl { href: String, reason: String },

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    pub fn malformed(href: &str, reason: impl Into<String>) -> Self {
        CrawlError::MalformedUrl {
            href: href.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        CrawlError::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
