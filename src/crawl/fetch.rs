// src/crawl/fetch.rs
// =============================================================================
// This module downloads pages for the crawl workers.
//
// The worker only cares about three things from a download:
// - the HTTP status (only 200 is crawled further)
// - the body
// - the final URL after redirects (base for relative links)
//
// Fetching sits behind the Fetcher trait so tests can swap the network for
// a scripted set of pages.
//
// Rust concepts:
// - Traits: a shared interface (like an interface in Java/TypeScript)
// - impl Future in a trait: lets the trait describe an async method
// =============================================================================

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub final_url: Url,
}

pub trait Fetcher: Send + Sync {
    /// Download `url`. Transport failures are errors; HTTP error statuses
    /// are ordinary responses with `status != 200`.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchResponse>> + Send;
}

// Fetches pages over HTTP with reqwest
//
// One Client is shared by every request so connections get pooled
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CrawlError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::fetch(url.as_str(), describe_error(&e)))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::fetch(url.as_str(), describe_error(&e)))?;

        Ok(FetchResponse {
            status,
            body,
            final_url,
        })
    }
}

// Turns a reqwest error into a short human-readable reason
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_body() || error.is_decode() {
        "could not read response body".to_string()
    } else {
        error.to_string()
    }
}
