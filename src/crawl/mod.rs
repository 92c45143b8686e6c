// src/crawl/mod.rs
// =============================================================================
// This module runs the crawl.
//
// Submodules:
// - frontier: the shared work queue
// - fetch: downloading pages (reqwest, or a test double)
// - pipeline: seen-set + admission filter + trap rules for new links
// - stats: the results sink the workers report into, saved and resumed as JSON
// - worker: the crawl loop and the multi-worker driver
//
// Features:
// - Breadth-first crawling from a single seed
// - Only allowed domains are followed
// - Bounded-memory dedup of scheduled URLs
// - Static and near-duplicate crawler-trap detection
// - Polite crawling with a fixed delay between requests
// =============================================================================

mod fetch;
mod frontier;
mod pipeline;
mod stats;
mod worker;

pub use fetch::HttpFetcher;
pub use pipeline::{AdmissionPipeline, Verdict};
pub use stats::{CrawlStats, StatsReport};
pub use worker::{run_crawl, CrawlSummary};
