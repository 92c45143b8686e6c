// src/trap/navigator.rs
// =============================================================================
// TrapNavigator: static trap rules plus near-duplicate detection.
//
// A page is a similarity trap only when BOTH hold:
// - its URL fingerprint is near some earlier URL's fingerprint, and
// - its token fingerprint is near that same earlier page's token fingerprint
// Similar URLs alone (sibling articles) or similar text alone (shared
// boilerplate) are not enough.
//
// Pages with fewer than MIN_DISTINCT_TOKENS distinct words (image galleries,
// framesets, script-rendered shells) carry no evidence about their content,
// so they are neither compared nor recorded.
//
// Fingerprints are only ever added. Once `max_fingerprints` pages have been
// recorded the navigator stops learning new ones but keeps everything it has.
// =============================================================================

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use url::Url;

use super::rules::TrapRules;
use crate::config::CrawlConfig;
use crate::dedup::SimHash;

const MIN_DISTINCT_TOKENS: usize = 5;

/// Why the navigator flagged a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrapKind {
    /// Matched a static rule
    Known(String),
    /// URL shape and content both near an earlier page
    NearDuplicate { of: String },
}

#[derive(Debug)]
pub struct TrapNavigator {
    rules: TrapRules,
    threshold: u32,
    max_fingerprints: usize,
    url_simhash: HashMap<String, SimHash>,
    token_simhash: HashMap<String, SimHash>,
    saturated: bool,
}

impl TrapNavigator {
    pub fn new(rules: TrapRules, threshold: u32, max_fingerprints: usize) -> Self {
        Self {
            rules,
            threshold,
            max_fingerprints,
            url_simhash: HashMap::new(),
            token_simhash: HashMap::new(),
            saturated: false,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.traps.clone(),
            config.simhash_threshold,
            config.max_fingerprints,
        )
    }

    /// Static check only. Stateless, safe to call before fetching.
    pub fn is_known_trap(&self, url: &Url) -> bool {
        self.rules.matches(url)
    }

    #[cfg(test)]
    pub fn is_trap(&mut self, url: &Url, page_tokens: Option<&[String]>) -> bool {
        self.check(url, page_tokens).is_some()
    }

    /// Static rules first; with a token bag, the similarity check as well.
    /// A URL that passes with tokens is recorded for later comparisons.
    pub fn check(&mut self, url: &Url, page_tokens: Option<&[String]>) -> Option<TrapKind> {
        if let Some(rule) = self.rules.matching_rule(url) {
            return Some(TrapKind::Known(rule.to_string()));
        }

        let tokens = page_tokens?;
        if distinct_tokens(tokens) < MIN_DISTINCT_TOKENS {
            debug!(url = %url, "too little text to fingerprint");
            return None;
        }
        let url_hash = SimHash::of_url(url);
        let token_hash = SimHash::of_tokens(tokens);

        if let Some(original) = self.near_duplicate_of(&url_hash, &token_hash) {
            debug!(url = %url, original = %original, "near-duplicate page");
            return Some(TrapKind::NearDuplicate { of: original });
        }

        self.record(url.as_str(), url_hash, token_hash);
        None
    }

    fn near_duplicate_of(&self, url_hash: &SimHash, token_hash: &SimHash) -> Option<String> {
        self.url_simhash
            .iter()
            .filter(|(_, seen)| url_hash.is_near(seen, self.threshold))
            .find(|(key, _)| {
                self.token_simhash
                    .get(key.as_str())
                    .is_some_and(|seen| token_hash.is_near(seen, self.threshold))
            })
            .map(|(key, _)| key.clone())
    }

    fn record(&mut self, key: &str, url_hash: SimHash, token_hash: SimHash) {
        if self.url_simhash.contains_key(key) {
            return;
        }
        if self.url_simhash.len() >= self.max_fingerprints {
            if !self.saturated {
                warn!(
                    limit = self.max_fingerprints,
                    "fingerprint table full, no longer recording new pages"
                );
                self.saturated = true;
            }
            return;
        }
        self.url_simhash.insert(key.to_string(), url_hash);
        self.token_simhash.insert(key.to_string(), token_hash);
    }

    /// Number of pages whose fingerprints are on record
    pub fn fingerprint_count(&self) -> usize {
        self.url_simhash.len()
    }
}

fn distinct_tokens(tokens: &[String]) -> usize {
    tokens
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}
