// src/crawl/stats.rs
// =============================================================================
// Crawl statistics.
//
// Workers report into a ResultsSink and never read it back. CrawlStats is the
// in-memory sink the CLI uses; it keeps:
// - the set of unique pages crawled
// - word frequencies (stopwords excluded)
// - how many pages each subdomain served
// - the longest page, measured in tokens
//
// A long crawl can be stopped and picked up again: the CLI writes a
// StatsSnapshot as JSON at the end and seeds a new CrawlStats from it on
// the next run.
// =============================================================================

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use url::Url;

use crate::error::Result;

/// Reporting hooks the crawl workers call. Fire-and-forget.
pub trait ResultsSink: Send + Sync {
    fn record_tokens(&self, tokens: &[String]);
    fn record_page_length(&self, url: &Url, length: usize);
    fn record_subdomain(&self, host: &str);
    fn record_unique_page(&self, url: &Url);
}

#[derive(Debug, Default)]
struct StatsInner {
    unique_pages: HashSet<String>,
    words: HashMap<String, usize>,
    subdomains: HashMap<String, usize>,
    longest: Option<LongestPage>,
}

#[derive(Debug, Default)]
pub struct CrawlStats {
    inner: Mutex<StatsInner>,
    subdomain_scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Count {
    pub key: String,
    pub count: usize,
}

/// Snapshot of the statistics, sorted for display.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    pub top_words: Vec<Count>,
    pub subdomains: Vec<Count>,
}

/// Everything CrawlStats has accumulated, in a stable on-disk form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    pub unique_pages: BTreeSet<String>,
    pub words: BTreeMap<String, usize>,
    pub subdomains: BTreeMap<String, usize>,
    pub longest_page: Option<LongestPage>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only count hosts equal to or under `scope`. None or "" counts every host.
    pub fn with_subdomain_scope(mut self, scope: Option<String>) -> Self {
        self.subdomain_scope = scope
            .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn from_snapshot(snapshot: StatsSnapshot) -> Self {
        let inner = StatsInner {
            unique_pages: snapshot.unique_pages.into_iter().collect(),
            words: snapshot.words.into_iter().collect(),
            subdomains: snapshot.subdomains.into_iter().collect(),
            longest: snapshot.longest_page,
        };
        Self {
            inner: Mutex::new(inner),
            subdomain_scope: None,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            unique_pages: inner.unique_pages.iter().cloned().collect(),
            words: inner.words.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            subdomains: inner.subdomains.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            longest_page: inner.longest.clone(),
        }
    }

    /// Resume from statistics saved by an earlier run
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: StatsSnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the statistics as pretty JSON, replacing `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        // Replace atomically: write a sibling file, then rename over the target
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn in_scope(&self, host: &str) -> bool {
        match &self.subdomain_scope {
            None => true,
            Some(scope) => {
                host == scope.as_str()
                    || host
                        .strip_suffix(scope.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
        }
    }

    #[cfg(test)]
    pub fn unique_pages(&self) -> usize {
        self.inner.lock().unique_pages.len()
    }

    #[cfg(test)]
    pub fn word_count(&self, word: &str) -> usize {
        self.inner.lock().words.get(word).copied().unwrap_or(0)
    }

    /// `top_words` most frequent words; subdomains are listed in full
    pub fn report(&self, top_words: usize) -> StatsReport {
        let inner = self.inner.lock();
        let mut words = sorted_counts(&inner.words);
        words.truncate(top_words);

        StatsReport {
            unique_pages: inner.unique_pages.len(),
            longest_page: inner.longest.clone(),
            top_words: words,
            subdomains: sorted_counts(&inner.subdomains),
        }
    }
}

impl ResultsSink for CrawlStats {
    fn record_tokens(&self, tokens: &[String]) {
        let mut inner = self.inner.lock();
        for token in tokens {
            let word = token.to_lowercase();
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            *inner.words.entry(word).or_insert(0) += 1;
        }
    }

    fn record_page_length(&self, url: &Url, length: usize) {
        let mut inner = self.inner.lock();
        let longer = inner.longest.as_ref().map_or(true, |l| length > l.tokens);
        if longer {
            inner.longest = Some(LongestPage {
                url: url.to_string(),
                tokens: length,
            });
        }
    }

    fn record_subdomain(&self, host: &str) {
        let host = host.to_ascii_lowercase();
        if !self.in_scope(&host) {
            return;
        }
        *self.inner.lock().subdomains.entry(host).or_insert(0) += 1;
    }

    fn record_unique_page(&self, url: &Url) {
        let mut page = url.clone();
        page.set_fragment(None);
        self.inner.lock().unique_pages.insert(page.into());
    }
}

// Highest count first, ties broken alphabetically
fn sorted_counts(map: &HashMap<String, usize>) -> Vec<Count> {
    let mut counts: Vec<Count> = map
        .iter()
        .map(|(key, count)| Count {
            key: key.clone(),
            count: *count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    counts
}

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's",
    "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own",
    "same", "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some",
    "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
    "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we",
    "we'd", "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's",
    "where", "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with",
    "won't", "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your",
    "yours", "yourself", "yourselves",
];
