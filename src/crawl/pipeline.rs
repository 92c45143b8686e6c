// src/crawl/pipeline.rs
// =============================================================================
// The admission pipeline every discovered link goes through:
//
//   seen-set -> admission filter -> trap rules -> frontier
//
// Cheapest and most decisive checks run first; the simhash comparison, which
// grows with the number of recorded pages, only runs on fetched pages.
//
// One pipeline is shared by all workers. The seen-set lock is held from the
// membership check until the URL is in the frontier and marked seen, so two
// workers can never both schedule the same link, and a URL is never marked
// seen without being scheduled.
// =============================================================================

use parking_lot::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::frontier::Frontier;
use crate::config::CrawlConfig;
use crate::dedup::SeenSet;
use crate::error::Result;
use crate::filter::{AdmissionFilter, Rejection};
use crate::trap::{TrapKind, TrapNavigator};

/// Outcome of offering a link to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Scheduled,
    Seen,
    Rejected(Rejection),
    Trap(TrapKind),
}

#[derive(Debug)]
pub struct AdmissionPipeline {
    filter: AdmissionFilter,
    seen: Mutex<SeenSet>,
    traps: Mutex<TrapNavigator>,
}

impl AdmissionPipeline {
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let seen = SeenSet::new(config.bloom_capacity, config.bloom_false_positive_rate);
        debug!(
            bits = seen.num_bits(),
            hashes = seen.num_hashes(),
            "seen-set sized"
        );
        Ok(Self {
            filter: AdmissionFilter::from_config(config)?,
            seen: Mutex::new(seen),
            traps: Mutex::new(TrapNavigator::from_config(config)),
        })
    }

    /// Schedule the crawl's starting point. Seeds skip the admission filter.
    pub fn seed<F: Frontier>(&self, url: Url, frontier: &F) {
        let mut seen = self.seen.lock();
        if seen.contains(url.as_str()) {
            return;
        }
        if let Err(reason) = self.filter.check(&url) {
            warn!(url = %url, %reason, "seed is outside the admission rules");
        }
        let key = url.to_string();
        frontier.add_url(url);
        seen.add(&key);
    }

    /// Run one candidate link through the pipeline, scheduling it if it survives.
    pub fn offer<F: Frontier>(&self, candidate: Url, frontier: &F) -> Verdict {
        let mut seen = self.seen.lock();
        if seen.contains(candidate.as_str()) {
            return Verdict::Seen;
        }
        let verdict = self.screen(&candidate);
        if verdict != Verdict::Scheduled {
            debug!(url = %candidate, ?verdict, "link not scheduled");
            return verdict;
        }

        let key = candidate.to_string();
        frontier.add_url(candidate);
        seen.add(&key);
        Verdict::Scheduled
    }

    /// What `offer` would decide, without touching the seen-set or frontier.
    pub fn explain(&self, url: &Url) -> Verdict {
        if self.seen.lock().contains(url.as_str()) {
            return Verdict::Seen;
        }
        self.screen(url)
    }

    /// Admission filter and static trap rules, ignoring the seen-set.
    /// `Scheduled` means the URL passes both.
    pub fn screen(&self, url: &Url) -> Verdict {
        if let Err(rejection) = self.filter.check(url) {
            return Verdict::Rejected(rejection);
        }
        // Candidates have no page of their own yet, so only the static rules apply
        if let Some(kind) = self.traps.lock().check(url, None) {
            return Verdict::Trap(kind);
        }
        Verdict::Scheduled
    }

    pub fn is_known_trap(&self, url: &Url) -> bool {
        self.traps.lock().is_known_trap(url)
    }

    /// Similarity check for a fetched page; records it when it is not a trap.
    pub fn check_page(&self, url: &Url, tokens: &[String]) -> Option<TrapKind> {
        self.traps.lock().check(url, Some(tokens))
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Fraction of seen-set bits set; near 0.5 the filter is at capacity
    pub fn seen_fill_ratio(&self) -> f64 {
        self.seen.lock().fill_ratio()
    }

    pub fn fingerprint_count(&self) -> usize {
        self.traps.lock().fingerprint_count()
    }
}
