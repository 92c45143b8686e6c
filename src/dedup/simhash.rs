// src/dedup/simhash.rs
// =============================================================================
// 64-bit simhash fingerprints for near-duplicate detection.
//
// Each feature is hashed to 64 bits; every bit votes +weight if set and
// -weight if clear, and the fingerprint keeps the bits with a positive total.
// Similar feature sets produce fingerprints a few bits apart, unrelated ones
// land about 32 bits apart.
//
// Two kinds of input:
// - URLs: character 3-grams of the URL "shape" (host + path + query with every
//   run of digits collapsed), so /events/2023-01-01 and /events/2023-01-02 look
//   the same
// - pages: the token bag, weighted by how often each token occurs, with digit
//   runs collapsed the same way so dates and counters do not move the print
// =============================================================================

use std::collections::HashMap;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimHash(pub u64);

impl SimHash {
    pub fn of_url(url: &Url) -> Self {
        let shape = url_shape(url);
        let chars: Vec<char> = shape.chars().collect();
        if chars.len() < 3 {
            return Self::from_features([(shape.as_str(), 1)]);
        }

        let grams: Vec<String> = chars.windows(3).map(|w| w.iter().collect()).collect();
        Self::from_features(grams.iter().map(|g| (g.as_str(), 1)))
    }

    pub fn of_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for token in tokens {
            let token = collapse_digits(&token.as_ref().to_lowercase());
            *counts.entry(token).or_insert(0) += 1;
        }
        Self::from_features(counts.iter().map(|(t, c)| (t.as_str(), *c)))
    }

    fn from_features<'a>(features: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let mut votes = [0i64; 64];
        for (feature, weight) in features {
            let hash = xxh3_64(feature.as_bytes());
            for (bit, vote) in votes.iter_mut().enumerate() {
                if hash & (1u64 << bit) != 0 {
                    *vote += weight;
                } else {
                    *vote -= weight;
                }
            }
        }

        let mut fingerprint = 0u64;
        for (bit, vote) in votes.iter().enumerate() {
            if *vote > 0 {
                fingerprint |= 1u64 << bit;
            }
        }
        SimHash(fingerprint)
    }

    pub fn hamming_distance(&self, other: &SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Near-duplicate when strictly fewer than `threshold` bits differ
    pub fn is_near(&self, other: &SimHash, threshold: u32) -> bool {
        self.hamming_distance(other) < threshold
    }
}

fn url_shape(url: &Url) -> String {
    let mut raw = String::new();
    raw.push_str(url.host_str().unwrap_or_default());
    raw.push_str(url.path());
    if let Some(query) = url.query() {
        raw.push('?');
        raw.push_str(query);
    }
    collapse_digits(&raw)
}

// Every run of ASCII digits becomes a single '0'
fn collapse_digits(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_digits = false;
    for c in raw.chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                out.push('0');
            }
            in_digits = true;
        } else {
            out.push(c);
            in_digits = false;
        }
    }
    out
}
