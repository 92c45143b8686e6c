// src/dedup/bloom.rs
// =============================================================================
// The seen-set: a fixed-size bloom filter remembering every URL the crawler
// has scheduled.
//
// Sizing for `capacity` items at false-positive rate `eps`:
//   m = ceil(-capacity * ln(eps) / ln(2)^2)   bits
//   k = round(m / capacity * ln(2))           hash functions
//
// A lookup can wrongly answer "seen" (about eps of the time once the filter
// holds `capacity` URLs) but never wrongly answers "not seen".
// Bits are only ever set, never cleared.
// =============================================================================

use xxhash_rust::xxh3::xxh3_64_with_seed;

#[derive(Debug, Clone)]
pub struct SeenSet {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: usize,
    inserted: usize,
}

impl SeenSet {
    /// Size a filter for `capacity` URLs at `false_positive_rate`.
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        let n = capacity.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;
        let m = (-n * false_positive_rate.ln() / (ln2 * ln2)).ceil() as usize;
        let num_bits = m.max(64);
        let k = ((num_bits as f64 / n) * ln2).round() as usize;
        Self::with_params(num_bits, k.max(1))
    }

    pub fn with_params(num_bits: usize, num_hashes: usize) -> Self {
        let num_bits = num_bits.max(1);
        Self {
            bits: vec![0u64; num_bits.div_ceil(64)],
            num_bits,
            num_hashes: num_hashes.max(1),
            inserted: 0,
        }
    }

    pub fn add(&mut self, url: &str) {
        for seed in 0..self.num_hashes {
            let idx = self.bit_index(url, seed);
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
        self.inserted += 1;
    }

    /// True if `url` was probably added before, false if it definitely was not.
    pub fn contains(&self, url: &str) -> bool {
        (0..self.num_hashes).all(|seed| {
            let idx = self.bit_index(url, seed);
            self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
        })
    }

    fn bit_index(&self, url: &str, seed: usize) -> usize {
        (xxh3_64_with_seed(url.as_bytes(), seed as u64) % self.num_bits as u64) as usize
    }

    /// Number of `add` calls so far (repeats included)
    pub fn len(&self) -> usize {
        self.inserted
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Fraction of bits set
    pub fn fill_ratio(&self) -> f64 {
        let set: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        set as f64 / self.num_bits as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_formula() {
        let set = SeenSet::new(1000, 0.01);
        assert_eq!(set.num_bits(), 9586);
        assert_eq!(set.num_hashes(), 7);
        assert!(set.is_empty());
    }

    #[test]
    fn test_no_false_negatives() {
        let mut set = SeenSet::new(5_000, 0.01);
        let urls: Vec<String> = (0..5_000)
            .map(|i| format!("https://www.ics.uci.edu/page/{}", i))
            .collect();

        for (i, url) in urls.iter().enumerate() {
            set.add(url);
            assert!(set.contains(url));
            // Everything added earlier is still there
            assert!(set.contains(&urls[i / 2]));
        }
        assert!(urls.iter().all(|u| set.contains(u)));
        assert_eq!(set.len(), 5_000);
    }

    #[test]
    fn test_false_positive_rate_within_tolerance() {
        let capacity = 10_000;
        let eps = 0.01;
        let mut set = SeenSet::new(capacity, eps);
        for i in 0..capacity {
            set.add(&format!("https://www.ics.uci.edu/seen/{}", i));
        }

        let trials = 20_000;
        let false_positives = (0..trials)
            .filter(|i| set.contains(&format!("https://www.cs.uci.edu/novel/{}", i)))
            .count();
        let rate = false_positives as f64 / trials as f64;
        assert!(rate <= eps * 2.0, "false positive rate {} too high", rate);
    }

    #[test]
    fn test_empty_set_contains_nothing() {
        let set = SeenSet::new(100, 0.01);
        assert!(!set.contains("https://www.ics.uci.edu/"));
        assert_eq!(set.fill_ratio(), 0.0);
    }

    #[test]
    fn test_add_is_idempotent_on_bits() {
        let mut set = SeenSet::new(100, 0.01);
        set.add("https://www.ics.uci.edu/a");
        let ratio = set.fill_ratio();
        set.add("https://www.ics.uci.edu/a");
        assert_eq!(set.fill_ratio(), ratio);
    }
}
