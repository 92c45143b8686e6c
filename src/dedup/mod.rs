// src/dedup/mod.rs
// =============================================================================
// Probabilistic structures for deduplication.
//
// - bloom: SeenSet, the bounded-memory "already scheduled" set
// - simhash: locality-sensitive fingerprints for near-duplicate pages
// =============================================================================

mod bloom;
mod simhash;

pub use bloom::SeenSet;
pub use simhash::SimHash;
