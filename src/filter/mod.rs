// src/filter/mod.rs
// =============================================================================
// URL canonicalization and the static admission filter.
//
// Submodules:
// - normalize: raw href -> absolute, fragment-free URL
// - admission: pure yes/no decision on a normalized URL
// =============================================================================

mod admission;
mod normalize;

pub use admission::{AdmissionFilter, Rejection};
pub use normalize::{normalize, normalize_absolute};
