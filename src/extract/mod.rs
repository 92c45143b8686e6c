// src/extract/mod.rs
// =============================================================================
// Everything we read out of a fetched page.
//
// Submodules:
// - links: distinct, normalized outbound links
// - tokens: lower-cased words of the visible text
// =============================================================================

mod links;
mod tokens;

pub use links::extract_links;
pub use tokens::page_tokens;
