// src/trap/mod.rs
// =============================================================================
// Crawler-trap detection.
//
// Submodules:
// - rules: the static prefix/suffix/substring lists (plain data)
// - navigator: TrapNavigator, static rules + simhash near-duplicate memory
// =============================================================================

mod navigator;
mod rules;

pub use navigator::{TrapKind, TrapNavigator};
pub use rules::TrapRules;
