// src/filter/normalize.rs
// =============================================================================
// Turns a raw href into the canonical URL the rest of the crawler compares.
//
// Steps:
// 1. Resolve the href against the page it was found on
// 2. Drop the #fragment (always)
// 3. Drop the ?query (only under QueryPolicy::Strip)
//
// The `url` crate already lower-cases the host of http/https URLs while
// leaving the path untouched, so step 4 of canonicalization comes for free.
// =============================================================================

use url::Url;

use crate::config::QueryPolicy;
use crate::error::{CrawlError, Result};

/// Canonicalize `raw` relative to `base`.
///
/// Fails with `MalformedUrl` for empty hrefs, pseudo-schemes such as
/// `javascript:` and `mailto:`, and anything the URL parser refuses.
pub fn normalize(raw: &str, base: &Url, policy: QueryPolicy) -> Result<Url> {
    let href = raw.trim();
    if href.is_empty() {
        return Err(CrawlError::malformed(raw, "empty href"));
    }

    let mut url = base
        .join(href)
        .map_err(|e| CrawlError::malformed(raw, e.to_string()))?;

    // mailto:, javascript:, tel:, data: ... have no hierarchical path
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(CrawlError::malformed(raw, "not a hierarchical URL"));
    }

    url.set_fragment(None);
    if policy == QueryPolicy::Strip {
        url.set_query(None);
    }

    Ok(url)
}

/// Parse an absolute URL (a seed, or a `check` argument) the same way.
pub fn normalize_absolute(raw: &str, policy: QueryPolicy) -> Result<Url> {
    let parsed = Url::parse(raw.trim()).map_err(|e| CrawlError::malformed(raw, e.to_string()))?;
    normalize(parsed.as_str(), &parsed, policy)
}
