// src/extract/links.rs
// =============================================================================
// This module pulls candidate links out of a fetched page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, so broken markup still parses
//
// Every href goes through the normalizer. Hrefs that fail to normalize
// (mailto:, javascript:, garbage) are dropped quietly.
//
// Rust concepts:
// - BTreeSet: a sorted set, so the same page always yields links in the
//   same order and duplicates collapse for free
// - Iterators: filter_map turns "maybe a URL" into "only the URLs"
// =============================================================================

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::trace;
use url::Url;

use crate::config::QueryPolicy;
use crate::filter::normalize;

// Extracts the distinct outbound links of a page
//
// Parameters:
//   page_url: the URL the page was served from (base for relative links)
//   html: the page body
//   status: HTTP status of the response; anything but 200 yields nothing
//   policy: whether query strings are part of a link's identity
//
// Example:
//   html = "<a href='/about'>About</a><a href='/about#team'>Team</a>"
//   page_url = "https://www.ics.uci.edu/"
//   result = {"https://www.ics.uci.edu/about"}
pub fn extract_links(
    page_url: &Url,
    html: &str,
    status: u16,
    policy: QueryPolicy,
) -> BTreeSet<Url> {
    if status != 200 {
        return BTreeSet::new();
    }

    let document = Html::parse_document(html);

    // Selector::parse only fails on invalid CSS, and this one is a constant
    let selector = Selector::parse("a[href]").expect("static selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| match normalize(href, page_url, policy) {
            Ok(url) => Some(url),
            Err(e) => {
                trace!(error = %e, "dropping href");
                None
            }
        })
        .collect()
}
