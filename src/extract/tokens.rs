// src/extract/tokens.rs
// =============================================================================
// Word tokens of a page's visible text, for word statistics and the
// near-duplicate fingerprint.
//
// Text inside <script>, <style> and <noscript> is skipped. A token is a run
// of word characters (`\w+`), lower-cased.
// =============================================================================

use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").expect("static regex is valid"))
}

pub fn page_tokens(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut tokens = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name));
        if hidden {
            continue;
        }

        tokens.extend(
            word_pattern()
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase()),
        );
    }

    tokens
}
