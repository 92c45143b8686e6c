// src/trap/rules.rs
// =============================================================================
// Static trap rules, kept as data so new traps can go in the config file.
//
// Every rule is matched against the scheme-less `host + path` form of a URL,
// e.g. "wiki.ics.uci.edu/doku.php", so http and https share one entry.
// =============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapRules {
    /// Dead-end areas: calendars, wikis with endless revisions, login walls
    pub prefixes: Vec<String>,
    /// Non-content endings such as e-mail addresses written as links
    pub suffixes: Vec<String>,
    /// Loop signatures that can show up anywhere in the path
    pub substrings: Vec<String>,
}

impl Default for TrapRules {
    fn default() -> Self {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            prefixes: owned(&[
                "wiki.ics.uci.edu/doku.php",
                "www.informatics.uci.edu/files/pdf/InformaticsBrochure-March2018",
                "www.ics.uci.edu/ugrad/current/policies/index.php",
                "www.ics.uci.edu/ugrad/policies",
                "www.ics.uci.edu/about/brenhall/index.php/",
                "www.ics.uci.edu/brenhall/brenhall",
                "www.stat.uci.edu/damonbayer/uci_covid19_dashboard",
                "wics.ics.uci.edu/events/202",
                "archive.ics.uci.edu/ml/datasets/datasets/",
                "www.ics.uci.edu/honors/honors/",
                "www.ics.uci.edu/ugrad/honors/index.php",
            ]),
            suffixes: owned(&["@uci.edu", "@ics.uci.edu", "@gmail.com", "void(0)"]),
            substrings: owned(&[
                "datasets/datasets/",
                "uci_covid19_dashboard/blob",
                "brenhall/brenhall",
            ]),
        }
    }
}

impl TrapRules {
    /// Returns the first rule `url` trips, if any.
    pub fn matching_rule(&self, url: &Url) -> Option<&str> {
        let key = format!("{}{}", url.host_str().unwrap_or_default(), url.path());

        self.prefixes
            .iter()
            .find(|p| key.starts_with(p.as_str()))
            .or_else(|| self.suffixes.iter().find(|s| key.ends_with(s.as_str())))
            .or_else(|| self.substrings.iter().find(|s| key.contains(s.as_str())))
            .map(String::as_str)
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.matching_rule(url).is_some()
    }
}
