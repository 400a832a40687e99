/// Data structures for Keyword Lens
use serde::{Deserialize, Serialize};

/// One suggested query term with its relevance score, used as a volume estimate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub keyword: String,
    pub volume: u64,
}

impl Suggestion {
    pub fn new(keyword: impl Into<String>, volume: u64) -> Suggestion {
        Suggestion {
            keyword: keyword.into(),
            volume,
        }
    }
}

/// The single record shared through session storage.
///
/// Owned by the background context; the content script and popup only read it.
/// Field names stay camelCase on the wire so all three contexts agree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub keyword: String,
    pub suggestions: Vec<Suggestion>,
    pub is_loading: bool,
}

impl SearchData {
    /// Placeholder written before the fetch starts.
    pub fn loading(keyword: impl Into<String>) -> SearchData {
        SearchData {
            keyword: keyword.into(),
            suggestions: Vec::new(),
            is_loading: true,
        }
    }

    /// Final record once the fetch resolved for the still-current keyword.
    pub fn completed(keyword: impl Into<String>, suggestions: Vec<Suggestion>) -> SearchData {
        SearchData {
            keyword: keyword.into(),
            suggestions,
            is_loading: false,
        }
    }

    /// Record written when the fetch failed; keyword preserved, list cleared.
    pub fn failed(keyword: impl Into<String>) -> SearchData {
        SearchData {
            keyword: keyword.into(),
            suggestions: Vec::new(),
            is_loading: false,
        }
    }
}

/// Format a volume with thousands separators, e.g. 1234567 -> "1,234,567"
pub fn format_volume(volume: u64) -> String {
    let digits = volume.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
