/// Runtime message envelope shared by the three extension contexts
use crate::search_data::{SearchData, Suggestion};
use serde::{Deserialize, Serialize};

/// Messages sent through `chrome.runtime.sendMessage`, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum Request {
    /// Watcher -> Fetcher, fire-and-forget.
    #[serde(rename = "fetchRealtimeSuggestions")]
    FetchRealtimeSuggestions { keyword: String },

    /// Popup -> Fetcher; the reply is the current SearchData or `{}`.
    #[serde(rename = "getSuggestions")]
    GetSuggestions,
}

impl Request {
    /// Whether the background listener must keep the response channel open.
    pub fn needs_response(&self) -> bool {
        matches!(self, Request::GetSuggestions)
    }
}

/// Reply shape for `getSuggestions`. The background answers with either the
/// full SearchData record or an empty object when no search happened yet, so
/// every field is tolerated as absent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SuggestionsReply {
    pub keyword: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(rename = "isLoading", default)]
    pub is_loading: bool,
}

impl SuggestionsReply {
    /// `None` when the reply was the no-search-yet empty object.
    pub fn into_search_data(self) -> Option<SearchData> {
        let keyword = self.keyword?;
        Some(SearchData {
            keyword,
            suggestions: self.suggestions,
            is_loading: self.is_loading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_wire_shape() {
        let request = Request::FetchRealtimeSuggestions {
            keyword: "coffee".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();

        assert_eq!(
            json,
            r#"{"action":"fetchRealtimeSuggestions","keyword":"coffee"}"#
        );
    }

    #[test]
    fn test_get_suggestions_wire_shape() {
        let json = serde_json::to_string(&Request::GetSuggestions).unwrap();
        assert_eq!(json, r#"{"action":"getSuggestions"}"#);
    }

    #[test]
    fn test_request_decode() {
        let request: Request =
            serde_json::from_str(r#"{"action":"fetchRealtimeSuggestions","keyword":"tea"}"#)
                .unwrap();

        assert_eq!(
            request,
            Request::FetchRealtimeSuggestions {
                keyword: "tea".to_string()
            }
        );
        assert!(!request.needs_response());
        assert!(Request::GetSuggestions.needs_response());
    }

    #[test]
    fn test_unknown_action_fails_to_decode() {
        let result: Result<Request, _> = serde_json::from_str(r#"{"action":"somethingElse"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_reply_means_no_search() {
        let reply: SuggestionsReply = serde_json::from_str("{}").unwrap();
        assert!(reply.into_search_data().is_none());
    }

    #[test]
    fn test_full_reply_becomes_search_data() {
        let reply: SuggestionsReply = serde_json::from_str(
            r#"{"keyword":"coffee","suggestions":[{"keyword":"coffee shop","volume":7}],"isLoading":false}"#,
        )
        .unwrap();

        let data = reply.into_search_data().unwrap();

        assert_eq!(data.keyword, "coffee");
        assert_eq!(data.suggestions, vec![Suggestion::new("coffee shop", 7)]);
        assert!(!data.is_loading);
    }
}
