/// Suggestion endpoint URL building and tolerant response decoding
use crate::search_data::Suggestion;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Public autocomplete endpoint. `client=chrome` makes the service include
/// relevance scores, which we surface as volume estimates.
pub const SUGGEST_ENDPOINT: &str = "http://suggestqueries.google.com/complete/search";

/// Key under which the endpoint reports relevance scores, parallel to the
/// suggestion list.
const RELEVANCE_KEY: &str = "google:suggestrelevance";

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    Shape(&'static str),
}

/// Build the GET URL for a keyword, percent-encoding the query value.
pub fn suggest_url(keyword: &str) -> String {
    let mut url = Url::parse(SUGGEST_ENDPOINT).expect("endpoint constant parses");
    url.query_pairs_mut()
        .append_pair("client", "chrome")
        .append_pair("q", keyword);
    url.into()
}

/// Decode the endpoint's loosely-structured response body.
///
/// The declared content type is not strict JSON, but the body is a
/// JSON-array-shaped text:
/// `[query, [suggestions...], [descriptions...], [...], {"google:suggestrelevance": [scores...], ...}]`
///
/// Index 1 must be present and an array; its string entries become suggestion
/// keywords (non-string entries are skipped without shifting score positions).
/// Index 4 is optional; when it is an object carrying a relevance array, the
/// scores are zipped in positionally. A missing score defaults to 0.
pub fn decode_suggestions(body: &str) -> Result<Vec<Suggestion>, SuggestError> {
    let parsed: Value = serde_json::from_str(body)?;

    let root = parsed
        .as_array()
        .ok_or(SuggestError::Shape("root is not an array"))?;

    let strings = root
        .get(1)
        .and_then(Value::as_array)
        .ok_or(SuggestError::Shape("missing suggestion list at index 1"))?;

    let scores = root
        .get(4)
        .and_then(Value::as_object)
        .and_then(|meta| meta.get(RELEVANCE_KEY))
        .and_then(Value::as_array);

    let suggestions = strings
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let keyword = entry.as_str()?;
            let volume = scores
                .and_then(|s| s.get(i))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Some(Suggestion::new(keyword, volume))
        })
        .collect();

    Ok(suggestions)
}
