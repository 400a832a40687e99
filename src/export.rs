/// CSV serialization and download filename derivation
use crate::search_data::Suggestion;
use regex::Regex;
use std::sync::OnceLock;

/// Fallback filename used when no keyword is known.
pub const FALLBACK_FILENAME: &str = "keyword_suggestions.csv";

fn unsafe_filename_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("filename pattern compiles"))
}

/// Serialize suggestions to CSV with a `Keyword,Volume` header and CRLF line
/// endings. Keyword fields are quote-wrapped with internal quotes doubled so
/// embedded commas and quotes survive; volumes are written bare.
pub fn suggestions_to_csv(suggestions: &[Suggestion]) -> String {
    let mut csv = String::from("Keyword,Volume\r\n");

    for suggestion in suggestions {
        let keyword = suggestion.keyword.replace('"', "\"\"");
        csv.push_str(&format!("\"{}\",{}\r\n", keyword, suggestion.volume));
    }

    csv
}

/// Derive the download filename from the active keyword:
/// `suggestions_<keyword>.csv`, with characters illegal in filenames collapsed
/// to `_`. Falls back to a generic name when no usable keyword exists.
pub fn export_filename(keyword: Option<&str>) -> String {
    let Some(keyword) = keyword else {
        return FALLBACK_FILENAME.to_string();
    };

    let sanitized = unsafe_filename_chars().replace_all(keyword.trim(), "_");
    let sanitized = sanitized.trim_matches('_');
    if sanitized.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    format!("suggestions_{}.csv", sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_header_only_for_empty_list() {
        assert_eq!(suggestions_to_csv(&[]), "Keyword,Volume\r\n");
    }

    #[test]
    fn test_csv_quotes_embedded_comma() {
        let suggestions = vec![Suggestion::new("a,b", 10)];

        assert_eq!(
            suggestions_to_csv(&suggestions),
            "Keyword,Volume\r\n\"a,b\",10\r\n"
        );
    }

    #[test]
    fn test_csv_doubles_embedded_quotes() {
        let suggestions = vec![Suggestion::new("a\"b", 3)];

        assert_eq!(
            suggestions_to_csv(&suggestions),
            "Keyword,Volume\r\n\"a\"\"b\",3\r\n"
        );
    }

    #[test]
    fn test_csv_multiple_rows_keep_order() {
        let suggestions = vec![
            Suggestion::new("coffee near me", 1250),
            Suggestion::new("coffee maker", 0),
        ];

        assert_eq!(
            suggestions_to_csv(&suggestions),
            "Keyword,Volume\r\n\"coffee near me\",1250\r\n\"coffee maker\",0\r\n"
        );
    }

    #[test]
    fn test_filename_from_keyword() {
        assert_eq!(export_filename(Some("coffee")), "suggestions_coffee.csv");
    }

    #[test]
    fn test_filename_sanitizes_unsafe_chars() {
        assert_eq!(
            export_filename(Some("rust / wasm?")),
            "suggestions_rust_wasm.csv"
        );
    }

    #[test]
    fn test_filename_fallback() {
        assert_eq!(export_filename(None), FALLBACK_FILENAME);
        assert_eq!(export_filename(Some("   ")), FALLBACK_FILENAME);
        assert_eq!(export_filename(Some("///")), FALLBACK_FILENAME);
    }
}
