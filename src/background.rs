/// Background service worker: owns the searchData record and fetches
/// suggestions from the remote autocomplete endpoint

use crate::messages::Request;
use crate::search_data::{SearchData, Suggestion};
use crate::storage::{self, SEARCH_DATA_KEY};
use crate::suggest::{self, SuggestError};
use js_sys::Reflect;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getSessionStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSessionStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn fetchText(url: &str) -> Result<JsValue, JsValue>;
}

/// How long fetched suggestions stay reusable without a new request.
const CACHE_TTL_MS: f64 = 3_600_000.0;
/// Bounded so an idle-but-alive service worker cannot grow without limit.
const CACHE_CAPACITY: usize = 64;

struct CacheEntry {
    keyword: String,
    suggestions: Vec<Suggestion>,
    stored_at: f64,
}

/// Per-keyword suggestion cache, alive only for the service worker's
/// lifetime. Session storage still holds nothing but the single
/// searchData record.
#[derive(Default)]
struct SuggestionCache {
    entries: Vec<CacheEntry>,
}

impl SuggestionCache {
    fn get(&mut self, keyword: &str, now: f64) -> Option<Vec<Suggestion>> {
        self.entries.retain(|e| now - e.stored_at < CACHE_TTL_MS);
        self.entries
            .iter()
            .find(|e| e.keyword == keyword)
            .map(|e| e.suggestions.clone())
    }

    fn insert(&mut self, keyword: String, suggestions: Vec<Suggestion>, now: f64) {
        self.entries.retain(|e| e.keyword != keyword);
        if self.entries.len() >= CACHE_CAPACITY {
            // Oldest entry sits at the front
            self.entries.remove(0);
        }
        self.entries.push(CacheEntry {
            keyword,
            suggestions,
            stored_at: now,
        });
    }
}

thread_local! {
    static CACHE: RefCell<SuggestionCache> = RefCell::new(SuggestionCache::default());
}

/// A fetch result may only be committed if the stored keyword still equals
/// the keyword it was issued for; late responses for an abandoned keyword
/// are dropped.
fn commit_allowed(fetched_for: &str, current: Option<&SearchData>) -> bool {
    current.is_some_and(|data| data.keyword == fetched_for)
}

/// Register the runtime message listener. Called once from the service
/// worker entry point.
pub fn start() {
    let callback = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| -> JsValue {
            let request: Request = match serde_wasm_bindgen::from_value(message) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Ignoring undecodable runtime message: {:?}", e);
                    return JsValue::FALSE;
                }
            };

            // getSuggestions responds asynchronously, so its channel must
            // stay open; fetchRealtimeSuggestions is fire-and-forget.
            let keep_channel_open = request.needs_response();
            spawn_local(handle_request(request, send_response));
            JsValue::from_bool(keep_channel_open)
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>);

    if let Err(e) = add_on_message_listener(&callback) {
        log::error!("Failed to register message listener: {:?}", e);
    }

    // The listener lives for the service worker's lifetime
    callback.forget();
}

/// chrome.runtime.onMessage.addListener(callback)
fn add_on_message_listener(
    callback: &Closure<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>,
) -> Result<(), JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &"chrome".into())?;
    let runtime = Reflect::get(&chrome, &"runtime".into())?;
    let on_message = Reflect::get(&runtime, &"onMessage".into())?;
    let add_listener: js_sys::Function =
        Reflect::get(&on_message, &"addListener".into())?.unchecked_into();
    add_listener.call1(&on_message, callback.as_ref())?;
    Ok(())
}

async fn handle_request(request: Request, send_response: js_sys::Function) {
    match request {
        Request::GetSuggestions => {
            let reply = match read_search_data().await {
                Ok(Some(data)) => {
                    storage::encode_search_data(&data).unwrap_or_else(|e| {
                        log::error!("{}", e);
                        js_sys::Object::new().into()
                    })
                }
                Ok(None) => js_sys::Object::new().into(),
                Err(e) => {
                    log::error!("Failed to read searchData: {}", e);
                    js_sys::Object::new().into()
                }
            };
            if let Err(e) = send_response.call1(&JsValue::UNDEFINED, &reply) {
                log::warn!("Popup went away before the reply: {:?}", e);
            }
        }
        Request::FetchRealtimeSuggestions { keyword } => {
            if let Err(e) = on_keyword_submitted(&keyword).await {
                log::error!("Keyword submission {:?} failed: {}", keyword, e);
            }
        }
    }
}

/// Handle a debounced keyword from the content script. An unchanged keyword
/// is a no-op; otherwise write the loading placeholder, fetch, and commit
/// behind the stale-response guard.
async fn on_keyword_submitted(keyword: &str) -> Result<(), String> {
    let current = read_search_data().await?;
    if current.as_ref().is_some_and(|data| data.keyword == keyword) {
        return Ok(());
    }

    write_search_data(&SearchData::loading(keyword)).await?;

    match fetch_suggestions(keyword).await {
        Ok(suggestions) => {
            let current = read_search_data().await?;
            if commit_allowed(keyword, current.as_ref()) {
                write_search_data(&SearchData::completed(keyword, suggestions)).await?;
            } else {
                log::debug!("Dropping stale suggestions for {:?}", keyword);
            }
        }
        Err(e) => {
            log::error!("Suggestion fetch for {:?} failed: {}", keyword, e);
            // Clear the list but keep whatever keyword is current
            let keyword = read_search_data()
                .await?
                .map(|data| data.keyword)
                .unwrap_or_else(|| keyword.to_string());
            write_search_data(&SearchData::failed(keyword)).await?;
        }
    }

    Ok(())
}

async fn fetch_suggestions(keyword: &str) -> Result<Vec<Suggestion>, SuggestError> {
    let now = js_sys::Date::now();
    if let Some(hit) = CACHE.with(|cache| cache.borrow_mut().get(keyword, now)) {
        log::debug!("Suggestion cache hit for {:?}", keyword);
        return Ok(hit);
    }

    let body = fetchText(&suggest::suggest_url(keyword))
        .await
        .map_err(|e| SuggestError::Transport(format!("{:?}", e)))?;
    let body = body
        .as_string()
        .ok_or(SuggestError::Shape("response body is not text"))?;

    let suggestions = suggest::decode_suggestions(&body)?;

    CACHE.with(|cache| {
        cache
            .borrow_mut()
            .insert(keyword.to_string(), suggestions.clone(), js_sys::Date::now())
    });

    Ok(suggestions)
}

async fn read_search_data() -> Result<Option<SearchData>, String> {
    let value = getSessionStorage(SEARCH_DATA_KEY)
        .await
        .map_err(|e| format!("Failed to read session storage: {:?}", e))?;
    Ok(storage::decode_search_data(value))
}

async fn write_search_data(data: &SearchData) -> Result<(), String> {
    let value = storage::encode_search_data(data)?;
    setSessionStorage(SEARCH_DATA_KEY, value)
        .await
        .map_err(|e| format!("Failed to write session storage: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions() -> Vec<Suggestion> {
        vec![Suggestion::new("coffee shop", 900)]
    }

    #[test]
    fn test_commit_blocked_when_keyword_moved_on() {
        // Fetch for "k" resolves after the record moved to "k2"
        let current = SearchData::loading("k2");

        assert!(!commit_allowed("k", Some(&current)));
    }

    #[test]
    fn test_commit_allowed_for_current_keyword() {
        let current = SearchData::loading("k");

        assert!(commit_allowed("k", Some(&current)));
    }

    #[test]
    fn test_commit_blocked_when_record_cleared() {
        assert!(!commit_allowed("k", None));
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let mut cache = SuggestionCache::default();
        cache.insert("coffee".to_string(), suggestions(), 1_000.0);

        assert_eq!(cache.get("coffee", 2_000.0), Some(suggestions()));
        assert_eq!(cache.get("tea", 2_000.0), None);
    }

    #[test]
    fn test_cache_entry_expires_after_ttl() {
        let mut cache = SuggestionCache::default();
        cache.insert("coffee".to_string(), suggestions(), 1_000.0);

        assert_eq!(cache.get("coffee", 1_000.0 + CACHE_TTL_MS), None);
    }

    #[test]
    fn test_cache_evicts_oldest_at_capacity() {
        let mut cache = SuggestionCache::default();
        for i in 0..CACHE_CAPACITY {
            cache.insert(format!("kw{}", i), suggestions(), i as f64);
        }

        cache.insert("newest".to_string(), suggestions(), CACHE_CAPACITY as f64);

        assert_eq!(cache.entries.len(), CACHE_CAPACITY);
        assert_eq!(cache.get("kw0", CACHE_CAPACITY as f64), None);
        assert!(cache.get("newest", CACHE_CAPACITY as f64).is_some());
    }

    #[test]
    fn test_cache_reinsert_replaces_entry() {
        let mut cache = SuggestionCache::default();
        cache.insert("coffee".to_string(), suggestions(), 1_000.0);
        cache.insert("coffee".to_string(), Vec::new(), 2_000.0);

        assert_eq!(cache.entries.len(), 1);
        assert_eq!(cache.get("coffee", 2_500.0), Some(Vec::new()));
    }

    #[test]
    fn test_failure_record_keeps_keyword() {
        let failed = SearchData::failed("coffee");

        assert_eq!(failed.keyword, "coffee");
        assert!(failed.suggestions.is_empty());
        assert!(!failed.is_loading);
    }
}
