/// Typed access to the `searchData` record in chrome.storage.session

use crate::search_data::SearchData;
use wasm_bindgen::JsValue;

/// The only key this extension keeps in session storage.
pub const SEARCH_DATA_KEY: &str = "searchData";

/// Decode a storage value into SearchData. Absent values (null/undefined)
/// and undecodable values both come back as None; the latter is logged since
/// only this extension writes the key.
pub fn decode_search_data(value: JsValue) -> Option<SearchData> {
    if value.is_null() || value.is_undefined() {
        return None;
    }

    match serde_wasm_bindgen::from_value(value) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("Discarding undecodable searchData record: {:?}", e);
            None
        }
    }
}

pub fn encode_search_data(data: &SearchData) -> Result<JsValue, String> {
    serde_wasm_bindgen::to_value(data).map_err(|e| format!("Failed to serialize searchData: {:?}", e))
}
