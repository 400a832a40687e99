/// Keyword Lens - Chrome Extension for live keyword-suggestion data
/// Built with Rust + WASM + Yew

mod background;
mod content;
pub mod debounce;
pub mod export;
pub mod messages;
pub mod search_data;
pub mod storage;
pub mod suggest;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the background service worker's message listener
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Start the search-box watcher in the host page
#[wasm_bindgen]
pub fn start_content() {
    content::start();
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
