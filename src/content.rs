/// Content script: watches the host page's search box and renders the
/// suggestion panel under it

use crate::debounce::{Debouncer, DEBOUNCE_QUIET_MS};
use crate::messages::Request;
use crate::search_data::{format_volume, SearchData, Suggestion};
use crate::storage::{self, SEARCH_DATA_KEY};
use js_sys::Reflect;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, HtmlInputElement, HtmlTextAreaElement};

// Import JS bridge functions
#[wasm_bindgen(module = "/content.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getSessionStorage(key: &str) -> Result<JsValue, JsValue>;

    fn sendMessage(message: JsValue);
}

/// The host page renders its search box as either a textarea or an input.
const SEARCH_INPUT_SELECTOR: &str = "textarea[name=\"q\"], input[name=\"q\"]";
/// Id of the one element this extension injects into the page.
const PANEL_ID: &str = "keyword-suggestions-container";

fn loading_message(keyword: &str) -> String {
    format!("Loading suggestions for \"{}\"...", keyword)
}

/// Owns the search input handle, the lazily-created panel and the debounce
/// state for one page.
struct Watcher {
    input: HtmlElement,
    panel: Option<HtmlElement>,
    debouncer: Debouncer,
    // Kept so the pending timeout closure stays alive until it fires
    timer: Option<(i32, Closure<dyn FnMut()>)>,
}

impl Watcher {
    fn new(input: HtmlElement) -> Watcher {
        Watcher {
            input,
            panel: None,
            debouncer: Debouncer::new(),
            timer: None,
        }
    }

    fn current_input_value(&self) -> String {
        if let Some(input) = self.input.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(textarea) = self.input.dyn_ref::<HtmlTextAreaElement>() {
            textarea.value()
        } else {
            String::new()
        }
    }

    /// Create the panel on first need: sized to the search input's rendered
    /// width and inserted immediately after the search form in the layout.
    /// The input element itself is never touched.
    fn ensure_panel(&mut self) -> Option<HtmlElement> {
        if let Some(panel) = &self.panel {
            return Some(panel.clone());
        }

        let document = self.input.owner_document()?;
        let panel: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
        panel.set_id(PANEL_ID);

        let style = panel.style();
        let _ = style.set_property("width", &format!("{}px", self.input.offset_width()));
        let _ = style.set_property("border", "1px solid #dfe1e5");
        let _ = style.set_property("border-radius", "0 0 24px 24px");
        let _ = style.set_property("margin-top", "-1px");
        let _ = style.set_property("padding", "10px 0");
        let _ = style.set_property("background-color", "white");
        let _ = style.set_property("display", "none");

        let form = self.input.closest("form").ok().flatten()?;
        let anchor = form.parent_element()?;
        anchor.insert_adjacent_element("afterend", &panel).ok()?;

        self.panel = Some(panel.clone());
        Some(panel)
    }

    fn render(&mut self, data: &SearchData) {
        if data.is_loading {
            if let Some(panel) = self.ensure_panel() {
                render_loading(&panel, &data.keyword);
            }
        } else if !data.suggestions.is_empty() {
            if let Some(panel) = self.ensure_panel() {
                render_suggestions(&panel, &data.suggestions);
            }
        } else {
            self.hide_panel();
        }
    }

    fn hide_panel(&mut self) {
        if let Some(panel) = &self.panel {
            let _ = panel.style().set_property("display", "none");
        }
    }

    fn clear_timer(&mut self) {
        if let Some((handle, _closure)) = self.timer.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}

fn render_loading(panel: &HtmlElement, keyword: &str) {
    panel.set_inner_html("");

    if let Some(row) = create_html_element(panel, "div") {
        row.set_text_content(Some(&loading_message(keyword)));
        let style = row.style();
        let _ = style.set_property("padding", "10px 20px");
        let _ = style.set_property("color", "#5f6368");
        let _ = panel.append_child(&row);
    }

    let _ = panel.style().set_property("display", "block");
}

fn render_suggestions(panel: &HtmlElement, suggestions: &[Suggestion]) {
    panel.set_inner_html("");

    if let Some(list) = create_html_element(panel, "ul") {
        let style = list.style();
        let _ = style.set_property("list-style", "none");
        let _ = style.set_property("margin", "0");
        let _ = style.set_property("padding", "0");

        for suggestion in suggestions {
            let Some(item) = create_html_element(panel, "li") else {
                continue;
            };
            let style = item.style();
            let _ = style.set_property("display", "flex");
            let _ = style.set_property("justify-content", "space-between");
            let _ = style.set_property("padding", "6px 20px");

            // Text content only; suggestion strings never become markup
            if let Some(keyword) = create_html_element(panel, "span") {
                keyword.set_text_content(Some(&suggestion.keyword));
                let _ = item.append_child(&keyword);
            }
            if let Some(volume) = create_html_element(panel, "span") {
                volume.set_text_content(Some(&format_volume(suggestion.volume)));
                let _ = volume.style().set_property("color", "#5f6368");
                let _ = item.append_child(&volume);
            }

            let _ = list.append_child(&item);
        }

        let _ = panel.append_child(&list);
    }

    let _ = panel.style().set_property("display", "block");
}

fn create_html_element(context: &HtmlElement, tag: &str) -> Option<HtmlElement> {
    let document = context.owner_document()?;
    document.create_element(tag).ok()?.dyn_into().ok()
}

/// Entry point for the content script context. A page without the search
/// input is silently left alone.
pub fn start() {
    let Some(input) = find_search_input() else {
        log::debug!("No search input on this page");
        return;
    };

    let watcher = Rc::new(RefCell::new(Watcher::new(input)));

    attach_input_listener(&watcher);
    subscribe_to_search_data(&watcher);
    render_persisted_state(watcher);
}

fn find_search_input() -> Option<HtmlElement> {
    let document = web_sys::window()?.document()?;
    let element = document.query_selector(SEARCH_INPUT_SELECTOR).ok()??;
    element.dyn_into().ok()
}

fn attach_input_listener(watcher: &Rc<RefCell<Watcher>>) {
    let callback = Closure::wrap(Box::new({
        let watcher = watcher.clone();
        move |_event: web_sys::Event| {
            let raw = watcher.borrow().current_input_value();
            schedule_submission(&watcher, &raw);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);

    let input = watcher.borrow().input.clone();
    if let Err(e) =
        input.add_event_listener_with_callback("input", callback.as_ref().unchecked_ref())
    {
        log::warn!("Failed to attach input listener: {:?}", e);
    }

    // Listener lives for the page lifetime
    callback.forget();
}

/// Cancel any pending submission and arm a fresh timeout. Whitespace-only
/// input yields no ticket and therefore never sends a message.
fn schedule_submission(watcher: &Rc<RefCell<Watcher>>, raw: &str) {
    let ticket = {
        let mut watcher = watcher.borrow_mut();
        watcher.clear_timer();
        watcher.debouncer.schedule(raw)
    };
    let Some(ticket) = ticket else {
        return;
    };

    let callback = Closure::wrap(Box::new({
        let watcher = watcher.clone();
        move || {
            // Stale tickets fire as no-ops
            let keyword = watcher.borrow_mut().debouncer.fire(ticket);
            if let Some(keyword) = keyword {
                request_suggestions(&keyword);
            }
        }
    }) as Box<dyn FnMut()>);

    let Some(window) = web_sys::window() else {
        return;
    };
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        DEBOUNCE_QUIET_MS,
    ) {
        Ok(handle) => watcher.borrow_mut().timer = Some((handle, callback)),
        Err(e) => log::warn!("Failed to schedule debounce timer: {:?}", e),
    }
}

fn request_suggestions(keyword: &str) {
    let request = Request::FetchRealtimeSuggestions {
        keyword: keyword.to_string(),
    };
    match serde_wasm_bindgen::to_value(&request) {
        Ok(message) => sendMessage(message),
        Err(e) => log::error!("Failed to serialize fetch request: {:?}", e),
    }
}

/// chrome.storage.onChanged.addListener(callback); re-render on every change
/// to the searchData record in the session area.
fn subscribe_to_search_data(watcher: &Rc<RefCell<Watcher>>) {
    let callback = Closure::wrap(Box::new({
        let watcher = watcher.clone();
        move |changes: JsValue, area: JsValue| {
            if area.as_string().as_deref() != Some("session") {
                return;
            }
            let Ok(change) = Reflect::get(&changes, &SEARCH_DATA_KEY.into()) else {
                return;
            };
            if change.is_undefined() {
                return;
            }

            let new_value = Reflect::get(&change, &"newValue".into()).unwrap_or(JsValue::UNDEFINED);
            let mut watcher = watcher.borrow_mut();
            match storage::decode_search_data(new_value) {
                Some(data) => watcher.render(&data),
                // Record removed: nothing to show
                None => watcher.hide_panel(),
            }
        }
    }) as Box<dyn FnMut(JsValue, JsValue)>);

    if let Err(e) = add_storage_changed_listener(&callback) {
        log::error!("Failed to subscribe to storage changes: {:?}", e);
    }

    callback.forget();
}

fn add_storage_changed_listener(
    callback: &Closure<dyn FnMut(JsValue, JsValue)>,
) -> Result<(), JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &"chrome".into())?;
    let storage = Reflect::get(&chrome, &"storage".into())?;
    let on_changed = Reflect::get(&storage, &"onChanged".into())?;
    let add_listener: js_sys::Function =
        Reflect::get(&on_changed, &"addListener".into())?.unchecked_into();
    add_listener.call1(&on_changed, callback.as_ref())?;
    Ok(())
}

/// Covers page reloads with a query already in the URL: if a persisted
/// record matches the pre-filled search box, render it right away.
fn render_persisted_state(watcher: Rc<RefCell<Watcher>>) {
    spawn_local(async move {
        let value = match getSessionStorage(SEARCH_DATA_KEY).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read persisted searchData: {:?}", e);
                return;
            }
        };

        if let Some(data) = storage::decode_search_data(value) {
            let mut watcher = watcher.borrow_mut();
            if watcher.current_input_value() == data.keyword {
                watcher.render(&data);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_message_names_the_keyword() {
        assert_eq!(
            loading_message("rust wasm"),
            "Loading suggestions for \"rust wasm\"..."
        );
    }

    #[test]
    fn test_selector_tolerates_both_input_tags() {
        assert!(SEARCH_INPUT_SELECTOR.contains("textarea[name=\"q\"]"));
        assert!(SEARCH_INPUT_SELECTOR.contains("input[name=\"q\"]"));
    }
}
