/// Popup UI for the Keyword Lens extension

use yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use patternfly_yew::prelude::*;
use crate::export::{export_filename, suggestions_to_csv};
use crate::messages::{Request, SuggestionsReply};
use crate::search_data::{format_volume, SearchData};

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;

    fn exportToFile(data: &str, filename: &str);
}

#[derive(Clone, PartialEq)]
enum PopupState {
    Fetching,
    /// No search has been performed yet
    NoSearch,
    Ready(SearchData),
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| PopupState::Fetching);

    // The popup is short-lived: query the current state once on open,
    // no change subscription.
    {
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match request_search_data().await {
                    Ok(Some(data)) => state.set(PopupState::Ready(data)),
                    Ok(None) => state.set(PopupState::NoSearch),
                    Err(e) => state.set(PopupState::Error(e)),
                }
            });
            || ()
        });
    }

    let on_download = {
        let state = state.clone();

        Callback::from(move |_| {
            if let PopupState::Ready(data) = &*state {
                if data.suggestions.is_empty() {
                    return;
                }
                let csv = suggestions_to_csv(&data.suggestions);
                let filename = export_filename(Some(&data.keyword));
                exportToFile(&csv, &filename);
            }
        })
    };

    let title = match &*state {
        PopupState::Ready(data) => format!("Suggestions for \"{}\"", data.keyword),
        _ => "Keyword Suggestions".to_string(),
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{title}</h1>

            {match &*state {
                PopupState::Fetching => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                PopupState::NoSearch => html! {
                    <p class="prompt-text">{"Perform a Google search to get started."}</p>
                },
                PopupState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"An error occurred. Try reloading the extension."} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                PopupState::Ready(data) => {
                    if data.is_loading {
                        html! {
                            <div class="loading-text-center">
                                <Spinner />
                                <p class="loading-text">{"Loading..."}</p>
                            </div>
                        }
                    } else if data.suggestions.is_empty() {
                        html! {
                            <p class="prompt-text">{"No suggestions found."}</p>
                        }
                    } else {
                        html! {
                            <>
                                <ul class="suggestions-list">
                                    {for data.suggestions.iter().map(|suggestion| html! {
                                        <li class="suggestion-item">
                                            <span class="keyword-text">{&suggestion.keyword}</span>
                                            <span class="keyword-volume">{format_volume(suggestion.volume)}</span>
                                        </li>
                                    })}
                                </ul>
                                <Button onclick={on_download} variant={ButtonVariant::Primary} block={true}>
                                    {"Download CSV"}
                                </Button>
                            </>
                        }
                    }
                }
            }}
        </div>
    }
}

// Helper functions

async fn request_search_data() -> Result<Option<SearchData>, String> {
    let message = serde_wasm_bindgen::to_value(&Request::GetSuggestions)
        .map_err(|e| format!("Failed to serialize request: {:?}", e))?;

    let reply = sendMessage(message)
        .await
        .map_err(|e| format!("Messaging failed: {:?}", e))?;

    // The background answers `{}` when no search happened yet
    let reply: SuggestionsReply = serde_wasm_bindgen::from_value(reply)
        .map_err(|e| format!("Failed to parse reply: {:?}", e))?;

    Ok(reply.into_search_data())
}
