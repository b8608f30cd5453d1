use quickstart_wizard::api::clear_data_path;
use quickstart_wizard::navigation::{clear_session, clear_session_prompt};
use quickstart_wizard::oauth::sanitize_config_name;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;

use crate::dom::{self, by_id, listen, listen_id, query_all, value_of};
use crate::http::FetchTransport;

const NAME_INPUT: &str = "config_name";

/// Points every reset link at the data of the named config.
fn sync_reset_links(name: &str) {
    for link in query_all("a.clear-data-link") {
        let _ = link.set_attribute("href", &clear_data_path(name));
    }
}

pub fn init() {
    if let Some(input) = by_id::<HtmlInputElement>(NAME_INPUT) {
        let input_ref = input.clone();
        listen(&input, "input", move |_| {
            let cleaned = sanitize_config_name(&input_ref.value());
            if cleaned != input_ref.value() {
                input_ref.set_value(&cleaned);
            }
            sync_reset_links(&cleaned);
        });
        sync_reset_links(&input.value());
    }

    listen_id("clearSessionButton", "click", |event| {
        event.prevent_default();
        let name = value_of(NAME_INPUT).unwrap_or_default();
        if name.trim().is_empty() || !dom::confirm(&clear_session_prompt(&name)) {
            return;
        }
        spawn_local(async move {
            let message = clear_session(&FetchTransport, &name).await;
            dom::toast(&message);
        });
    });
}

/// The start page is the one carrying the config name input.
pub fn present() -> bool {
    by_id::<HtmlInputElement>(NAME_INPUT).is_some()
}
