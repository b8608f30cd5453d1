use std::rc::Rc;

use leptos::*;
use quickstart_wizard::WizardConfig;
use quickstart_wizard::config::CONFIG_ELEMENT_ID;
use tracing::info;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

mod dom;
mod http;
mod logging;
mod pages;
mod storage;

#[component]
fn App() -> impl IntoView {
    view! {
        <div
            id="leptos-runtime-marker"
            data-runtime="quickstart-frontend"
            style="display:none;"
        ></div>
    }
}

/// Settings rendered by the server into a `<script type="application/json">`.
fn embedded_config() -> WizardConfig {
    let raw = dom::web_document()
        .and_then(|doc| doc.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|node| node.text_content());
    WizardConfig::load(raw.as_deref())
}

fn main() {
    console_error_panic_hook::set_once();

    let config = Rc::new(embedded_config());
    logging::init_tracing(&config.log_level);

    if let Some(root) = dom::web_document()
        .and_then(|doc| doc.get_element_by_id("leptos-runtime-root"))
        .and_then(|node| node.dyn_into::<HtmlElement>().ok())
    {
        mount_to(root, || view! { <App /> });
    } else {
        mount_to_body(|| view! { <App /> });
    }

    info!("quickstart frontend started");
    pages::init(config);
}
