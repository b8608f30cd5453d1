use std::cell::RefCell;
use std::rc::Rc;

use quickstart_wizard::StatusMessage;
use quickstart_wizard::api;
use quickstart_wizard::flags::parse_flag;
use quickstart_wizard::webhooks::{self, WebhookRegistry, spinner_id};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::dom::{self, by_id, element_value, listen, query_all, set_display, set_value, value_of};
use crate::http::FetchTransport;
use crate::pages::navigation;

fn custom_box(id: &str) -> Option<Element> {
    by_id::<Element>(&format!("{id}_custom"))
}

fn custom_input(id: &str) -> Option<HtmlInputElement> {
    custom_box(id)?
        .query_selector("input.custom-webhook-url")
        .ok()
        .flatten()?
        .dyn_into::<HtmlInputElement>()
        .ok()
}

fn validate_button(id: &str) -> Option<HtmlElement> {
    custom_box(id)?
        .query_selector(".validate-button")
        .ok()
        .flatten()?
        .dyn_into::<HtmlElement>()
        .ok()
}

/// Message slot next to the URL input group.
fn show_message(id: &str, message: &StatusMessage) {
    let Some(slot) = custom_box(id)
        .and_then(|node| node.query_selector(".validation-message").ok().flatten())
    else {
        dom::toast(message);
        return;
    };
    slot.set_inner_html("");
    let Some(doc) = dom::web_document() else {
        return;
    };
    let Ok(alert) = doc.create_element("div") else {
        return;
    };
    alert.set_class_name(&format!("alert {}", message.tone.alert_class()));
    let _ = alert.set_attribute("role", "alert");
    alert.set_text_content(Some(&message.text));
    let _ = slot.append_child(&alert);
}

fn sync(registry: &WebhookRegistry) {
    for id in registry.ids() {
        set_display(
            &format!("{id}_custom"),
            if registry.custom_input_visible(id) { "block" } else { "none" },
        );
        if let Some(button) = validate_button(id) {
            if registry.validate_button_enabled(id) {
                let _ = button.remove_attribute("disabled");
            } else {
                let _ = button.set_attribute("disabled", "disabled");
            }
        }
    }
    set_value(webhooks::FLAG_ID, registry.flag_value());
    navigation::set_substitutions(registry.substitutions());
}

fn run_validation(registry: Rc<RefCell<WebhookRegistry>>, id: String) {
    let begun = registry.borrow_mut().begin(&id);
    let payload = match begun {
        Ok(payload) => payload,
        Err(err) => {
            show_message(&id, &StatusMessage::error(err.to_string()));
            return;
        }
    };
    sync(&registry.borrow());
    set_display(&spinner_id(&id), "inline-block");
    show_message(&id, &StatusMessage::info("Validating..."));
    spawn_local(async move {
        let result = api::validate(&FetchTransport, webhooks::ENDPOINT, &payload).await;
        let message = registry.borrow_mut().complete(&id, result);
        set_display(&spinner_id(&id), "none");
        show_message(&id, &message);
        sync(&registry.borrow());
    });
}

pub fn init() {
    let selects: Vec<(String, String, String)> = query_all("select.form-select[id^='webhooks_']")
        .into_iter()
        .map(|select| {
            let id = select.id();
            let selection = element_value(&select).unwrap_or_default();
            let url = custom_input(&id).map(|input| input.value()).unwrap_or_default();
            (id, selection, url)
        })
        .collect();
    let page_flag = value_of(webhooks::FLAG_ID).is_some_and(|flag| parse_flag(&flag));
    let registry = Rc::new(RefCell::new(WebhookRegistry::load(
        selects
            .iter()
            .map(|(id, selection, url)| (id.as_str(), selection.as_str(), url.as_str())),
        page_flag,
    )));
    sync(&registry.borrow());

    for (id, _, _) in &selects {
        if let Some(select) = by_id::<Element>(id) {
            let registry = registry.clone();
            let id = id.clone();
            listen(&select, "change", move |event| {
                let Some(value) = dom::event_element(&event).and_then(|node| element_value(&node))
                else {
                    return;
                };
                registry.borrow_mut().selection_changed(&id, &value);
                sync(&registry.borrow());
            });
        }
        if let Some(input) = custom_input(id) {
            let registry = registry.clone();
            let id = id.clone();
            let input_ref = input.clone();
            listen(&input, "input", move |_| {
                registry.borrow_mut().url_edited(&id, &input_ref.value());
                sync(&registry.borrow());
            });
        }
        if let Some(button) = validate_button(id) {
            let registry = registry.clone();
            let id = id.clone();
            listen(&button, "click", move |event| {
                event.prevent_default();
                run_validation(registry.clone(), id.clone());
            });
        }
    }
}
