use quickstart_wizard::credentials::SecretVisibility;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement};

use crate::dom::{by_id, listen, query_all};

/// The secret input an eye button controls: `data-target` when present,
/// otherwise the input sharing its input group.
fn target_input(button: &Element) -> Option<HtmlInputElement> {
    if let Some(id) = button.get_attribute("data-target") {
        return by_id::<HtmlInputElement>(id.trim_start_matches('#'));
    }
    button
        .closest(".input-group")
        .ok()
        .flatten()?
        .query_selector("input")
        .ok()
        .flatten()?
        .dyn_into::<HtmlInputElement>()
        .ok()
}

fn render(button: &Element, visibility: SecretVisibility) {
    button.set_inner_html(&format!("<i class=\"fas {}\"></i>", visibility.icon_class()));
}

pub fn init() {
    for button in query_all("[id^='toggle'][id$='Visibility']") {
        let Some(input) = target_input(&button) else {
            continue;
        };
        render(&button, SecretVisibility::from_input_type(&input.type_()));
        let button_ref = button.clone();
        listen(&button, "click", move |event| {
            event.prevent_default();
            let next = SecretVisibility::from_input_type(&input.type_()).toggled();
            input.set_type(next.input_type());
            render(&button_ref, next);
        });
    }
}
