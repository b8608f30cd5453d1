use quickstart_wizard::credentials::SelectOption;
use quickstart_wizard::flags::FieldSource;
use quickstart_wizard::{StatusMessage, WizardConfig};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTextAreaElement,
};

pub fn web_document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

pub fn by_id<T: JsCast>(id: &str) -> Option<T> {
    web_document()?
        .get_element_by_id(id)
        .and_then(|node| node.dyn_into::<T>().ok())
}

pub fn query_all(selector: &str) -> Vec<Element> {
    let Some(doc) = web_document() else {
        return Vec::new();
    };
    let Ok(nodes) = doc.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|idx| nodes.item(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_within(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(nodes) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|idx| nodes.item(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn set_text(id: &str, value: impl AsRef<str>) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(node) = doc.get_element_by_id(id) else {
        return;
    };
    let next = value.as_ref();
    if node.text_content().as_deref() == Some(next) {
        return;
    }
    node.set_text_content(Some(next));
}

pub fn toggle_class(id: &str, class_name: &str, on: bool) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(node) = doc.get_element_by_id(id) else {
        return;
    };
    let classes = node.class_list();
    if on {
        let _ = classes.add_1(class_name);
    } else {
        let _ = classes.remove_1(class_name);
    }
}

/// Bootstrap visibility through `d-none`.
pub fn set_visible(id: &str, visible: bool) {
    toggle_class(id, "d-none", !visible);
}

pub fn set_display(id: &str, display: &str) {
    let Some(element) = by_id::<HtmlElement>(id) else {
        return;
    };
    let _ = element.style().set_property("display", display);
}

pub fn set_disabled(id: &str, disabled: bool) {
    let Some(element) = by_id::<Element>(id) else {
        return;
    };
    if disabled {
        let _ = element.set_attribute("disabled", "disabled");
    } else {
        let _ = element.remove_attribute("disabled");
    }
}

pub fn set_nav_enabled(id: &str, enabled: bool) {
    let Some(element) = by_id::<HtmlElement>(id) else {
        return;
    };
    set_element_enabled(&element, enabled);
}

pub fn set_element_enabled(element: &HtmlElement, enabled: bool) {
    let _ = element
        .style()
        .set_property("opacity", if enabled { "1" } else { "0.5" });
    let _ = element
        .style()
        .set_property("pointer-events", if enabled { "auto" } else { "none" });
    if enabled {
        let _ = element.remove_attribute("disabled");
        let _ = element.set_attribute("aria-disabled", "false");
    } else {
        let _ = element.set_attribute("disabled", "disabled");
        let _ = element.set_attribute("aria-disabled", "true");
    }
}

/// Rebuilds a select's options and restores `selected` when offered.
pub fn fill_select(id: &str, options: &[SelectOption], selected: &str) {
    let Some(select) = by_id::<HtmlSelectElement>(id) else {
        return;
    };
    select.set_inner_html("");
    for option in options {
        let Ok(node) = HtmlOptionElement::new_with_text_and_value(&option.label, &option.value)
        else {
            continue;
        };
        let _ = select.append_child(&node);
    }
    select.set_value(selected);
}

/// Value of an input, select or textarea.
pub fn element_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    element.dyn_ref::<HtmlTextAreaElement>().map(|area| area.value())
}

pub fn value_of(id: &str) -> Option<String> {
    web_document()?
        .get_element_by_id(id)
        .and_then(|element| element_value(&element))
}

pub fn set_value(id: &str, value: &str) {
    let Some(element) = web_document().and_then(|doc| doc.get_element_by_id(id)) else {
        return;
    };
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    }
}

pub fn is_checked(id: &str) -> bool {
    by_id::<HtmlInputElement>(id).is_some_and(|input| input.checked())
}

pub fn set_checked(id: &str, checked: bool) {
    if let Some(input) = by_id::<HtmlInputElement>(id) {
        input.set_checked(checked);
    }
}

/// Inputs read live from the page by element id.
pub struct PageFields;

impl FieldSource for PageFields {
    fn field(&self, id: &str) -> Option<String> {
        value_of(id)
    }
}

/// Shows a status line. Colored lines use the configured palette, alert
/// boxes swap their Bootstrap class.
pub fn show_status(id: &str, message: &StatusMessage, config: &WizardConfig) {
    let Some(element) = by_id::<HtmlElement>(id) else {
        return;
    };
    element.set_text_content(Some(&message.text));
    let classes = element.class_list();
    if classes.contains("alert") {
        for class_name in ["alert-success", "alert-danger", "alert-info", "alert-warning"] {
            let _ = classes.remove_1(class_name);
        }
        let _ = classes.add_1(message.tone.alert_class());
    } else {
        let _ = element.style().set_property("color", message.color(config));
    }
    let _ = element.style().set_property("display", "block");
}

/// Appends `before`, a link labelled `label` that calls `on_click`, and
/// `after` to `container`.
pub fn append_link(
    container: &Element,
    parts: (&str, &str, &str),
    mut on_click: impl FnMut() + 'static,
) {
    let Some(doc) = web_document() else {
        return;
    };
    let Ok(link) = doc.create_element("a") else {
        return;
    };
    let (before, label, after) = parts;
    let _ = link.set_attribute("href", "#");
    link.set_text_content(Some(label));
    listen(&link, "click", move |event| {
        event.prevent_default();
        on_click();
    });
    let _ = container.append_with_str_1(before);
    let _ = container.append_with_node_1(&link);
    let _ = container.append_with_str_1(after);
}

fn set_alert_tone(container: &HtmlElement, tone_class: &str) {
    let classes = container.class_list();
    for class_name in ["alert-success", "alert-danger", "alert-info", "alert-warning"] {
        let _ = classes.remove_1(class_name);
    }
    let _ = classes.add_1(tone_class);
    let _ = container.style().set_property("display", "block");
}

/// Replaces the children of `id` with a message whose middle part is a
/// link that calls `on_click`.
pub fn show_link_message(
    id: &str,
    parts: (&str, &str, &str),
    tone_class: &str,
    on_click: impl FnMut() + 'static,
) {
    let Some(container) = by_id::<HtmlElement>(id) else {
        return;
    };
    container.set_inner_html("");
    append_link(&container, parts, on_click);
    set_alert_tone(&container, tone_class);
}

/// One linked line per entry, separated by line breaks.
pub fn show_link_lines<F>(id: &str, lines: Vec<((String, String, String), F)>, tone_class: &str)
where
    F: FnMut() + 'static,
{
    let Some(container) = by_id::<HtmlElement>(id) else {
        return;
    };
    container.set_inner_html("");
    if lines.is_empty() {
        let _ = container.style().set_property("display", "none");
        return;
    }
    for (idx, ((before, label, after), on_click)) in lines.into_iter().enumerate() {
        if idx > 0 {
            if let Some(br) = web_document().and_then(|doc| doc.create_element("br").ok()) {
                let _ = container.append_with_node_1(&br);
            }
        }
        append_link(&container, (before.as_str(), label.as_str(), after.as_str()), on_click);
    }
    set_alert_tone(&container, tone_class);
}

/// Attaches a listener for the lifetime of the page.
pub fn listen(target: &web_sys::EventTarget, event: &str, handler: impl FnMut(web_sys::Event) + 'static) {
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    let _ = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
    callback.forget();
}

pub fn listen_id(id: &str, event: &str, handler: impl FnMut(web_sys::Event) + 'static) {
    if let Some(element) = by_id::<Element>(id) {
        listen(&element, event, handler);
    }
}

pub fn event_element(event: &web_sys::Event) -> Option<Element> {
    event
        .target()
        .and_then(|node| node.dyn_into::<Element>().ok())
}

/// Named form controls as `(name, value)` pairs in document order.
pub fn form_pairs(form: &HtmlFormElement) -> Vec<(String, String)> {
    let mut pairs = Vec::<(String, String)>::new();
    let elements = form.elements();

    for idx in 0..elements.length() {
        let Some(element) = elements.item(idx) else {
            continue;
        };

        let name = element.get_attribute("name").unwrap_or_default();
        if name.trim().is_empty() {
            continue;
        }

        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let kind = input.type_().to_ascii_lowercase();
            if matches!(
                kind.as_str(),
                "submit" | "button" | "reset" | "file" | "image"
            ) {
                continue;
            }
            if matches!(kind.as_str(), "checkbox" | "radio") && !input.checked() {
                continue;
            }
            pairs.push((name, input.value()));
            continue;
        }

        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            pairs.push((name, select.value()));
            continue;
        }

        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            pairs.push((name, textarea.value()));
        }
    }
    pairs
}

pub fn navigate(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(url);
    }
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Appends a dismissable toast to `#toast-container`, or logs when the page
/// has none.
pub fn toast(message: &StatusMessage) {
    let Some(doc) = web_document() else {
        return;
    };
    let Some(container) = doc.get_element_by_id("toast-container") else {
        tracing::info!("{}: {}", message.tone.toast_kind(), message.text);
        return;
    };
    let Ok(node) = doc.create_element("div") else {
        return;
    };
    node.set_class_name(&format!(
        "toast show align-items-center border-0 text-bg-{}",
        match message.tone.toast_kind() {
            "error" => "danger",
            other => other,
        }
    ));
    let _ = node.set_attribute("role", "alert");
    node.set_text_content(Some(&message.text));
    let _ = container.append_child(&node);
    let node_ref = node.clone();
    let _ = gloo_timers::callback::Timeout::new(5_000, move || node_ref.remove()).forget();
}
