//! Library cards, accordion highlights and separators.
//!
//! The page model is rebuilt from the DOM on every relevant change and the
//! evaluation is written back in one pass.

use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::accordion::{AccordionNode, Control};
use quickstart_wizard::api::MediaKind;
use quickstart_wizard::flags::parse_flag;
use quickstart_wizard::libraries::{
    LIBRARIES_FLAG, LIBRARIES_INPUT, LibrariesEvaluation, LibrariesPage, LibraryCard, Placeholder,
};
use quickstart_wizard::separator::{self, SeparatorIds, SeparatorInputs};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, HtmlImageElement, HtmlInputElement, HtmlSelectElement};

use crate::dom::{self, by_id, query_all, query_within, set_display, set_value, show_status, value_of};
use crate::http::FetchTransport;
use crate::pages::navigation;

const MESSAGE_ID: &str = "validation-messages";
const ACCORDIONS_ID: &str = "all-accordions-container";
const PLEX_MARKER_ID: &str = "plex_valid";
const CHECKBOX_SELECTOR: &str = ".library-checkbox";
const PLACEHOLDER_SELECTOR: &str = ".placeholder-imdb-dropdown";

/// Reads `data-plex-valid` from the server-rendered marker.
pub fn plex_valid() -> bool {
    by_id::<Element>(PLEX_MARKER_ID)
        .and_then(|marker| marker.get_attribute("data-plex-valid"))
        .is_some_and(|raw| parse_flag(&raw))
}

/// The page read back from the DOM, with handles to re-find what the
/// evaluation refers to by key.
struct Scan {
    page: LibrariesPage,
    items: Vec<(String, Element)>,
    placeholders: Vec<(String, HtmlSelectElement)>,
}

fn parent_item(element: &Element) -> Option<Element> {
    element.parent_element()?.closest(".accordion-item").ok().flatten()
}

fn owning_item(element: &Element) -> Option<Element> {
    element.closest(".accordion-item").ok().flatten()
}

fn owned_by(element: &Element, item: &Element) -> bool {
    owning_item(element).is_some_and(|owner| owner.is_same_node(Some(item)))
}

fn header_of(item: &Element) -> Option<Element> {
    item.query_selector(":scope > .accordion-header").ok().flatten()
}

fn controls_of(item: &Element) -> Vec<Control> {
    let mut controls = Vec::new();
    for element in query_within(item, "input, select") {
        if !owned_by(&element, item) {
            continue;
        }
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            if matches!(input.type_().as_str(), "checkbox" | "radio") {
                controls.push(Control::toggle(input.checked()));
            }
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            if select.class_list().contains("placeholder-imdb-dropdown") {
                continue;
            }
            controls.push(Control::select(select.value()));
        }
    }
    for list in query_within(item, "ul.list-group") {
        if owned_by(&list, item) {
            controls.push(Control::ListItems(query_within(&list, "li").len()));
        }
    }
    controls
}

fn build_node(item: &Element, fallback: String, items: &mut Vec<(String, Element)>) -> AccordionNode {
    let key = if item.id().is_empty() { fallback } else { item.id() };
    let title = header_of(item)
        .and_then(|header| header.text_content())
        .unwrap_or_default();
    let mut node = AccordionNode::new(key.clone(), title.trim());
    node.controls = controls_of(item);
    items.push((key.clone(), item.clone()));
    for (idx, child) in query_within(item, ".accordion-item")
        .into_iter()
        .filter(|child| parent_item(child).is_some_and(|parent| parent.is_same_node(Some(item))))
        .enumerate()
    {
        node.children.push(build_node(&child, format!("{key}-{idx}"), items));
    }
    node
}

fn accordion_for(card_id: &str, items: &mut Vec<(String, Element)>) -> Vec<AccordionNode> {
    let Some(container) = by_id::<Element>(&format!("{card_id}-container")) else {
        return Vec::new();
    };
    query_within(&container, ".accordion-item")
        .into_iter()
        .filter(|item| {
            parent_item(item).is_none_or(|parent| !container.contains(Some(&parent)))
        })
        .enumerate()
        .map(|(idx, item)| build_node(&item, format!("{card_id}-section-{idx}"), items))
        .collect()
}

fn separator_style(card_id: &str) -> String {
    let ids = SeparatorIds::for_library(card_id);
    query_all(&format!("select[name=\"{}\"]", ids.style_name))
        .first()
        .and_then(dom::element_value)
        .unwrap_or_else(|| separator::NO_SEPARATOR.to_string())
}

/// Library id a placeholder dropdown belongs to, from its data attributes.
fn placeholder_library(select: &Element) -> Option<(String, MediaKind, String)> {
    let name = select.get_attribute("data-library-id")?;
    let kind = MediaKind::parse(&select.get_attribute("data-library-type")?)?;
    Some((separator::library_id_for(kind, &name), kind, name))
}

fn scan(plex_valid: bool) -> Scan {
    let mut items = Vec::new();
    let mut placeholders = Vec::new();
    let mut cards = Vec::new();
    for checkbox in query_all(CHECKBOX_SELECTOR) {
        let Ok(input) = checkbox.dyn_into::<HtmlInputElement>() else {
            continue;
        };
        let id = input.id();
        let id = id
            .strip_suffix("-library")
            .or_else(|| id.strip_suffix("-card-container"))
            .unwrap_or(&id)
            .to_string();
        let mut card = LibraryCard::new(id.clone(), input.value());
        card.checked = input.checked();
        card.accordion = accordion_for(&id, &mut items);
        card.separator_style = separator_style(&id);
        cards.push(card);
    }
    for element in query_all(PLACEHOLDER_SELECTOR) {
        let Some((library_id, _, _)) = placeholder_library(&element) else {
            continue;
        };
        let Some(node_key) = owning_item(&element)
            .and_then(|item| items.iter().find(|(_, el)| el.is_same_node(Some(&item))))
            .map(|(key, _)| key.clone())
        else {
            continue;
        };
        let Ok(select) = element.dyn_into::<HtmlSelectElement>() else {
            continue;
        };
        if let Some(card) = cards.iter_mut().find(|card| card.id == library_id) {
            card.placeholder = Some(Placeholder {
                node_key: node_key.clone(),
                value: select.value(),
            });
        }
        placeholders.push((node_key, select));
    }
    Scan {
        page: LibrariesPage { plex_valid, cards },
        items,
        placeholders,
    }
}

fn set_header(item: &Element, selected: bool, invalid: bool) {
    let Some(header) = header_of(item) else {
        return;
    };
    let classes = header.class_list();
    for (class_name, on) in [("selected", selected), ("invalid", invalid)] {
        if on {
            let _ = classes.add_1(class_name);
        } else {
            let _ = classes.remove_1(class_name);
        }
    }
}

fn apply(config: &Rc<WizardConfig>, scan: &Scan, eval: &LibrariesEvaluation) {
    set_value(LIBRARIES_INPUT, &eval.libraries_value);
    set_value(LIBRARIES_FLAG, eval.flag_value());

    match &eval.gate {
        Some(gate) => {
            set_display(ACCORDIONS_ID, "none");
            dom::show_link_message(
                MESSAGE_ID,
                (gate.before.as_str(), gate.label.as_str(), gate.after.as_str()),
                eval.message.tone.alert_class(),
                navigation::jump_handler(config.clone(), gate.step.clone()),
            );
        }
        None => {
            set_display(ACCORDIONS_ID, "block");
            show_status(MESSAGE_ID, &eval.message, config);
        }
    }

    for (key, item) in &scan.items {
        let state = eval.highlights.get(key);
        set_header(item, state.selected, state.invalid);
    }
    for card in &scan.page.cards {
        let container = card.container_id();
        let Some(element) = by_id::<HtmlElement>(&container) else {
            continue;
        };
        let border = if eval.invalid_containers.contains(&container) {
            "2px solid red"
        } else {
            ""
        };
        let _ = element.style().set_property("border", border);
    }
    for (key, select) in &scan.placeholders {
        let invalid = eval.invalid_placeholders.contains(key);
        let classes = select.class_list();
        if invalid {
            let _ = classes.add_1("is-invalid");
        } else {
            let _ = classes.remove_1("is-invalid");
        }
    }
    for (id, visible) in &eval.card_visibility {
        set_display(id, if *visible { "block" } else { "none" });
    }
    navigation::set_page_valid(eval.valid);
}

/// Re-reads the page and writes the evaluation back.
pub fn refresh(config: &Rc<WizardConfig>) {
    let scan = scan(plex_valid());
    let eval = scan.page.evaluate();
    debug!(
        "libraries refresh: valid={} selected={}",
        eval.valid, eval.libraries_value
    );
    apply(config, &scan, &eval);
}

fn any_checked_under(prefix: &str) -> bool {
    !query_all(&format!("[id^='{prefix}'] input[type='checkbox']:checked")).is_empty()
}

fn apply_separator(config: &WizardConfig, card_id: &str) {
    let ids = SeparatorIds::for_library(card_id);
    let state = separator::cascade(
        config,
        &SeparatorInputs {
            style: separator_style(card_id),
            award_items_checked: any_checked_under(&ids.award_accordion_prefix),
            chart_items_checked: any_checked_under(&ids.chart_accordion_prefix),
        },
    );
    set_value(&ids.use_separator_hidden, state.use_separator_value());
    set_value(&ids.sep_style_hidden, &state.sep_style);
    for (id, toggle) in [(&ids.award_toggle, state.award), (&ids.chart_toggle, state.chart)] {
        dom::set_checked(id, toggle.checked);
        dom::set_disabled(id, !toggle.enabled);
    }
    match &state.preview_url {
        Some(url) => {
            if let Some(image) = by_id::<HtmlImageElement>(&ids.preview_image) {
                image.set_src(url);
            }
            set_display(&ids.preview_container, "block");
        }
        None => set_display(&ids.preview_container, "none"),
    }
    for element in query_all(PLACEHOLDER_SELECTOR) {
        if placeholder_library(&element).is_some_and(|(id, _, _)| id == card_id) {
            if state.placeholder_required {
                let _ = element.set_attribute("required", "required");
            } else {
                let _ = element.remove_attribute("required");
            }
        }
    }
}

fn load_placeholders(config: Rc<WizardConfig>) {
    for element in query_all(PLACEHOLDER_SELECTOR) {
        let Some((_, kind, name)) = placeholder_library(&element) else {
            continue;
        };
        let Ok(select) = element.dyn_into::<HtmlSelectElement>() else {
            continue;
        };
        let current = select
            .get_attribute("data-selected")
            .filter(|saved| !saved.trim().is_empty())
            .unwrap_or_else(|| select.value());
        let config = config.clone();
        spawn_local(async move {
            match separator::load_placeholder_options(&FetchTransport, &name, kind, &current).await
            {
                Ok(options) => {
                    select.set_inner_html("");
                    for option in &options {
                        if let Ok(node) = web_sys::HtmlOptionElement::new_with_text_and_value(
                            &option.label,
                            &option.value,
                        ) {
                            let _ = select.append_child(&node);
                        }
                    }
                    select.set_value(current.trim());
                }
                Err(err) => warn!("placeholder titles for {name}: {err}"),
            }
            refresh(&config);
        });
    }
}

pub fn init(config: Rc<WizardConfig>) {
    let saved = value_of(LIBRARIES_INPUT).unwrap_or_default();
    let mut restored = scan(plex_valid()).page;
    restored.restore(&saved);
    for card in restored.cards.iter().filter(|card| card.checked) {
        dom::set_checked(&format!("{}-library", card.id), true);
    }

    for card in &restored.cards {
        apply_separator(&config, &card.id);
        let ids = SeparatorIds::for_library(&card.id);
        for select in query_all(&format!("select[name=\"{}\"]", ids.style_name)) {
            let config = config.clone();
            let card_id = card.id.clone();
            dom::listen(&select, "change", move |_| {
                apply_separator(&config, &card_id);
                refresh(&config);
            });
        }
        for prefix in [&ids.award_accordion_prefix, &ids.chart_accordion_prefix] {
            for input in query_all(&format!("[id^='{prefix}'] input[type='checkbox']")) {
                let config = config.clone();
                let card_id = card.id.clone();
                dom::listen(&input, "change", move |_| apply_separator(&config, &card_id));
            }
        }
    }

    for element in query_all(&format!(
        "{CHECKBOX_SELECTOR}, .accordion-item input, .accordion-item select"
    )) {
        let config = config.clone();
        dom::listen(&element, "change", move |_| refresh(&config));
    }

    load_placeholders(config.clone());
    refresh(&config);
}
