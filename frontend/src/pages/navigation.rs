use std::cell::{Cell, RefCell};
use std::rc::Rc;

use quickstart_wizard::navigation::{
    ARROW_CLASSES, NavAction, NavState, SPINNER_CLASSES, submit_and_redirect,
    substitute_custom_values, suppress_enter,
};
use quickstart_wizard::{StatusMessage, WizardConfig};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, HtmlFormElement, KeyboardEvent};

use crate::dom::{self, by_id, event_element, listen, query_all};
use crate::http::FetchTransport;

const PREVIOUS_SELECTOR: &str = ".previous-button";
const NEXT_SELECTOR: &str = ".next-button";
const JUMP_SELECTOR: &str = ".jump-to-button, .dropdown-toggle";

thread_local! {
    static PAGE_VALID: Cell<bool> = const { Cell::new(true) };
    static SUBSTITUTIONS: RefCell<Vec<(String, String)>> = const { RefCell::new(Vec::new()) };
    static SUBMIT_GUARD: RefCell<Option<Box<dyn Fn() -> bool>>> = const { RefCell::new(None) };
    static SUBMITTING: Cell<bool> = const { Cell::new(false) };
}

pub fn form() -> Option<HtmlFormElement> {
    by_id::<HtmlFormElement>("configForm").or_else(|| by_id::<HtmlFormElement>("final-form"))
}

pub fn set_page_valid(valid: bool) {
    PAGE_VALID.with(|cell| cell.set(valid));
    let nav = NavState::from_validity(valid);
    for (selector, enabled) in [
        (PREVIOUS_SELECTOR, nav.previous),
        (NEXT_SELECTOR, nav.next),
        (JUMP_SELECTOR, nav.jump),
    ] {
        for element in query_all(selector) {
            if let Ok(element) = element.dyn_into::<HtmlElement>() {
                dom::set_element_enabled(&element, enabled);
            }
        }
    }
}

pub fn set_substitutions(substitutions: Vec<(String, String)>) {
    SUBSTITUTIONS.with(|slot| *slot.borrow_mut() = substitutions);
}

/// Runs before any navigation; returning `false` cancels it.
pub fn set_submit_guard(guard: impl Fn() -> bool + 'static) {
    SUBMIT_GUARD.with(|slot| *slot.borrow_mut() = Some(Box::new(guard)));
}

fn guard_allows() -> bool {
    SUBMIT_GUARD.with(|slot| slot.borrow().as_ref().is_none_or(|guard| guard()))
}

fn action_for(element: &web_sys::Element) -> Option<(NavAction, String)> {
    let button = element.closest("[data-step]").ok().flatten()?;
    let step = button.get_attribute("data-step").unwrap_or_default();
    if step.trim().is_empty() {
        return None;
    }
    let classes = button.class_list();
    let action = if classes.contains("previous-button") {
        NavAction::Previous
    } else if classes.contains("next-button") {
        NavAction::Next
    } else {
        NavAction::Jump(step.clone())
    };
    Some((action, step))
}

fn swap_icon(action: &NavAction, spinning: bool) {
    let Some(icon) = by_id::<web_sys::Element>(action.spinner_icon_id()) else {
        return;
    };
    let classes = icon.class_list();
    let arrow = match action {
        NavAction::Previous => ARROW_CLASSES[0],
        NavAction::Next | NavAction::Jump(_) => ARROW_CLASSES[1],
    };
    if spinning {
        let _ = classes.remove_1(arrow);
        for class_name in SPINNER_CLASSES {
            let _ = classes.add_1(class_name);
        }
    } else {
        for class_name in SPINNER_CLASSES {
            let _ = classes.remove_1(class_name);
        }
        let _ = classes.add_1(arrow);
    }
}

/// `gated` is false for jump links inside messages, which lead back to the
/// step that needs fixing.
fn navigate(config: Rc<WizardConfig>, action: NavAction, step: String, gated: bool) {
    if gated {
        let allowed = NavState::from_validity(PAGE_VALID.with(Cell::get)).allows(&action);
        if !allowed || !guard_allows() {
            debug!("navigation to {step} blocked");
            return;
        }
    }
    if SUBMITTING.with(Cell::get) {
        return;
    }
    let Some(form) = form() else {
        warn!("no wizard form on this page");
        return;
    };
    let fields = substitute_custom_values(
        dom::form_pairs(&form),
        &SUBSTITUTIONS.with(|slot| slot.borrow().clone()),
    );
    let form_action = form.action();
    SUBMITTING.with(|cell| cell.set(true));
    swap_icon(&action, true);
    spawn_local(async move {
        match submit_and_redirect(&FetchTransport, &config, &form_action, &fields, &step).await {
            Ok(url) => dom::navigate(&url),
            Err(err) => {
                SUBMITTING.with(|cell| cell.set(false));
                swap_icon(&action, false);
                dom::toast(&StatusMessage::error(format!("Saving this page failed: {err}")));
            }
        }
    });
}

pub fn init(config: Rc<WizardConfig>) {
    let Some(doc) = dom::web_document() else {
        return;
    };

    listen(&doc, "keydown", |event| {
        let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let Some(target) = event_element(&event) else {
            return;
        };
        let inside_form = target.closest("form").ok().flatten().is_some();
        if suppress_enter(&key_event.key(), &target.tag_name(), inside_form) {
            event.prevent_default();
        }
    });

    if let Some(form) = form() {
        listen(&form, "submit", |event| event.prevent_default());
    }

    for element in query_all("[data-step]") {
        let config = config.clone();
        listen(&element, "click", move |event| {
            event.prevent_default();
            let Some(target) = event_element(&event) else {
                return;
            };
            if let Some((action, step)) = action_for(&target) {
                navigate(config.clone(), action, step, true);
            }
        });
    }
}

/// Wires a link in a status message to the jump-to submission.
pub fn jump_handler(config: Rc<WizardConfig>, step: String) -> impl FnMut() + 'static {
    move || navigate(config.clone(), NavAction::Jump(step.clone()), step.clone(), false)
}
