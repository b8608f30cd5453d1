use std::cell::RefCell;
use std::rc::Rc;

use quickstart_wizard::api;
use quickstart_wizard::credentials::{
    CredentialValidator, Provider, ValidationOutcome, page_requirements, tmdb_dropdowns,
};
use quickstart_wizard::flags::{FieldSource, parse_flag};
use quickstart_wizard::{StatusMessage, WizardConfig};
use tracing::debug;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;

use crate::dom::{self, PageFields, by_id, listen_id, set_value, show_status, value_of};
use crate::http::FetchTransport;
use crate::pages::navigation;

const STATUS_ID: &str = "statusMessage";

pub type SharedValidator = Rc<RefCell<CredentialValidator>>;

/// `spinner_<name>`, named after the page flag (`tmdb_validated` → `spinner_tmdb`).
fn spinner_id(provider: Provider) -> String {
    let flag = provider.spec().flag_id;
    format!("spinner_{}", flag.strip_suffix("_validated").unwrap_or(flag))
}

/// Selections saved server-side before dropdowns are repopulated; the page
/// renders them in `data-saved-value`.
struct SavedSelections;

impl FieldSource for SavedSelections {
    fn field(&self, id: &str) -> Option<String> {
        by_id::<Element>(id)
            .and_then(|select| select.get_attribute("data-saved-value"))
            .filter(|saved| !saved.trim().is_empty())
            .or_else(|| value_of(id))
    }
}

fn sync_button(validator: &CredentialValidator) {
    let spec = validator.spec();
    dom::set_disabled(spec.button_id, !validator.button_enabled());
    set_value(spec.flag_id, validator.flag_value());
}

fn apply_outcome(config: &WizardConfig, validator: &CredentialValidator, outcome: &ValidationOutcome) {
    for (id, value) in &outcome.updates {
        set_value(id, value);
    }
    for fill in &outcome.dropdowns {
        dom::fill_select(&fill.select_id, &fill.options, &fill.selected);
    }
    show_status(STATUS_ID, &outcome.message, config);
    sync_button(validator);
    refresh_page(config, validator.spec().provider);
}

/// Page-level validity beyond the credential itself.
fn refresh_page(config: &WizardConfig, provider: Provider) {
    let validated = value_of(provider.spec().flag_id).is_some_and(|flag| parse_flag(&flag));
    if provider == Provider::Tmdb {
        let (valid, messages) = tmdb_dropdowns(validated, &PageFields);
        for (id, message) in ["regionStatusMessage", "languageStatusMessage"]
            .into_iter()
            .zip(&messages)
        {
            show_status(id, message, config);
        }
        navigation::set_page_valid(valid);
    }
}

fn run_validation(config: Rc<WizardConfig>, validator: SharedValidator) {
    let begun = validator.borrow_mut().begin(&PageFields);
    let payload = match begun {
        Ok(payload) => payload,
        Err(err) => {
            let message = validator.borrow().refusal_message(&err);
            show_status(STATUS_ID, &message, &config);
            return;
        }
    };
    let spec = validator.borrow().spec();
    let spinner = spinner_id(spec.provider);
    sync_button(&validator.borrow());
    dom::set_display(&spinner, "inline-block");
    show_status(STATUS_ID, &StatusMessage::info("Validating..."), &config);
    spawn_local(async move {
        let result = api::validate(&FetchTransport, spec.endpoint, &payload).await;
        let outcome = validator.borrow_mut().complete(result, &SavedSelections);
        dom::set_display(&spinner, "none");
        apply_outcome(&config, &validator.borrow(), &outcome);
    });
}

/// Reloads dependent dropdowns for an already validated credential without
/// touching its status line.
fn refetch_dropdowns(validator: SharedValidator) {
    let spec = validator.borrow().spec();
    let begun = validator.borrow_mut().begin(&PageFields);
    let Ok(payload) = begun else {
        return;
    };
    spawn_local(async move {
        let result = api::validate(&FetchTransport, spec.endpoint, &payload).await;
        let outcome = validator.borrow_mut().complete(result, &SavedSelections);
        for fill in &outcome.dropdowns {
            dom::fill_select(&fill.select_id, &fill.options, &fill.selected);
        }
        sync_button(&validator.borrow());
        debug!("refreshed {} dropdowns", spec.name);
    });
}

pub fn init(config: Rc<WizardConfig>, provider: Provider) -> SharedValidator {
    let spec = provider.spec();
    let initial = value_of(spec.flag_id).unwrap_or_default();
    let validator = Rc::new(RefCell::new(CredentialValidator::new(provider, &initial)));
    sync_button(&validator.borrow());

    for credential in spec.fields {
        let validator = validator.clone();
        let config = config.clone();
        listen_id(credential.input_id, "input", move |_| {
            validator.borrow_mut().input_edited();
            sync_button(&validator.borrow());
            refresh_page(&config, provider);
        });
    }

    {
        let validator = validator.clone();
        let config = config.clone();
        listen_id(spec.button_id, "click", move |event| {
            event.prevent_default();
            run_validation(config.clone(), validator.clone());
        });
    }

    if provider == Provider::Tmdb {
        for id in ["tmdb_region", "tmdb_language"] {
            let config = config.clone();
            listen_id(id, "change", move |_| refresh_page(&config, provider));
        }
    }

    if !spec.dropdowns.is_empty() {
        let status_config = config.clone();
        navigation::set_submit_guard(move || {
            let validated = value_of(spec.flag_id).is_some_and(|flag| parse_flag(&flag));
            let missing = page_requirements(provider, validated, &PageFields);
            if missing.is_empty() {
                return true;
            }
            show_status(STATUS_ID, &StatusMessage::error(missing.join(" ")), &status_config);
            false
        });
        if validator.borrow().is_validated() {
            refetch_dropdowns(validator.clone());
        }
    }

    refresh_page(&config, provider);
    validator
}
