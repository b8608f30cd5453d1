use std::cell::RefCell;
use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::flags::flag_value;
use quickstart_wizard::settings::{
    ALL_USERS, ASSET_DIRECTORY, AssetDirectories, EXCLUDE_USERS_INPUT, FieldCheck, RULES,
    SETTINGS_FLAG, SYNC_USERS_INPUT, SettingsReport, SettingsValidator, exclude_users_value,
    picker_states, sync_users_value,
};
use tracing::{debug, error};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::dom::{self, by_id, listen, listen_id, query_all, set_value, show_status, value_of};
use crate::pages::navigation;

const MESSAGE_ID: &str = "validation-messages";
const ASSET_CONTAINER_ID: &str = "asset_directory_container";

fn asset_inputs() -> Vec<HtmlInputElement> {
    query_all(&format!("input[name=\"{ASSET_DIRECTORY}\"]"))
        .into_iter()
        .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
        .collect()
}

/// `(rule id, value)` for every rule field on the page, asset rows in order.
fn page_fields() -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for rule in RULES {
        if rule.id == ASSET_DIRECTORY {
            fields.extend(
                asset_inputs()
                    .into_iter()
                    .map(|input| (ASSET_DIRECTORY.to_string(), input.value())),
            );
        } else if let Some(value) = value_of(rule.id) {
            fields.push((rule.id.to_string(), value));
        }
    }
    fields
}

fn field_element(check: &FieldCheck) -> Option<HtmlElement> {
    if check.id == ASSET_DIRECTORY {
        return asset_inputs()
            .into_iter()
            .nth(check.index)
            .map(|input| input.unchecked_into::<HtmlElement>());
    }
    by_id::<HtmlElement>(&check.id)
}

fn error_slot(field: &HtmlElement) -> Option<Element> {
    let parent = field.parent_element()?;
    if let Ok(Some(existing)) = parent.query_selector(".error-message") {
        return Some(existing);
    }
    let slot = dom::web_document()?.create_element("div").ok()?;
    slot.set_class_name("error-message text-danger");
    parent.append_child(&slot).ok()?;
    Some(slot)
}

/// Opens a collapsed accordion section so the flagged field is visible.
fn reveal(field: &HtmlElement) {
    let Some(collapse) = field.closest(".accordion-collapse").ok().flatten() else {
        return;
    };
    if collapse.class_list().contains("show") {
        return;
    }
    if let Some(button) = collapse
        .previous_element_sibling()
        .and_then(|header| header.query_selector("button.accordion-button").ok().flatten())
        .and_then(|button| button.dyn_into::<HtmlElement>().ok())
    {
        button.click();
    }
}

fn mark(check: &FieldCheck) {
    let Some(field) = field_element(check) else {
        return;
    };
    let classes = field.class_list();
    match check.error {
        Some(message) => {
            let _ = classes.add_1("is-invalid");
            let _ = classes.remove_1("is-valid");
            if let Some(slot) = error_slot(&field) {
                slot.set_text_content(Some(message));
            }
            reveal(&field);
        }
        None => {
            let _ = classes.remove_1("is-invalid");
            let _ = classes.add_1("is-valid");
            if let Some(slot) = error_slot(&field) {
                slot.set_text_content(Some(""));
            }
        }
    }
}

fn validate(validator: &SettingsValidator, config: &WizardConfig) -> SettingsReport {
    let report = validator.validate_page(&page_fields());
    for check in &report.checks {
        mark(check);
    }
    show_status(MESSAGE_ID, &report.message, config);
    debug!("settings: {} invalid fields", report.errors().count());
    report
}

fn mark_unvalidated() {
    set_value(SETTINGS_FLAG, flag_value(false));
}

fn row_index(group: &Element) -> Option<usize> {
    let container = by_id::<Element>(ASSET_CONTAINER_ID)?;
    dom::query_within(&container, ".input-group")
        .iter()
        .position(|row| row.is_same_node(Some(group)))
}

fn bind_asset_row(
    input: &HtmlInputElement,
    validator: &Rc<SettingsValidator>,
    config: &Rc<WizardConfig>,
    rows: &Rc<RefCell<AssetDirectories>>,
) {
    let (validator, config, rows) = (validator.clone(), config.clone(), rows.clone());
    let input_ref = input.clone();
    listen(input, "input", move |_| {
        if let Some(index) = input_ref
            .closest(".input-group")
            .ok()
            .flatten()
            .and_then(|group| row_index(&group))
        {
            rows.borrow_mut().set(index, &input_ref.value());
        }
        validate(&validator, &config);
    });
}

fn bind_assets(validator: Rc<SettingsValidator>, config: Rc<WizardConfig>) {
    let rows = Rc::new(RefCell::new(AssetDirectories::new(
        asset_inputs().iter().map(HtmlInputElement::value).collect(),
    )));
    for input in asset_inputs() {
        bind_asset_row(&input, &validator, &config, &rows);
    }

    {
        let (validator, config, rows) = (validator.clone(), config.clone(), rows.clone());
        listen_id("add-asset-directory", "click", move |event| {
            event.prevent_default();
            let Some(container) = by_id::<Element>(ASSET_CONTAINER_ID) else {
                return;
            };
            let Some(group) = dom::web_document().and_then(|doc| doc.create_element("div").ok())
            else {
                return;
            };
            group.set_class_name("input-group mb-2");
            group.set_inner_html(&format!(
                "<input type=\"text\" class=\"form-control\" name=\"{ASSET_DIRECTORY}\" placeholder=\"Add Asset Directory\">\
                 <button class=\"btn btn-danger remove-asset-directory\" type=\"button\">Remove</button>"
            ));
            if container.append_child(&group).is_err() {
                return;
            }
            let index = rows.borrow_mut().add_row();
            debug!("asset directory row {index} added");
            if let Some(input) = group
                .query_selector("input")
                .ok()
                .flatten()
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            {
                bind_asset_row(&input, &validator, &config, &rows);
            }
        });
    }

    listen_id(ASSET_CONTAINER_ID, "click", move |event| {
        let Some(target) = dom::event_element(&event) else {
            return;
        };
        if !target.class_list().contains("remove-asset-directory") {
            return;
        }
        let Some(group) = target.closest(".input-group").ok().flatten() else {
            return;
        };
        if let Some(index) = row_index(&group) {
            rows.borrow_mut().remove_row(index);
        }
        group.remove();
        validate(&validator, &config);
    });
}

fn toggles(modal: &str, toggle_class: &str) -> Vec<HtmlInputElement> {
    query_all(&format!("#{modal} .{toggle_class}"))
        .into_iter()
        .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
        .collect()
}

fn checked_values(form_id: &str) -> Vec<String> {
    query_all(&format!("#{form_id} input[type=\"checkbox\"]:checked"))
        .into_iter()
        .filter_map(|node| dom::element_value(&node))
        .collect()
}

/// Checks the modal's toggles from the saved comma list when it opens.
fn bind_picker(modal: &'static str, input_id: &'static str, toggle_class: &'static str) {
    listen_id(modal, "show.bs.modal", move |_| {
        let boxes = toggles(modal, toggle_class);
        let users: Vec<String> = boxes.iter().map(HtmlInputElement::value).collect();
        let (all, states) = picker_states(&value_of(input_id).unwrap_or_default(), &users);
        for (checkbox, checked) in boxes.iter().zip(states) {
            checkbox.set_checked(checked);
        }
        if let Some(all_toggle) = query_all(&format!("#{modal} #sync_all_users"))
            .into_iter()
            .next()
            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
        {
            all_toggle.set_checked(all);
        }
    });
}

fn bind_users() {
    bind_picker("syncUsersModal", SYNC_USERS_INPUT, "sync-user-toggle");
    bind_picker("excludeUsersModal", EXCLUDE_USERS_INPUT, "exclude-user-toggle");

    listen_id("saveSyncChangesButton", "click", |_| {
        let all = dom::is_checked("sync_all_users");
        let checked: Vec<String> = checked_values("syncUserListForm")
            .into_iter()
            .filter(|user| user != ALL_USERS)
            .collect();
        set_value(SYNC_USERS_INPUT, &sync_users_value(all, &checked));
        mark_unvalidated();
    });

    listen_id("saveExcludeChangesButton", "click", |_| {
        set_value(
            EXCLUDE_USERS_INPUT,
            &exclude_users_value(&checked_values("excludeUserListForm")),
        );
        mark_unvalidated();
    });
}

pub fn init(config: Rc<WizardConfig>) {
    let validator = match SettingsValidator::new() {
        Ok(validator) => Rc::new(validator),
        Err(err) => {
            error!("settings rules failed to compile: {err}");
            return;
        }
    };

    for rule in RULES.iter().filter(|rule| rule.id != ASSET_DIRECTORY) {
        let (validator, config) = (validator.clone(), config.clone());
        listen_id(rule.id, "input", move |_| {
            validate(&validator, &config);
        });
    }
    bind_assets(validator.clone(), config.clone());
    bind_users();

    navigation::set_submit_guard(move || {
        let report = validate(&validator, &config);
        set_value(SETTINGS_FLAG, flag_value(report.valid));
        report.valid
    });
}
