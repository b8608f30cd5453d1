use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::credentials::Provider;
use quickstart_wizard::oauth::{AuthorizeButtons, mal_authorize_url, trakt_authorize_url};
use tracing::debug;

use crate::dom::{listen_id, set_disabled, set_value, value_of};
use crate::pages::credentials::SharedValidator;

/// Element ids of one authorize flow.
struct FlowIds {
    client_id: &'static str,
    authorize_url: &'static str,
    open_button: &'static str,
    code: &'static str,
    validate_button: &'static str,
    flag: &'static str,
}

static TRAKT: FlowIds = FlowIds {
    client_id: "trakt_client_id",
    authorize_url: "trakt_url",
    open_button: "trakt_open_url",
    code: "trakt_pin",
    validate_button: "validate_trakt_pin",
    flag: "trakt_validated",
};

static MAL: FlowIds = FlowIds {
    client_id: "mal_client_id",
    authorize_url: "mal_url",
    open_button: "mal_get_localhost_url",
    code: "mal_localhost_url",
    validate_button: "validate_mal_url",
    flag: "mal_validated",
};

fn sync_buttons(ids: &FlowIds, validator: &SharedValidator) {
    let buttons = AuthorizeButtons::evaluate(
        &value_of(ids.authorize_url).unwrap_or_default(),
        &value_of(ids.code).unwrap_or_default(),
        validator.borrow().is_validated(),
    );
    set_disabled(ids.open_button, !buttons.open_url);
    set_disabled(
        ids.validate_button,
        !buttons.validate || validator.borrow().is_in_flight(),
    );
}

fn rebuild_url(config: &WizardConfig, provider: Provider, ids: &FlowIds, validator: &SharedValidator) {
    let client_id = value_of(ids.client_id).unwrap_or_default();
    let url = match provider {
        Provider::Mal => mal_authorize_url(
            config,
            &client_id,
            &value_of("mal_code_verifier").unwrap_or_default(),
        ),
        _ => trakt_authorize_url(config, &client_id),
    };
    if url.is_some() {
        validator.borrow_mut().reset();
        set_value(ids.flag, validator.borrow().flag_value());
    }
    debug!("authorize url {}", url.as_deref().unwrap_or("<none>"));
    set_value(ids.authorize_url, url.as_deref().unwrap_or_default());
    sync_buttons(ids, validator);
}

pub fn init(config: Rc<WizardConfig>, provider: Provider, validator: SharedValidator) {
    let ids = match provider {
        Provider::Trakt => &TRAKT,
        Provider::Mal => &MAL,
        _ => return,
    };

    {
        let config = config.clone();
        let validator = validator.clone();
        listen_id(ids.client_id, "input", move |_| {
            rebuild_url(&config, provider, ids, &validator);
        });
    }

    listen_id(ids.open_button, "click", move |event| {
        event.prevent_default();
        let url = value_of(ids.authorize_url).unwrap_or_default();
        if url.is_empty() {
            return;
        }
        if let Some(window) = web_sys::window() {
            let _ = window.open_with_url_and_target(&url, "_blank");
        }
    });

    for id in [ids.code, ids.validate_button] {
        let validator = validator.clone();
        let event = if id == ids.code { "input" } else { "click" };
        listen_id(id, event, move |_| sync_buttons(ids, &validator));
    }

    sync_buttons(ids, &validator);
}
