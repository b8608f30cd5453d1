//! Per-page bindings. Each page is recognised by the elements it renders,
//! so one bundle serves every wizard step.

use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::credentials::{PROVIDERS, Provider};
use quickstart_wizard::libraries::{LIBRARIES_FLAG, PLAYLIST_FILES_FLAG};
use quickstart_wizard::settings::SETTINGS_FLAG;
use quickstart_wizard::webhooks;
use tracing::debug;
use web_sys::Element;

use crate::dom::by_id;

pub mod credentials;
pub mod editors;
pub mod final_page;
pub mod images;
pub mod libraries;
pub mod navigation;
pub mod oauth;
pub mod playlist;
pub mod secrets;
pub mod settings;
pub mod start;
pub mod webhooks_page;

fn has(id: &str) -> bool {
    by_id::<Element>(id).is_some()
}

pub fn init(config: Rc<WizardConfig>) {
    navigation::init(config.clone());
    secrets::init();

    for spec in PROVIDERS {
        if !has(spec.flag_id) || !has(spec.button_id) {
            continue;
        }
        debug!("binding {} validation", spec.name);
        let validator = credentials::init(config.clone(), spec.provider);
        if matches!(spec.provider, Provider::Trakt | Provider::Mal) {
            oauth::init(config.clone(), spec.provider, validator);
        }
    }

    if has(webhooks::FLAG_ID) {
        webhooks_page::init();
    }
    if has(LIBRARIES_FLAG) {
        editors::init(config.clone());
        images::init(config.clone());
        libraries::init(config.clone());
    }
    if has(PLAYLIST_FILES_FLAG) {
        playlist::init(config.clone());
    }
    if has(SETTINGS_FLAG) {
        settings::init(config.clone());
    }
    if has("yaml_valid") {
        final_page::init(config);
    }
    if start::present() {
        start::init();
    }
}
