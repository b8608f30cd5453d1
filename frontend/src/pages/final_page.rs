use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::navigation::{FinalMarkers, FinalReadiness};
use tracing::info;
use web_sys::Element;

use crate::dom::{self, by_id};
use crate::pages::navigation;

const MESSAGE_ID: &str = "validation-messages";

fn marker(id: &str, attribute: &str) -> String {
    by_id::<Element>(id)
        .and_then(|element| element.get_attribute(attribute))
        .unwrap_or_default()
}

pub fn read_markers() -> FinalMarkers {
    FinalMarkers {
        plex: marker("plex_valid", "data-plex-valid"),
        tmdb: marker("tmdb_valid", "data-tmdb-valid"),
        libraries: marker("libs_valid", "data-libs-valid"),
        settings: marker("sett_valid", "data-sett-valid"),
        yaml: marker("yaml_valid", "data-yaml-valid"),
    }
}

pub fn init(config: Rc<WizardConfig>) {
    let readiness = FinalReadiness::evaluate(&read_markers());
    info!(
        "final page: show_yaml={} missing={}",
        readiness.show_yaml,
        readiness.missing.len()
    );
    if !readiness.show_yaml {
        let lines = readiness
            .missing
            .iter()
            .map(|link| {
                (
                    (link.before.clone(), link.label.clone(), link.after.clone()),
                    navigation::jump_handler(config.clone(), link.step.clone()),
                )
            })
            .collect();
        dom::show_link_lines(MESSAGE_ID, lines, "alert-danger");
    }
    for (id, visible) in readiness.visibility() {
        dom::set_visible(id, visible);
    }
}
