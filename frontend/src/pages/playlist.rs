//! Playlist files page: which libraries the default playlists cover.

use std::cell::RefCell;
use std::rc::Rc;

use quickstart_wizard::WizardConfig;
use quickstart_wizard::flags::flag_value;
use quickstart_wizard::libraries::{LIBRARIES_INPUT, PLAYLIST_FILES_FLAG, PlaylistLibraries};
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;

use crate::dom::{self, listen, query_all, set_display, set_value, value_of};
use crate::pages::{libraries, navigation};

const MESSAGE_ID: &str = "validation-messages";
const CONTAINER_ID: &str = "libraries-container";

fn checkboxes() -> Vec<HtmlInputElement> {
    query_all(".library-checkbox")
        .into_iter()
        .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
        .collect()
}

fn sync(page: &PlaylistLibraries) {
    set_value(LIBRARIES_INPUT, &page.value());
    set_value(PLAYLIST_FILES_FLAG, flag_value(page.is_valid()));
    debug!("playlist libraries: {}", page.value());
}

pub fn init(config: Rc<WizardConfig>) {
    let boxes = checkboxes();
    let page = PlaylistLibraries::new(
        libraries::plex_valid(),
        boxes.iter().map(HtmlInputElement::value).collect(),
        &value_of(LIBRARIES_INPUT).unwrap_or_default(),
    );
    for checkbox in &boxes {
        checkbox.set_checked(page.is_checked(&checkbox.value()));
    }

    match page.gate() {
        Some(gate) => {
            set_display(CONTAINER_ID, "none");
            dom::show_link_message(
                MESSAGE_ID,
                (gate.before.as_str(), gate.label.as_str(), gate.after.as_str()),
                "alert-danger",
                navigation::jump_handler(config, gate.step.clone()),
            );
        }
        None => {
            set_display(CONTAINER_ID, "block");
            set_display(MESSAGE_ID, "none");
        }
    }

    let page = Rc::new(RefCell::new(page));
    for checkbox in boxes {
        let page = page.clone();
        let checkbox_ref = checkbox.clone();
        listen(&checkbox, "change", move |_| {
            let mut page = page.borrow_mut();
            page.toggle(&checkbox_ref.value(), checkbox_ref.checked());
            sync(&page);
        });
    }
}
