use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use quickstart_wizard::{WizardConfig, WizardError};
use quickstart_wizard::api::MediaKind;
use quickstart_wizard::images::{
    BaseImages, ContentRatingGroup, ImageChoices, ImageIds, ImageManager, collect_overlays,
    content_rating_hidden_name, controls_visible, failure_toast, library_id_from_rating_radio,
};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, File, HtmlImageElement, HtmlInputElement, HtmlSelectElement};

use crate::dom::{self, by_id, listen, listen_id, query_all, set_display, value_of};
use crate::http::FetchTransport;
use crate::pages::libraries;
use crate::storage::BrowserStorage;

thread_local! {
    static PENDING_PREVIEWS: RefCell<BTreeMap<String, Timeout>> = const { RefCell::new(BTreeMap::new()) };
    static RATING_GROUPS: RefCell<BTreeMap<String, ContentRatingGroup>> = const { RefCell::new(BTreeMap::new()) };
}

enum ImageOp {
    Upload(File),
    Fetch(String),
    Rename { from: String, to: String },
    Delete(String),
}

/// One library card's image controls.
#[derive(Clone)]
struct Card {
    config: Rc<WizardConfig>,
    library_id: String,
    kind: MediaKind,
}

impl Card {
    fn ids(&self) -> ImageIds {
        ImageIds::for_library(&self.library_id)
    }

    fn show_choices(&self, choices: &ImageChoices) {
        let ids = self.ids();
        dom::fill_select(&ids.dropdown, &choices.options, &choices.selected);
        self.sync_controls();
    }

    fn sync_controls(&self) {
        let ids = self.ids();
        let Some(dropdown) = by_id::<HtmlSelectElement>(&ids.dropdown) else {
            return;
        };
        let display = if controls_visible(
            &self.config,
            dropdown.length() as usize,
            &dropdown.value(),
        ) {
            "inline-block"
        } else {
            "none"
        };
        set_display(&ids.delete_button, display);
        set_display(&ids.rename_button, display);
    }

    fn checked_overlays(&self) -> Vec<String> {
        query_all(&format!(
            "#{} input[type=\"checkbox\"]:checked",
            self.ids().overlays_container
        ))
        .into_iter()
        .filter_map(|input| input.get_attribute("name"))
        .collect()
    }

    fn content_rating(&self) -> Option<String> {
        query_all(&format!(
            "input[name=\"{}\"]",
            content_rating_hidden_name(&self.library_id)
        ))
        .first()
        .and_then(dom::element_value)
    }

    /// Store-and-reload operations share their reporting.
    fn run(&self, op: ImageOp) {
        let card = self.clone();
        spawn_local(async move {
            let storage = BrowserStorage;
            let manager = ImageManager::new(&card.config, &storage, &card.library_id, card.kind);
            let result = match &op {
                ImageOp::Upload(file) => manager.upload(&FetchTransport, file).await,
                ImageOp::Fetch(url) => manager.fetch_url(&FetchTransport, url).await,
                ImageOp::Rename { from, to } => manager.rename(&FetchTransport, from, to).await,
                ImageOp::Delete(name) => manager.delete(&FetchTransport, name).await,
            };
            match result {
                Ok((message, choices)) => {
                    dom::toast(&message);
                    card.show_choices(&choices);
                    card.schedule_preview();
                }
                Err(err) => dom::toast(&failure_toast(&err)),
            }
        });
    }

    fn reload(&self) {
        let card = self.clone();
        spawn_local(async move {
            let storage = BrowserStorage;
            let manager = ImageManager::new(&card.config, &storage, &card.library_id, card.kind);
            match manager.list(&FetchTransport).await {
                Ok(choices) => {
                    card.show_choices(&choices);
                    card.schedule_preview();
                }
                Err(err) => dom::toast(&failure_toast(&err)),
            }
        });
    }

    /// Coalesces bursts of overlay clicks into one render. Replacing the
    /// pending timeout cancels it.
    fn schedule_preview(&self) {
        let card = self.clone();
        let delay = self.config.preview_debounce_ms;
        let pending = Timeout::new(delay, move || card.render_preview());
        PENDING_PREVIEWS.with(|slot| {
            slot.borrow_mut().insert(self.library_id.clone(), pending);
        });
    }

    fn render_preview(&self) {
        let overlays = collect_overlays(
            &self.library_id,
            self.kind,
            &self.checked_overlays(),
            self.content_rating().as_deref(),
        );
        let selected = value_of(&self.ids().dropdown).unwrap_or_default();
        let card = self.clone();
        spawn_local(async move {
            let storage = BrowserStorage;
            let manager = ImageManager::new(&card.config, &storage, &card.library_id, card.kind);
            let stamp = js_sys::Date::now() as u64;
            match manager
                .generate_preview(&FetchTransport, overlays, &selected, stamp)
                .await
            {
                Ok(url) => {
                    if let Some(image) = by_id::<HtmlImageElement>(&card.ids().preview_image) {
                        image.set_src(&url);
                    }
                }
                Err(err) => dom::toast(&failure_toast(&err)),
            }
        });
    }

    fn bind(&self) {
        let ids = self.ids();

        let card = self.clone();
        listen_id(&ids.dropdown, "change", move |_| {
            let selected = value_of(&card.ids().dropdown).unwrap_or_default();
            ImageManager::new(&card.config, &BrowserStorage, &card.library_id, card.kind)
                .remember(&selected);
            card.sync_controls();
            card.schedule_preview();
        });

        let card = self.clone();
        listen_id(&ids.upload_input, "change", move |event| {
            let Some(input) = dom::event_element(&event)
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            card.run(ImageOp::Upload(file));
        });

        let card = self.clone();
        listen_id(&ids.fetch_button, "click", move |event| {
            event.prevent_default();
            let url_input = card.ids().url_input;
            let url = value_of(&url_input).unwrap_or_default();
            dom::set_value(&url_input, "");
            card.run(ImageOp::Fetch(url));
        });

        let card = self.clone();
        listen_id(&ids.rename_button, "click", move |event| {
            event.prevent_default();
            let old_name = value_of(&card.ids().dropdown).unwrap_or_default();
            if card.config.is_sentinel_image(&old_name) {
                dom::toast(&failure_toast(&WizardError::SentinelImage(old_name)));
                return;
            }
            let stem = old_name
                .rsplit_once('.')
                .map_or(old_name.as_str(), |(stem, _)| stem);
            let Some(new_name) = web_sys::window()
                .and_then(|window| {
                    window
                        .prompt_with_message_and_default("Enter a new name for the image", stem)
                        .ok()
                })
                .flatten()
            else {
                return;
            };
            card.run(ImageOp::Rename {
                from: old_name,
                to: new_name,
            });
        });

        let card = self.clone();
        listen_id(&ids.delete_button, "click", move |event| {
            event.prevent_default();
            let name = value_of(&card.ids().dropdown).unwrap_or_default();
            if card.config.is_sentinel_image(&name) {
                dom::toast(&failure_toast(&WizardError::SentinelImage(name)));
                return;
            }
            if !dom::confirm(&format!("Delete {name}? This cannot be undone.")) {
                return;
            }
            card.run(ImageOp::Delete(name));
        });

        for input in query_all(&format!("#{} input[type=\"checkbox\"]", ids.overlays_container)) {
            let card = self.clone();
            listen(&input, "change", move |_| card.schedule_preview());
        }
    }
}

fn rating_radios() -> Vec<Element> {
    query_all("input[type=\"radio\"][id*=\"-overlay_content_rating_\"]")
}

fn bind_content_ratings(cards: &BTreeMap<String, Card>) {
    for radio in rating_radios() {
        let radio_id = radio.id();
        let Some(library_id) = library_id_from_rating_radio(&radio_id).map(str::to_string) else {
            continue;
        };
        let Some(card) = cards.get(&library_id).cloned() else {
            continue;
        };
        RATING_GROUPS.with(|groups| {
            groups
                .borrow_mut()
                .entry(library_id.clone())
                .or_insert_with(|| ContentRatingGroup::new(card.content_rating().as_deref()));
        });
        listen(&radio, "click", move |event| {
            let Some(clicked) = dom::event_element(&event).and_then(|node| dom::element_value(&node))
            else {
                return;
            };
            let selected = RATING_GROUPS.with(|groups| {
                let mut groups = groups.borrow_mut();
                let group = groups.entry(library_id.clone()).or_default();
                group.click(&clicked);
                group.selected().map(str::to_string)
            });
            for other in rating_radios() {
                if library_id_from_rating_radio(&other.id()) != Some(library_id.as_str()) {
                    continue;
                }
                if let Ok(input) = other.dyn_into::<HtmlInputElement>() {
                    input.set_checked(selected.as_deref() == Some(input.value().as_str()));
                }
            }
            for hidden in query_all(&format!(
                "input[name=\"{}\"]",
                content_rating_hidden_name(&library_id)
            )) {
                if let Ok(input) = hidden.dyn_into::<HtmlInputElement>() {
                    input.set_value(selected.as_deref().unwrap_or_default());
                }
            }
            debug!("content rating for {library_id}: {selected:?}");
            // Unchecking from code fires no change event.
            libraries::refresh(&card.config);
            card.schedule_preview();
        });
    }
}

fn base_id(kind: MediaKind, part: &str) -> String {
    format!("{}-base-image-{part}", kind.as_str())
}

fn refresh_base_images(config: Rc<WizardConfig>) {
    spawn_local(async move {
        match BaseImages::new(&config).status(&FetchTransport).await {
            Ok(status) => {
                for (kind, url) in status {
                    if let Some(image) = by_id::<HtmlImageElement>(&base_id(kind, "preview")) {
                        image.set_src(url.as_deref().unwrap_or_default());
                    }
                    let display = if url.is_some() { "inline-block" } else { "none" };
                    set_display(&base_id(kind, "preview"), display);
                    set_display(&base_id(kind, "delete"), display);
                }
            }
            Err(err) => dom::toast(&failure_toast(&err)),
        }
    });
}

fn bind_base_images(config: Rc<WizardConfig>) {
    for kind in [MediaKind::Movie, MediaKind::Show] {
        let upload_config = config.clone();
        listen_id(&base_id(kind, "upload"), "change", move |event| {
            let Some(input) = dom::event_element(&event)
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            let config = upload_config.clone();
            spawn_local(async move {
                let result = BaseImages::new(&config)
                    .upload(&FetchTransport, &file, kind)
                    .await;
                match result {
                    Ok(message) => dom::toast(&message),
                    Err(err) => dom::toast(&failure_toast(&err)),
                }
                refresh_base_images(config);
            });
        });

        let delete_config = config.clone();
        listen_id(&base_id(kind, "delete"), "click", move |event| {
            event.prevent_default();
            if !dom::confirm(&format!("Delete the {} base image?", kind.as_str())) {
                return;
            }
            let config = delete_config.clone();
            spawn_local(async move {
                match BaseImages::new(&config).delete(&FetchTransport, kind).await {
                    Ok(message) => dom::toast(&message),
                    Err(err) => dom::toast(&failure_toast(&err)),
                }
                refresh_base_images(config);
            });
        });
    }
    refresh_base_images(config);
}

pub fn init(config: Rc<WizardConfig>) {
    let mut cards = BTreeMap::new();
    for container in query_all("[id$='-card-container']") {
        let id = container.id();
        let Some(library_id) = id.strip_suffix("-card-container") else {
            continue;
        };
        let Some(kind) = MediaKind::from_library_id(library_id) else {
            continue;
        };
        let card = Card {
            config: config.clone(),
            library_id: library_id.to_string(),
            kind,
        };
        card.bind();
        card.reload();
        cards.insert(card.library_id.clone(), card);
    }
    debug!("image controls bound for {} libraries", cards.len());
    bind_content_ratings(&cards);
    bind_base_images(config);
}
