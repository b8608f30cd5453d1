use std::cell::RefCell;
use std::collections::VecDeque;

use quickstart_wizard::accordion::{AccordionNode, Control};
use quickstart_wizard::credentials::{CredentialValidator, Provider, page_requirements};
use quickstart_wizard::flags::fields;
use quickstart_wizard::images::ImageManager;
use quickstart_wizard::libraries::{LibrariesPage, LibraryCard, Placeholder};
use quickstart_wizard::storage::MemoryStorage;
use quickstart_wizard::{Reply, Result, Tone, Transport, WizardConfig, WizardError};
use serde_json::{Value, json};

/// Serves canned replies and remembers request paths.
#[derive(Default)]
struct CannedTransport {
    replies: RefCell<VecDeque<Reply>>,
    paths: RefCell<Vec<String>>,
}

impl CannedTransport {
    fn with(replies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().map(Reply::ok).collect()),
            paths: RefCell::default(),
        }
    }

    fn next(&self, path: &str) -> Result<Reply> {
        self.paths.borrow_mut().push(path.to_string());
        Ok(self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Reply::ok(Value::Null)))
    }
}

impl Transport for CannedTransport {
    type Upload = ();

    async fn get(&self, path: &str) -> Result<Reply> {
        self.next(path)
    }

    async fn post_json(&self, path: &str, _body: &Value) -> Result<Reply> {
        self.next(path)
    }

    async fn post_form(&self, path: &str, _fields: &[(String, String)]) -> Result<Reply> {
        self.next(path)
    }

    async fn post_multipart(
        &self,
        path: &str,
        _file_field: &str,
        _upload: &(),
        _fields: &[(String, String)],
    ) -> Result<Reply> {
        self.next(path)
    }

    async fn delete(&self, path: &str) -> Result<Reply> {
        self.next(path)
    }
}

fn movie_card(style: &str, placeholder: &str) -> LibraryCard {
    let mut card = LibraryCard::new("mov-library_movies", "Movies");
    card.checked = true;
    card.accordion = vec![
        AccordionNode::new("mov-library_movies-collections", "Collections").with_child(
            AccordionNode::new("mov-library_movies-awards", "Award Collections")
                .with_control(Control::toggle(true)),
        ),
        AccordionNode::new("mov-library_movies-templates", "Template Variables").with_child(
            AccordionNode::new("mov-library_movies-placeholder", "Placeholder IMDb ID")
                .with_control(Control::select(placeholder)),
        ),
    ];
    card.separator_style = style.to_string();
    card.placeholder = Some(Placeholder {
        node_key: "mov-library_movies-placeholder".to_string(),
        value: placeholder.to_string(),
    });
    card
}

#[test]
fn libraries_page_follows_separator_placeholder() {
    let mut show = LibraryCard::new("sho-library_tvshows", "TV Shows");
    show.accordion = vec![AccordionNode::new("sho-library_tvshows-overlays", "Overlays")];

    let page = LibrariesPage {
        plex_valid: true,
        cards: vec![movie_card("none", ""), show.clone()],
    };
    let evaluation = page.evaluate();
    assert!(evaluation.valid);
    assert_eq!(evaluation.libraries_value, "Movies");
    assert!(evaluation.nav.previous && evaluation.nav.next);

    let page = LibrariesPage {
        plex_valid: true,
        cards: vec![movie_card("gray", ""), show],
    };
    let evaluation = page.evaluate();
    assert!(!evaluation.valid);
    assert!(evaluation.nav.previous);
    assert!(!evaluation.nav.next);
    assert_eq!(
        evaluation.invalid_placeholders,
        vec!["mov-library_movies-placeholder".to_string()]
    );
    assert!(evaluation.highlights.get("mov-library_movies-templates").invalid);
    assert_eq!(evaluation.flag_value(), "false");
}

#[tokio::test]
async fn radarr_round_trip_fills_dropdowns_and_resets_on_edit() {
    let transport = CannedTransport::with([json!({
        "valid": true,
        "root_folders": [{"path": "/movies"}, {"path": "/archive"}],
        "quality_profiles": [{"name": "HD-1080p"}],
    })]);
    let saved = fields([
        ("radarr_url", "http://radarr:7878"),
        ("radarr_token", "abc"),
        ("radarr_root_folder_path", "/archive"),
        ("radarr_quality_profile", "Gone"),
    ]);
    let mut validator = CredentialValidator::new(Provider::Radarr, "false");
    let outcome = validator.validate(&transport, &saved).await;

    assert!(outcome.validated);
    assert!(!validator.button_enabled());
    assert_eq!(outcome.dropdowns[0].selected, "/archive");
    assert_eq!(outcome.dropdowns[1].selected, "");
    assert_eq!(transport.paths.borrow().as_slice(), ["/validate_radarr"]);

    let blank_profile = fields([("radarr_root_folder_path", "/archive")]);
    assert_eq!(
        page_requirements(Provider::Radarr, true, &blank_profile),
        vec!["Please select a valid Quality Profile.".to_string()]
    );

    validator.input_edited();
    assert_eq!(validator.flag_value(), "false");
    assert!(validator.button_enabled());
}

#[tokio::test]
async fn tmdb_rejection_keeps_flag_false() {
    let transport = CannedTransport::with([json!({"valid": false})]);
    let mut validator = CredentialValidator::new(Provider::Tmdb, "false");
    let outcome = validator
        .validate(&transport, &fields([("tmdb_apikey", "bad")]))
        .await;
    assert!(!outcome.validated);
    assert_eq!(outcome.message.tone, Tone::Error);
    assert!(validator.button_enabled());
    assert!(
        outcome
            .updates
            .contains(&("tmdb_validated".to_string(), "false".to_string()))
    );
}

#[tokio::test]
async fn sentinel_image_is_never_sent() {
    let transport = CannedTransport::default();
    let config = WizardConfig::default();
    let storage = MemoryStorage::new();
    let manager = ImageManager::new(
        &config,
        &storage,
        "mov-library_movies",
        quickstart_wizard::MediaKind::Movie,
    );
    let err = manager.delete(&transport, "default").await.unwrap_err();
    assert!(matches!(err, WizardError::SentinelImage(_)));
    let err = manager
        .rename(&transport, "default", "poster")
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::SentinelImage(_)));
    assert!(transport.paths.borrow().is_empty());
}
