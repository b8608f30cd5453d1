//! Click-to-validate credential handling shared by every provider page.
//!
//! Each provider is a row in [`PROVIDERS`]: which inputs it reads, the JSON
//! keys they are posted under, where the validated flag lives and which
//! extra values a successful reply carries back into hidden fields.
//! [`CredentialValidator`] owns one provider's flag and its in-flight guard.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{self, Transport, ValidateReply};
use crate::error::{Result, WizardError};
use crate::flags::{FieldSource, StatusMessage, flag_value, parse_flag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Plex,
    Tmdb,
    Tautulli,
    Github,
    Omdb,
    Mdblist,
    Notifiarr,
    Gotify,
    Ntfy,
    Anidb,
    Radarr,
    Sonarr,
    Trakt,
    Mal,
}

#[derive(Debug)]
pub struct CredentialField {
    pub input_id: &'static str,
    pub payload_key: &'static str,
}

/// A select filled from a list in the validation reply.
#[derive(Debug)]
pub struct DropdownSource {
    pub select_id: &'static str,
    pub reply_key: &'static str,
    pub value_key: &'static str,
    pub label_key: &'static str,
    pub required_message: &'static str,
}

#[derive(Debug)]
pub struct ProviderSpec {
    pub provider: Provider,
    pub name: &'static str,
    pub endpoint: &'static str,
    pub flag_id: &'static str,
    pub button_id: &'static str,
    pub fields: &'static [CredentialField],
    pub required_message: &'static str,
    pub success_message: &'static str,
    pub failure_message: Option<&'static str>,
    pub network_message: &'static str,
    /// `(reply key, hidden input id)` pairs copied on success.
    pub extras: &'static [(&'static str, &'static str)],
    /// Inputs cleared on success.
    pub cleared: &'static [&'static str],
    pub dropdowns: &'static [DropdownSource],
}

const fn field(input_id: &'static str, payload_key: &'static str) -> CredentialField {
    CredentialField {
        input_id,
        payload_key,
    }
}

const fn same(id: &'static str) -> CredentialField {
    field(id, id)
}

const VALIDATE_BUTTON: &str = "validateButton";

const ROOT_FOLDER: &str = "Please select a valid Root Folder Path.";
const QUALITY_PROFILE: &str = "Please select a valid Quality Profile.";
const LANGUAGE_PROFILE: &str = "Please select a valid Language Profile.";

pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        provider: Provider::Plex,
        name: "Plex",
        endpoint: "/validate_plex",
        flag_id: "plex_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("plex_url"), same("plex_token")],
        required_message: "Please enter both Plex URL and Token.",
        success_message: "Plex server validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Plex server.",
        extras: &[
            ("db_cache", "plex_db_cache"),
            ("user_list", "tmp_user_list"),
            ("music_libraries", "tmp_music_libraries"),
            ("movie_libraries", "tmp_movie_libraries"),
            ("show_libraries", "tmp_show_libraries"),
        ],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Tmdb,
        name: "TMDb",
        endpoint: "/validate_tmdb",
        flag_id: "tmdb_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("tmdb_apikey")],
        required_message: "API key cannot be empty.",
        success_message: "API key is valid!",
        failure_message: Some("Failed to validate TMDb. Please check your API Key."),
        network_message: "An error occurred. Please try again.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Tautulli,
        name: "Tautulli",
        endpoint: "/validate_tautulli",
        flag_id: "tautulli_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("tautulli_url"), same("tautulli_apikey")],
        required_message: "Please enter both Tautulli URL and API key.",
        success_message: "Tautulli credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Tautulli credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Github,
        name: "GitHub",
        endpoint: "/validate_github",
        flag_id: "github_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("github_token")],
        required_message: "Please enter a GitHub token.",
        success_message: "GitHub token is valid!",
        failure_message: None,
        network_message: "An error occurred while validating the GitHub token.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Omdb,
        name: "OMDb",
        endpoint: "/validate_omdb",
        flag_id: "omdb_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("omdb_apikey")],
        required_message: "Please enter an OMDb API key.",
        success_message: "OMDb API key is valid",
        failure_message: None,
        network_message: "An error occurred while validating the OMDb API key.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Mdblist,
        name: "MDBList",
        endpoint: "/validate_mdblist",
        flag_id: "mdblist_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("mdblist_apikey")],
        required_message: "Please enter an MDBList API key.",
        success_message: "API key is valid!",
        failure_message: None,
        network_message: "An error occurred while validating the MDBList API key.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Notifiarr,
        name: "Notifiarr",
        endpoint: "/validate_notifiarr",
        flag_id: "notifiarr_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("notifiarr_apikey")],
        required_message: "Please enter a Notifiarr API key.",
        success_message: "API key is valid!",
        failure_message: None,
        network_message: "An error occurred while validating the Notifiarr API key.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Gotify,
        name: "Gotify",
        endpoint: "/validate_gotify",
        flag_id: "gotify_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("gotify_url"), same("gotify_token")],
        required_message: "Please enter both Gotify URL and Token.",
        success_message: "Gotify credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Gotify credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Ntfy,
        name: "ntfy",
        endpoint: "/validate_ntfy",
        flag_id: "ntfy_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("ntfy_url"), same("ntfy_token")],
        required_message: "Please enter both ntfy URL and Token.",
        success_message: "ntfy credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating ntfy credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Anidb,
        name: "AniDB",
        endpoint: "/validate_anidb",
        flag_id: "anidb_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[
            field("anidb_username", "username"),
            field("anidb_password", "password"),
            field("anidb_client", "client"),
            field("anidb_version", "clientver"),
        ],
        required_message: "Please fill in all AniDB fields.",
        success_message: "AniDB credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating AniDB credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Radarr,
        name: "Radarr",
        endpoint: "/validate_radarr",
        flag_id: "radarr_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("radarr_url"), same("radarr_token")],
        required_message: "Please enter both Radarr URL and API key.",
        success_message: "Radarr credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Radarr credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[
            DropdownSource {
                select_id: "radarr_root_folder_path",
                reply_key: "root_folders",
                value_key: "path",
                label_key: "path",
                required_message: ROOT_FOLDER,
            },
            DropdownSource {
                select_id: "radarr_quality_profile",
                reply_key: "quality_profiles",
                value_key: "name",
                label_key: "name",
                required_message: QUALITY_PROFILE,
            },
        ],
    },
    ProviderSpec {
        provider: Provider::Sonarr,
        name: "Sonarr",
        endpoint: "/validate_sonarr",
        flag_id: "sonarr_validated",
        button_id: VALIDATE_BUTTON,
        fields: &[same("sonarr_url"), same("sonarr_token")],
        required_message: "Please enter both Sonarr URL and API key.",
        success_message: "Sonarr credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Sonarr credentials.",
        extras: &[],
        cleared: &[],
        dropdowns: &[
            DropdownSource {
                select_id: "sonarr_root_folder_path",
                reply_key: "root_folders",
                value_key: "path",
                label_key: "path",
                required_message: ROOT_FOLDER,
            },
            DropdownSource {
                select_id: "sonarr_quality_profile",
                reply_key: "quality_profiles",
                value_key: "name",
                label_key: "name",
                required_message: QUALITY_PROFILE,
            },
            DropdownSource {
                select_id: "sonarr_language_profile",
                reply_key: "language_profiles",
                value_key: "name",
                label_key: "name",
                required_message: LANGUAGE_PROFILE,
            },
        ],
    },
    ProviderSpec {
        provider: Provider::Trakt,
        name: "Trakt",
        endpoint: "/validate_trakt",
        flag_id: "trakt_validated",
        button_id: "validate_trakt_pin",
        fields: &[
            same("trakt_client_id"),
            same("trakt_client_secret"),
            same("trakt_pin"),
        ],
        required_message: "ID, secret, and PIN are all required.",
        success_message: "Trakt credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating Trakt credentials.",
        extras: &[
            ("trakt_authorization_access_token", "access_token"),
            ("trakt_authorization_token_type", "token_type"),
            ("trakt_authorization_expires_in", "expires_in"),
            ("trakt_authorization_refresh_token", "refresh_token"),
            ("trakt_authorization_scope", "scope"),
            ("trakt_authorization_created_at", "created_at"),
        ],
        cleared: &["trakt_pin", "trakt_url"],
        dropdowns: &[],
    },
    ProviderSpec {
        provider: Provider::Mal,
        name: "MyAnimeList",
        endpoint: "/validate_mal",
        flag_id: "mal_validated",
        button_id: "validate_mal_url",
        fields: &[
            same("mal_client_id"),
            same("mal_client_secret"),
            same("mal_code_verifier"),
            same("mal_localhost_url"),
        ],
        required_message: "ID, secret, code verifier and localhost URL are all required.",
        success_message: "MyAnimeList credentials validated successfully!",
        failure_message: None,
        network_message: "An error occurred while validating MyAnimeList credentials.",
        extras: &[
            ("mal_authorization_access_token", "access_token"),
            ("mal_authorization_token_type", "token_type"),
            ("mal_authorization_expires_in", "expires_in"),
            ("mal_authorization_refresh_token", "refresh_token"),
        ],
        cleared: &[],
        dropdowns: &[],
    },
];

impl Provider {
    pub fn spec(self) -> &'static ProviderSpec {
        PROVIDERS
            .iter()
            .find(|spec| spec.provider == self)
            .unwrap_or(&PROVIDERS[0])
    }

    /// Resolves the provider a page belongs to from its `*_validated` flag.
    pub fn from_flag_id(flag_id: &str) -> Option<Self> {
        PROVIDERS
            .iter()
            .find(|spec| spec.flag_id == flag_id)
            .map(|spec| spec.provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Replacement contents for a select, with the selection to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownFill {
    pub select_id: String,
    pub options: Vec<SelectOption>,
    pub selected: String,
}

pub const SELECT_PLACEHOLDER: &str = "Select an option";

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub validated: bool,
    pub message: StatusMessage,
    /// `(input id, value)` writes to apply to hidden fields.
    pub updates: Vec<(String, String)>,
    pub dropdowns: Vec<DropdownFill>,
}

/// One provider's validated flag and the re-entrancy guard on its button.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    spec: &'static ProviderSpec,
    validated: bool,
    in_flight: bool,
}

impl CredentialValidator {
    pub fn new(provider: Provider, initial_flag: &str) -> Self {
        Self {
            spec: provider.spec(),
            validated: parse_flag(initial_flag),
            in_flight: false,
        }
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn flag_value(&self) -> &'static str {
        flag_value(self.validated)
    }

    pub fn button_enabled(&self) -> bool {
        !self.validated && !self.in_flight
    }

    /// Any edit to a credential input invalidates the previous round-trip.
    pub fn input_edited(&mut self) {
        if self.validated {
            debug!("{} credentials edited, clearing flag", self.spec.name);
        }
        self.validated = false;
    }

    /// Force the flag, as the authorize-URL helpers do when they rebuild.
    pub fn reset(&mut self) {
        self.validated = false;
    }

    pub fn is_credential_input(&self, input_id: &str) -> bool {
        self.spec.fields.iter().any(|f| f.input_id == input_id)
    }

    /// Collects the request body, refusing locally when a field is empty or
    /// a request is already outstanding.
    pub fn begin(&mut self, values: &impl FieldSource) -> Result<Value> {
        if self.in_flight {
            return Err(WizardError::rejected(format!(
                "{} validation already in progress",
                self.spec.name
            )));
        }
        let mut payload = Map::new();
        let mut missing = Vec::new();
        for credential in self.spec.fields {
            let value = values.trimmed(credential.input_id);
            if value.is_empty() {
                missing.push(credential.input_id.to_string());
            }
            payload.insert(credential.payload_key.to_string(), Value::String(value));
        }
        if !missing.is_empty() {
            return Err(WizardError::MissingFields(missing));
        }
        self.in_flight = true;
        Ok(Value::Object(payload))
    }

    /// Applies the backend's answer. `saved` supplies the selections to keep
    /// when dependent dropdowns are repopulated.
    pub fn complete(
        &mut self,
        result: Result<ValidateReply>,
        saved: &impl FieldSource,
    ) -> ValidationOutcome {
        self.in_flight = false;
        match result {
            Ok(reply) if reply.is_valid() => {
                info!("{} credentials validated", self.spec.name);
                self.validated = true;
                ValidationOutcome {
                    validated: true,
                    message: StatusMessage::success(self.success_text(&reply)),
                    updates: self.success_updates(&reply),
                    dropdowns: dropdown_fills(self.spec, &reply, saved),
                }
            }
            Ok(reply) => {
                self.validated = false;
                let text = self
                    .spec
                    .failure_message
                    .or(reply.detail())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Failed to validate {}.", self.spec.name));
                warn!("{} validation rejected: {text}", self.spec.name);
                self.failed(text)
            }
            Err(err) => {
                self.validated = false;
                warn!("{} validation failed: {err}", self.spec.name);
                self.failed(self.spec.network_message.to_string())
            }
        }
    }

    /// Message shown for a local refusal from [`Self::begin`].
    pub fn refusal_message(&self, err: &WizardError) -> StatusMessage {
        match err {
            WizardError::MissingFields(_) => StatusMessage::error(self.spec.required_message),
            other => StatusMessage::error(other.to_string()),
        }
    }

    /// The full click handler: local checks, round-trip, outcome.
    pub async fn validate<T: Transport>(
        &mut self,
        transport: &T,
        values: &impl FieldSource,
    ) -> ValidationOutcome {
        let payload = match self.begin(values) {
            Ok(payload) => payload,
            Err(err) => {
                return ValidationOutcome {
                    validated: self.validated,
                    message: self.refusal_message(&err),
                    updates: Vec::new(),
                    dropdowns: Vec::new(),
                };
            }
        };
        let result = api::validate(transport, self.spec.endpoint, &payload).await;
        self.complete(result, values)
    }

    fn success_text(&self, reply: &ValidateReply) -> String {
        match self.spec.provider {
            Provider::Github | Provider::Omdb => reply
                .message
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| self.spec.success_message.to_string()),
            _ => self.spec.success_message.to_string(),
        }
    }

    fn success_updates(&self, reply: &ValidateReply) -> Vec<(String, String)> {
        let mut updates: Vec<(String, String)> = self
            .spec
            .extras
            .iter()
            .filter_map(|(key, input_id)| {
                extra_text(reply, key).map(|value| (input_id.to_string(), value))
            })
            .collect();
        updates.extend(
            self.spec
                .cleared
                .iter()
                .map(|input_id| (input_id.to_string(), String::new())),
        );
        updates.push((self.spec.flag_id.to_string(), "true".to_string()));
        updates
    }

    fn failed(&self, text: String) -> ValidationOutcome {
        ValidationOutcome {
            validated: false,
            message: StatusMessage::error(text),
            updates: vec![(self.spec.flag_id.to_string(), "false".to_string())],
            dropdowns: Vec::new(),
        }
    }
}

/// Scalars are copied as-is, lists are comma-joined.
fn extra_text(reply: &ValidateReply, key: &str) -> Option<String> {
    if let Some(text) = reply.extra_str(key) {
        return Some(text);
    }
    let items = reply.extra.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Options for every dependent dropdown, keeping a saved selection only when
/// it is still offered.
pub fn dropdown_fills(
    spec: &ProviderSpec,
    reply: &ValidateReply,
    saved: &impl FieldSource,
) -> Vec<DropdownFill> {
    spec.dropdowns
        .iter()
        .map(|source| {
            let mut options = vec![SelectOption::new("", SELECT_PLACEHOLDER)];
            options.extend(reply.extra_list(source.reply_key).iter().filter_map(|item| {
                let value = item.get(source.value_key)?.as_str()?;
                let label = item
                    .get(source.label_key)
                    .and_then(Value::as_str)
                    .unwrap_or(value);
                Some(SelectOption::new(value, label))
            }));
            let wanted = saved.trimmed(source.select_id);
            let selected = if options.iter().any(|o| !wanted.is_empty() && o.value == wanted) {
                wanted
            } else {
                String::new()
            };
            DropdownFill {
                select_id: source.select_id.to_string(),
                options,
                selected,
            }
        })
        .collect()
}

/// Messages for required selections that block the page. Dependent
/// dropdowns only count once the credential itself is validated.
pub fn page_requirements(
    provider: Provider,
    validated: bool,
    values: &impl FieldSource,
) -> Vec<String> {
    if !validated {
        return Vec::new();
    }
    provider
        .spec()
        .dropdowns
        .iter()
        .filter(|source| values.trimmed(source.select_id).is_empty())
        .map(|source| source.required_message.to_string())
        .collect()
}

/// TMDb region/language status: one message per dropdown plus overall
/// page validity.
pub fn tmdb_dropdowns(validated: bool, values: &impl FieldSource) -> (bool, Vec<StatusMessage>) {
    let checks = [("tmdb_region", "Region"), ("tmdb_language", "Language")];
    let mut all_set = true;
    let messages = checks
        .iter()
        .map(|(id, label)| {
            if values.trimmed(id).is_empty() {
                all_set = false;
                StatusMessage::error(format!("{label} is required."))
            } else {
                StatusMessage::success(format!("{label} is valid!"))
            }
        })
        .collect();
    (validated && all_set, messages)
}

/// State of an eye toggle over a secret input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretVisibility {
    Hidden,
    Shown,
}

impl SecretVisibility {
    pub fn from_input_type(input_type: &str) -> Self {
        if input_type.eq_ignore_ascii_case("password") {
            Self::Hidden
        } else {
            Self::Shown
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Hidden => Self::Shown,
            Self::Shown => Self::Hidden,
        }
    }

    pub fn input_type(self) -> &'static str {
        match self {
            Self::Hidden => "password",
            Self::Shown => "text",
        }
    }

    pub fn icon_class(self) -> &'static str {
        match self {
            Self::Hidden => "fas fa-eye",
            Self::Shown => "fas fa-eye-slash",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::flags::{Tone, fields};

    #[test]
    fn every_provider_has_a_row() {
        for provider in [
            Provider::Plex,
            Provider::Tmdb,
            Provider::Tautulli,
            Provider::Github,
            Provider::Omdb,
            Provider::Mdblist,
            Provider::Notifiarr,
            Provider::Gotify,
            Provider::Ntfy,
            Provider::Anidb,
            Provider::Radarr,
            Provider::Sonarr,
            Provider::Trakt,
            Provider::Mal,
        ] {
            let spec = provider.spec();
            assert_eq!(spec.provider, provider);
            assert!(spec.endpoint.starts_with("/validate_"));
            assert!(spec.flag_id.ends_with("_validated"));
            assert_eq!(Provider::from_flag_id(spec.flag_id), Some(provider));
        }
    }

    #[test]
    fn editing_resets_flag_and_enables_button() {
        for spec in PROVIDERS {
            let mut validator = CredentialValidator::new(spec.provider, "true");
            assert!(!validator.button_enabled());
            validator.input_edited();
            assert!(!validator.is_validated());
            assert_eq!(validator.flag_value(), "false");
            assert!(validator.button_enabled());
        }
    }

    #[test]
    fn empty_field_is_refused_locally() {
        let mut validator = CredentialValidator::new(Provider::Gotify, "false");
        let values = fields([("gotify_url", "http://gotify:80"), ("gotify_token", "  ")]);
        let err = validator.begin(&values).unwrap_err();
        assert!(matches!(err, WizardError::MissingFields(ref ids) if ids == &["gotify_token"]));
        assert!(!validator.is_in_flight());
        assert_eq!(
            validator.refusal_message(&err).text,
            "Please enter both Gotify URL and Token."
        );
    }

    #[test]
    fn anidb_payload_uses_backend_keys() {
        let mut validator = CredentialValidator::new(Provider::Anidb, "false");
        let values = fields([
            ("anidb_username", "user"),
            ("anidb_password", "pass"),
            ("anidb_client", "kometa"),
            ("anidb_version", "1"),
        ]);
        let payload = validator.begin(&values).unwrap();
        assert_eq!(
            payload,
            json!({"username": "user", "password": "pass", "client": "kometa", "clientver": "1"})
        );
        assert!(validator.is_in_flight());
        assert!(!validator.button_enabled());
        assert!(validator.begin(&values).is_err());
    }

    #[tokio::test]
    async fn tmdb_rejection_keeps_flag_false() {
        let transport = RecordingTransport::new().reply(json!({"valid": false}));
        let mut validator = CredentialValidator::new(Provider::Tmdb, "false");
        let values = fields([("tmdb_apikey", "abc")]);
        let outcome = validator.validate(&transport, &values).await;
        assert!(!outcome.validated);
        assert_eq!(outcome.message.tone, Tone::Error);
        assert_eq!(
            outcome.message.text,
            "Failed to validate TMDb. Please check your API Key."
        );
        assert!(validator.button_enabled());
        assert_eq!(validator.flag_value(), "false");
        assert_eq!(transport.calls()[0].body, json!({"tmdb_apikey": "abc"}));
    }

    #[tokio::test]
    async fn network_error_reenables_button() {
        let transport = RecordingTransport::new().fail("offline");
        let mut validator = CredentialValidator::new(Provider::Omdb, "false");
        let outcome = validator
            .validate(&transport, &fields([("omdb_apikey", "k")]))
            .await;
        assert!(!outcome.validated);
        assert!(validator.button_enabled());
        assert_eq!(
            outcome.message.text,
            "An error occurred while validating the OMDb API key."
        );
    }

    #[tokio::test]
    async fn radarr_success_fills_dropdowns_keeping_saved_choice() {
        let transport = RecordingTransport::new().reply(json!({
            "valid": true,
            "root_folders": [{"path": "/movies"}, {"path": "/4k"}],
            "quality_profiles": [{"name": "HD-1080p"}],
        }));
        let mut validator = CredentialValidator::new(Provider::Radarr, "false");
        let values = fields([
            ("radarr_url", "http://radarr:7878"),
            ("radarr_token", "t"),
            ("radarr_root_folder_path", "/4k"),
            ("radarr_quality_profile", "Gone"),
        ]);
        let outcome = validator.validate(&transport, &values).await;
        assert!(outcome.validated);
        assert!(!validator.button_enabled());
        assert_eq!(outcome.dropdowns.len(), 2);
        assert_eq!(outcome.dropdowns[0].options.len(), 3);
        assert_eq!(outcome.dropdowns[0].options[0].label, SELECT_PLACEHOLDER);
        assert_eq!(outcome.dropdowns[0].selected, "/4k");
        assert_eq!(outcome.dropdowns[1].selected, "");
    }

    #[tokio::test]
    async fn trakt_success_copies_tokens_and_clears_pin() {
        let transport = RecordingTransport::new().reply(json!({
            "valid": true,
            "error": "",
            "trakt_authorization_access_token": "AT",
            "trakt_authorization_token_type": "Bearer",
            "trakt_authorization_expires_in": 7776000,
            "trakt_authorization_refresh_token": "RT",
            "trakt_authorization_scope": "public",
            "trakt_authorization_created_at": 1700000000,
        }));
        let mut validator = CredentialValidator::new(Provider::Trakt, "false");
        let values = fields([
            ("trakt_client_id", "id"),
            ("trakt_client_secret", "secret"),
            ("trakt_pin", "PIN"),
        ]);
        let outcome = validator.validate(&transport, &values).await;
        assert!(outcome.validated);
        let updates: std::collections::BTreeMap<_, _> = outcome.updates.into_iter().collect();
        assert_eq!(updates["access_token"], "AT");
        assert_eq!(updates["expires_in"], "7776000");
        assert_eq!(updates["trakt_pin"], "");
        assert_eq!(updates["trakt_url"], "");
        assert_eq!(updates["trakt_validated"], "true");
    }

    #[tokio::test]
    async fn plex_lists_are_joined() {
        let transport = RecordingTransport::new().reply(json!({
            "validated": true,
            "db_cache": 40,
            "user_list": ["alice", "bob"],
            "movie_libraries": ["Movies"],
            "show_libraries": [],
            "music_libraries": ["Music"],
        }));
        let mut validator = CredentialValidator::new(Provider::Plex, "false");
        let values = fields([("plex_url", "http://plex:32400"), ("plex_token", "x")]);
        let outcome = validator.validate(&transport, &values).await;
        let updates: std::collections::BTreeMap<_, _> = outcome.updates.into_iter().collect();
        assert_eq!(updates["plex_db_cache"], "40");
        assert_eq!(updates["tmp_user_list"], "alice,bob");
        assert_eq!(updates["tmp_show_libraries"], "");
    }

    #[test]
    fn sonarr_requires_profiles_only_once_validated() {
        let values = fields([("sonarr_root_folder_path", "/tv")]);
        assert!(page_requirements(Provider::Sonarr, false, &values).is_empty());
        let missing = page_requirements(Provider::Sonarr, true, &values);
        assert_eq!(missing, vec![QUALITY_PROFILE, LANGUAGE_PROFILE]);
    }

    #[test]
    fn tmdb_page_needs_region_and_language() {
        let values = fields([("tmdb_region", "US"), ("tmdb_language", "")]);
        let (valid, messages) = tmdb_dropdowns(true, &values);
        assert!(!valid);
        assert_eq!(messages[0].text, "Region is valid!");
        assert_eq!(messages[1].text, "Language is required.");
        let values = fields([("tmdb_region", "US"), ("tmdb_language", "en")]);
        assert!(tmdb_dropdowns(true, &values).0);
        assert!(!tmdb_dropdowns(false, &values).0);
    }

    #[test]
    fn secret_toggle_flips_type() {
        let state = SecretVisibility::from_input_type("password");
        assert_eq!(state.toggled().input_type(), "text");
        assert_eq!(state.toggled().icon_class(), "fas fa-eye-slash");
    }
}
