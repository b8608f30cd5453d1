//! Webhook selects, their custom URLs and the page flag.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::api::{self, Transport, ValidateReply};
use crate::error::{Result, WizardError};
use crate::flags::{StatusMessage, flag_value};

pub const ENDPOINT: &str = "/validate_webhook";
pub const FLAG_ID: &str = "webhooks_validated";
pub const CUSTOM: &str = "custom";
const SELECT_PREFIX: &str = "webhooks_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WebhookEntry {
    selection: String,
    custom_url: String,
    validated: bool,
    in_flight: bool,
}

impl WebhookEntry {
    fn is_custom(&self) -> bool {
        self.selection == CUSTOM
    }

    fn counts_valid(&self) -> bool {
        !self.is_custom() || self.validated
    }
}

/// Validation state of every webhook select on the page, keyed by select id.
#[derive(Debug, Clone, Default)]
pub struct WebhookRegistry {
    entries: BTreeMap<String, WebhookEntry>,
}

impl WebhookRegistry {
    /// Seeds the registry from the rendered selects. A saved custom URL keeps
    /// the page-level flag; a custom choice without one needs validating.
    pub fn load<'a>(
        selects: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
        page_flag: bool,
    ) -> Self {
        let entries = selects
            .into_iter()
            .map(|(id, selection, custom_url)| {
                let selection = selection.trim().to_string();
                let custom_url = custom_url.trim().to_string();
                let validated = if selection == CUSTOM {
                    page_flag && !custom_url.is_empty()
                } else {
                    true
                };
                (
                    id.to_string(),
                    WebhookEntry {
                        selection,
                        custom_url,
                        validated,
                        in_flight: false,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn all_validated(&self) -> bool {
        self.entries.values().all(WebhookEntry::counts_valid)
    }

    pub fn flag_value(&self) -> &'static str {
        flag_value(self.all_validated())
    }

    pub fn is_validated(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(WebhookEntry::counts_valid)
    }

    pub fn custom_input_visible(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(WebhookEntry::is_custom)
    }

    pub fn validate_button_enabled(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.is_custom() && !entry.validated && !entry.in_flight)
    }

    pub fn selection_changed(&mut self, id: &str, selection: &str) {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.selection = selection.trim().to_string();
        entry.validated = !entry.is_custom();
        debug!("webhook {id} now {}", entry.selection);
    }

    pub fn url_edited(&mut self, id: &str, url: &str) {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.custom_url = url.trim().to_string();
        entry.validated = false;
    }

    pub fn begin(&mut self, id: &str) -> Result<Value> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| WizardError::rejected(format!("unknown webhook {id}")))?;
        if entry.in_flight {
            return Err(WizardError::rejected(format!(
                "webhook {id} validation already in progress"
            )));
        }
        if entry.custom_url.is_empty() {
            return Err(WizardError::MissingFields(vec![format!("{id}_custom")]));
        }
        entry.in_flight = true;
        Ok(json!({
            "webhook_url": entry.custom_url,
            "message": format!("Test message for {} webhook", display_name(id)),
        }))
    }

    pub fn complete(&mut self, id: &str, result: Result<ValidateReply>) -> StatusMessage {
        let Some(entry) = self.entries.get_mut(id) else {
            return StatusMessage::error(format!("unknown webhook {id}"));
        };
        entry.in_flight = false;
        match result {
            Ok(reply) if reply.is_valid() => {
                entry.validated = true;
                StatusMessage::success(
                    reply
                        .success
                        .unwrap_or_else(|| "Test message sent successfully!".to_string()),
                )
            }
            Ok(reply) => {
                entry.validated = false;
                let text = reply
                    .detail()
                    .unwrap_or("Webhook validation failed.")
                    .to_string();
                warn!("webhook {id} rejected: {text}");
                StatusMessage::error(text)
            }
            Err(err) => {
                entry.validated = false;
                warn!("webhook {id} validation failed: {err}");
                StatusMessage::error("An error occurred. Please try again.")
            }
        }
    }

    pub async fn validate<T: Transport>(&mut self, transport: &T, id: &str) -> StatusMessage {
        let payload = match self.begin(id) {
            Ok(payload) => payload,
            Err(WizardError::MissingFields(_)) => {
                return StatusMessage::error("Please enter a webhook URL.");
            }
            Err(err) => return StatusMessage::error(err.to_string()),
        };
        let result = api::validate(transport, ENDPOINT, &payload).await;
        self.complete(id, result)
    }

    /// `(select id, url)` for every custom choice that has a URL; these
    /// replace the literal `custom` when the form is serialized.
    pub fn substitutions(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_custom() && !entry.custom_url.is_empty())
            .map(|(id, entry)| (id.clone(), entry.custom_url.clone()))
            .collect()
    }
}

/// `webhooks_run_start` becomes `Run Start`.
pub fn display_name(select_id: &str) -> String {
    let kind = select_id.strip_prefix(SELECT_PREFIX).unwrap_or(select_id);
    kind.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Id of the spinner shown while a webhook is validated.
pub fn spinner_id(select_id: &str) -> String {
    let kind = select_id.strip_prefix(SELECT_PREFIX).unwrap_or(select_id);
    format!("spinner_{kind}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::flags::Tone;

    fn registry(flag: bool) -> WebhookRegistry {
        WebhookRegistry::load(
            [
                ("webhooks_error", "notifiarr", ""),
                ("webhooks_run_start", "custom", "https://hooks.example/run"),
                ("webhooks_changes", "", ""),
            ],
            flag,
        )
    }

    #[test]
    fn saved_custom_url_keeps_page_flag() {
        assert!(registry(true).all_validated());
        let registry = registry(false);
        assert!(!registry.all_validated());
        assert_eq!(registry.flag_value(), "false");
        assert!(registry.validate_button_enabled("webhooks_run_start"));
        assert!(!registry.validate_button_enabled("webhooks_error"));
    }

    #[test]
    fn choosing_custom_requires_validation() {
        let mut registry = registry(true);
        registry.selection_changed("webhooks_changes", "custom");
        assert!(registry.custom_input_visible("webhooks_changes"));
        assert!(!registry.all_validated());
        registry.selection_changed("webhooks_changes", "notifiarr");
        assert!(registry.all_validated());
    }

    #[test]
    fn editing_url_resets_entry() {
        let mut registry = registry(true);
        registry.url_edited("webhooks_run_start", "https://hooks.example/other");
        assert!(!registry.is_validated("webhooks_run_start"));
        assert_eq!(
            registry.substitutions(),
            vec![(
                "webhooks_run_start".to_string(),
                "https://hooks.example/other".to_string()
            )]
        );
    }

    #[test]
    fn names_webhooks_for_humans() {
        assert_eq!(display_name("webhooks_run_start"), "Run Start");
        assert_eq!(spinner_id("webhooks_run_start"), "spinner_run_start");
    }

    #[tokio::test]
    async fn validation_round_trip() {
        let transport = RecordingTransport::new()
            .reply_status(400, json!({"error": "Failed to send message: 404"}))
            .reply(json!({"success": "Test message sent successfully!"}));
        let mut registry = registry(false);

        let message = registry.validate(&transport, "webhooks_run_start").await;
        assert_eq!(message.tone, Tone::Error);
        assert_eq!(message.text, "Failed to send message: 404");
        assert!(!registry.all_validated());

        let message = registry.validate(&transport, "webhooks_run_start").await;
        assert_eq!(message.tone, Tone::Success);
        assert!(registry.all_validated());
        assert!(!registry.validate_button_enabled("webhooks_run_start"));
        assert_eq!(
            transport.calls()[0].body,
            json!({
                "webhook_url": "https://hooks.example/run",
                "message": "Test message for Run Start webhook",
            })
        );
    }
}
