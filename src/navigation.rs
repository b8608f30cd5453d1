//! Previous/Next/jump buttons, page submission and the final page checks.

use tracing::{info, warn};

use crate::api::{self, Transport};
use crate::config::WizardConfig;
use crate::error::Result;
use crate::flags::{StatusMessage, parse_flag};

pub const PLEX_STEP: &str = "010-plex";
pub const TMDB_STEP: &str = "020-tmdb";
pub const LIBRARIES_STEP: &str = "025-libraries";
pub const SETTINGS_STEP: &str = "150-settings";

/// Enablement of the three navigation controls. Previous is never blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    pub previous: bool,
    pub next: bool,
    pub jump: bool,
}

impl NavState {
    pub fn from_validity(valid: bool) -> Self {
        Self {
            previous: true,
            next: valid,
            jump: valid,
        }
    }

    pub fn allows(&self, action: &NavAction) -> bool {
        match action {
            NavAction::Previous => self.previous,
            NavAction::Next => self.next,
            NavAction::Jump(_) => self.jump,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    Previous,
    Next,
    Jump(String),
}

impl NavAction {
    /// Arrow icon swapped for a spinner while the submission is pending.
    pub fn spinner_icon_id(&self) -> &'static str {
        match self {
            Self::Previous => "prev-spinner-icon",
            Self::Next | Self::Jump(_) => "next-spinner-icon",
        }
    }
}

pub const SPINNER_CLASSES: [&str; 2] = ["spinner-border", "spinner-border-sm"];
pub const ARROW_CLASSES: [&str; 2] = ["fa-arrow-left", "fa-arrow-right"];

/// A message fragment that links back to an earlier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpLink {
    pub before: String,
    pub label: String,
    pub after: String,
    pub step: String,
}

impl JumpLink {
    fn new(before: &str, label: &str, after: &str, step: &str) -> Self {
        Self {
            before: before.to_string(),
            label: label.to_string(),
            after: after.to_string(),
            step: step.to_string(),
        }
    }

    pub fn plain_text(&self) -> String {
        format!("{}{}{}", self.before, self.label, self.after)
    }
}

pub fn plex_gate_link() -> JumpLink {
    JumpLink::new(
        "Plex settings have not been validated successfully. Please ",
        "return to the Plex page",
        " and hit the validate button and ensure success before returning here.",
        PLEX_STEP,
    )
}

/// Replaces every `custom` select value with its typed URL. Fields not
/// named in `substitutions` pass through untouched.
pub fn substitute_custom_values(
    fields: Vec<(String, String)>,
    substitutions: &[(String, String)],
) -> Vec<(String, String)> {
    fields
        .into_iter()
        .map(|(name, value)| {
            if value != crate::webhooks::CUSTOM {
                return (name, value);
            }
            match substitutions.iter().find(|(id, _)| *id == name) {
                Some((_, url)) => (name, url.clone()),
                None => (name, value),
            }
        })
        .collect()
}

/// Posts the page and returns where to go next. The caller navigates.
pub async fn submit_and_redirect<T: Transport>(
    transport: &T,
    config: &WizardConfig,
    form_action: &str,
    fields: &[(String, String)],
    target_step: &str,
) -> Result<String> {
    info!("submitting {form_action} before jumping to {target_step}");
    if let Err(err) = api::submit_form(transport, form_action, fields).await {
        warn!("form submission failed: {err}");
        return Err(err);
    }
    Ok(config.step_url(target_step))
}

/// Forms are only submitted by the navigation buttons, never by Enter in
/// a single-line input.
pub fn suppress_enter(key: &str, target_tag: &str, inside_form: bool) -> bool {
    key == "Enter" && inside_form && !target_tag.eq_ignore_ascii_case("textarea")
}

pub fn clear_session_prompt(config_name: &str) -> String {
    let name = config_name.trim();
    format!(
        "Are you sure you want to reset the configuration for \"{name}\"? This action will delete any saved data for \"{name}\" and cannot be undone."
    )
}

pub async fn clear_session<T: Transport>(transport: &T, config_name: &str) -> StatusMessage {
    let name = config_name.trim();
    match api::clear_session(transport, name).await {
        Ok(_) => {
            info!("cleared session for {name}");
            StatusMessage::success(format!("Configuration \"{name}\" has been reset."))
        }
        Err(err) => {
            warn!("clearing session {name} failed: {err}");
            StatusMessage::error(format!("Error clearing configuration \"{name}\"."))
        }
    }
}

/// Raw `data-*-valid` markers rendered on the final page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalMarkers {
    pub plex: String,
    pub tmdb: String,
    pub libraries: String,
    pub settings: String,
    pub yaml: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReadiness {
    pub show_yaml: bool,
    pub missing: Vec<JumpLink>,
}

impl FinalReadiness {
    pub fn evaluate(markers: &FinalMarkers) -> Self {
        let checks = [
            (
                &markers.plex,
                plex_gate_link(),
            ),
            (
                &markers.tmdb,
                JumpLink::new(
                    "TMDb settings have not been validated successfully. Please ",
                    "return to the TMDb page",
                    " and hit the validate button and ensure success before returning here.",
                    TMDB_STEP,
                ),
            ),
            (
                &markers.libraries,
                JumpLink::new(
                    "Libraries page settings have not been validated successfully. Please ",
                    "return to the Libraries page",
                    " and ensure you make appropriate selections before returning here.",
                    LIBRARIES_STEP,
                ),
            ),
            (
                &markers.settings,
                JumpLink::new(
                    "Settings page values have likely been skipped. Please ",
                    "return to the Settings page",
                    " and ensure you make appropriate selections before returning here.",
                    SETTINGS_STEP,
                ),
            ),
        ];
        let missing: Vec<JumpLink> = checks
            .into_iter()
            .filter(|(marker, _)| !parse_flag(marker))
            .map(|(_, link)| link)
            .collect();
        Self {
            show_yaml: missing.is_empty() && parse_flag(&markers.yaml),
            missing,
        }
    }

    /// Ids to unhide (`true`) or hide (`false`) via the `d-none` class.
    pub fn visibility(&self) -> Vec<(&'static str, bool)> {
        let warnings = [
            "no-validation-warning",
            "yaml-warnings",
            "yaml-warning-msg",
            "validation-error",
        ];
        let content = ["yaml-content", "final-yaml", "download-btn", "download-redacted-btn"];
        if self.show_yaml {
            warnings
                .into_iter()
                .map(|id| (id, false))
                .chain(content.into_iter().map(|id| (id, true)))
                .collect()
        } else {
            warnings
                .into_iter()
                .map(|id| (id, true))
                .chain([("download-btn", false), ("download-redacted-btn", false)])
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::error::WizardError;

    #[test]
    fn previous_is_never_blocked() {
        let blocked = NavState::from_validity(false);
        assert!(blocked.allows(&NavAction::Previous));
        assert!(!blocked.allows(&NavAction::Next));
        assert!(!blocked.allows(&NavAction::Jump("150-settings".to_string())));
        assert!(NavState::from_validity(true).allows(&NavAction::Next));
    }

    #[test]
    fn custom_values_are_substituted() {
        let fields = vec![
            ("webhooks_error".to_string(), "custom".to_string()),
            ("webhooks_changes".to_string(), "custom".to_string()),
            ("webhooks_run_start".to_string(), "notifiarr".to_string()),
        ];
        let subs = vec![(
            "webhooks_error".to_string(),
            "https://hooks.example/e".to_string(),
        )];
        let out = substitute_custom_values(fields, &subs);
        assert_eq!(out[0].1, "https://hooks.example/e");
        assert_eq!(out[1].1, "custom");
        assert_eq!(out[2].1, "notifiarr");
    }

    #[tokio::test]
    async fn jump_redirects_only_on_success() {
        let config = WizardConfig::default();
        let transport = RecordingTransport::new()
            .reply(Value::Null)
            .reply_status(500, Value::Null);
        let fields = vec![("tmdb_apikey".to_string(), "k".to_string())];
        let url = submit_and_redirect(&transport, &config, "/step/020-tmdb", &fields, "150-settings")
            .await
            .unwrap();
        assert_eq!(url, "/step/150-settings");
        let err = submit_and_redirect(&transport, &config, "/step/020-tmdb", &fields, "150-settings")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Status { status: 500, .. }));
    }

    #[test]
    fn enter_is_suppressed_outside_textareas() {
        assert!(suppress_enter("Enter", "INPUT", true));
        assert!(!suppress_enter("Enter", "TEXTAREA", true));
        assert!(!suppress_enter("Enter", "INPUT", false));
        assert!(!suppress_enter("a", "INPUT", true));
    }

    #[tokio::test]
    async fn clear_session_posts_name() {
        let transport = RecordingTransport::new().reply(json!({"status": "success"}));
        let message = clear_session(&transport, " home ").await;
        assert!(!message.is_error());
        assert_eq!(transport.calls()[0].body, json!([["name", "home"]]));
        assert!(clear_session_prompt("home").contains("\"home\""));
    }

    #[test]
    fn final_page_lists_each_missing_step() {
        let markers = FinalMarkers {
            plex: "True".to_string(),
            tmdb: "False".to_string(),
            libraries: "True".to_string(),
            settings: String::new(),
            yaml: "True".to_string(),
        };
        let readiness = FinalReadiness::evaluate(&markers);
        assert!(!readiness.show_yaml);
        let steps: Vec<_> = readiness.missing.iter().map(|l| l.step.as_str()).collect();
        assert_eq!(steps, vec![TMDB_STEP, SETTINGS_STEP]);
        assert!(readiness.visibility().contains(&("download-btn", false)));

        let all = FinalMarkers {
            plex: "True".to_string(),
            tmdb: "True".to_string(),
            libraries: "True".to_string(),
            settings: "True".to_string(),
            yaml: "True".to_string(),
        };
        let readiness = FinalReadiness::evaluate(&all);
        assert!(readiness.show_yaml && readiness.missing.is_empty());
        assert!(readiness.visibility().contains(&("final-yaml", true)));
    }
}
