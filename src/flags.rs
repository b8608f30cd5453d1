//! `true`/`false` page flags, status lines and form field access.

use std::collections::{BTreeMap, HashMap};

use crate::config::WizardConfig;

/// Read access to the current values of page inputs, keyed by element id.
pub trait FieldSource {
    fn field(&self, id: &str) -> Option<String>;

    /// Trimmed value, empty when the input is absent.
    fn trimmed(&self, id: &str) -> String {
        self.field(id)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

impl FieldSource for BTreeMap<String, String> {
    fn field(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

impl<F: FieldSource + ?Sized> FieldSource for &F {
    fn field(&self, id: &str) -> Option<String> {
        (**self).field(id)
    }
}

/// Builds an owned field map from literal pairs.
pub fn fields<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Reads a server-rendered flag. Hidden inputs carry `true`/`false`, the
/// data attributes on status markers carry Python's `True`/`False`.
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

pub fn flag_value(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Info,
    Warning,
}

impl Tone {
    pub fn alert_class(self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Error => "alert-danger",
            Self::Info => "alert-info",
            Self::Warning => "alert-warning",
        }
    }

    pub fn toast_kind(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
}

impl StatusMessage {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Tone::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Tone::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Tone::Warning, text)
    }

    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }

    /// Inline status lines are colored rather than classed.
    pub fn color<'a>(&self, config: &'a WizardConfig) -> &'a str {
        match self.tone {
            Tone::Success => &config.success_color,
            Tone::Error | Tone::Warning => &config.error_color,
            Tone::Info => &config.info_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_flag_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag("True"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn error_messages_use_error_color() {
        let config = WizardConfig::default();
        let message = StatusMessage::error("Failed to validate TMDb.");
        assert_eq!(message.color(&config), "#ea868f");
        assert_eq!(message.tone.alert_class(), "alert-danger");
        assert_eq!(StatusMessage::success("ok").color(&config), "#75b798");
    }
}
