//! Wizard settings embedded in the page, with defaults for anything left out.

use serde::Deserialize;
use tracing::warn;

use crate::api::MediaKind;
use crate::error::{Result, WizardError};

pub const CONFIG_ELEMENT_ID: &str = "wizard-config";

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    log_level: Option<String>,
    success_color: Option<String>,
    error_color: Option<String>,
    info_color: Option<String>,
    step_url_prefix: Option<String>,
    separator_preview_base: Option<String>,
    preview_dir: Option<String>,
    uploads_dir: Option<String>,
    sentinel_image: Option<String>,
    sentinel_label: Option<String>,
    trakt_authorize_url: Option<String>,
    trakt_redirect_uri: Option<String>,
    mal_authorize_url: Option<String>,
    preview_debounce_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardConfig {
    pub log_level: String,
    pub success_color: String,
    pub error_color: String,
    pub info_color: String,
    pub step_url_prefix: String,
    pub separator_preview_base: String,
    pub preview_dir: String,
    pub uploads_dir: String,
    pub sentinel_image: String,
    pub sentinel_label: String,
    pub trakt_authorize_url: String,
    pub trakt_redirect_uri: String,
    pub mal_authorize_url: String,
    pub preview_debounce_ms: u32,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            success_color: "#75b798".to_string(),
            error_color: "#ea868f".to_string(),
            info_color: "#6edff6".to_string(),
            step_url_prefix: "/step/".to_string(),
            separator_preview_base:
                "https://github.com/Kometa-Team/Default-Images/blob/master/separators".to_string(),
            preview_dir: "/config/previews".to_string(),
            uploads_dir: "/config/uploads".to_string(),
            sentinel_image: "default".to_string(),
            sentinel_label: "Default Kometa".to_string(),
            trakt_authorize_url: "https://trakt.tv/oauth/authorize".to_string(),
            trakt_redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            mal_authorize_url: "https://myanimelist.net/v1/oauth2/authorize".to_string(),
            preview_debounce_ms: 250,
        }
    }
}

impl WizardConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let file_cfg = serde_json::from_str::<FileConfig>(raw).map_err(|source| {
            WizardError::MalformedJson {
                field: CONFIG_ELEMENT_ID.to_string(),
                source,
            }
        })?;
        let mut cfg = Self::default();
        cfg.apply_file(file_cfg);
        Ok(cfg)
    }

    /// Resolves the config embedded in the page, falling back to defaults
    /// when the element is absent or unreadable.
    pub fn load(embedded: Option<&str>) -> Self {
        let Some(raw) = embedded.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        match Self::from_json(raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("ignoring embedded wizard config: {err}");
                Self::default()
            }
        }
    }

    fn apply_file(&mut self, file_cfg: FileConfig) {
        set_opt_nonempty(&mut self.log_level, file_cfg.log_level);
        set_opt_nonempty(&mut self.success_color, file_cfg.success_color);
        set_opt_nonempty(&mut self.error_color, file_cfg.error_color);
        set_opt_nonempty(&mut self.info_color, file_cfg.info_color);
        set_opt_nonempty(&mut self.step_url_prefix, file_cfg.step_url_prefix);
        set_opt_nonempty(
            &mut self.separator_preview_base,
            file_cfg.separator_preview_base.map(trim_trailing_slash),
        );
        set_opt_nonempty(
            &mut self.preview_dir,
            file_cfg.preview_dir.map(trim_trailing_slash),
        );
        set_opt_nonempty(
            &mut self.uploads_dir,
            file_cfg.uploads_dir.map(trim_trailing_slash),
        );
        set_opt_nonempty(&mut self.sentinel_image, file_cfg.sentinel_image);
        set_opt_nonempty(&mut self.sentinel_label, file_cfg.sentinel_label);
        set_opt_nonempty(&mut self.trakt_authorize_url, file_cfg.trakt_authorize_url);
        set_opt_nonempty(&mut self.trakt_redirect_uri, file_cfg.trakt_redirect_uri);
        set_opt_nonempty(&mut self.mal_authorize_url, file_cfg.mal_authorize_url);
        set_opt_u32_max(&mut self.preview_debounce_ms, file_cfg.preview_debounce_ms, 5_000);
    }

    pub fn step_url(&self, step: &str) -> String {
        format!("{}{}", self.step_url_prefix, step.trim())
    }

    pub fn separator_preview_url(&self, style: &str) -> String {
        format!("{}/{style}/chart.jpg?raw=true", self.separator_preview_base)
    }

    pub fn preview_image_url(&self, library_id: &str, kind: MediaKind, stamp: u64) -> String {
        format!(
            "{}/{library_id}-{}_preview.png?t={stamp}",
            self.preview_dir,
            kind.as_str()
        )
    }

    pub fn uploaded_image_url(&self, kind: MediaKind, name: &str) -> String {
        format!("{}/{}/{name}", self.uploads_dir, kind.upload_dir())
    }

    pub fn is_sentinel_image(&self, name: &str) -> bool {
        let name = name.trim();
        name.is_empty() || name == self.sentinel_image
    }
}

fn trim_trailing_slash(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

fn set_opt_nonempty(dst: &mut String, value: Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        if !v.is_empty() {
            *dst = v.to_string();
        }
    }
}

fn set_opt_u32_max(dst: &mut u32, value: Option<u32>, max: u32) {
    if let Some(v) = value {
        *dst = v.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = WizardConfig::from_json(
            r#"{"log_level": "debug", "preview_dir": "/previews/", "error_color": "  "}"#,
        )
        .unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.preview_dir, "/previews");
        assert_eq!(cfg.error_color, "#ea868f");
        assert_eq!(cfg.sentinel_image, "default");
    }

    #[test]
    fn malformed_embedded_config_falls_back() {
        assert_eq!(WizardConfig::load(Some("{not json")), WizardConfig::default());
        assert_eq!(WizardConfig::load(Some("   ")), WizardConfig::default());
        assert_eq!(WizardConfig::load(None), WizardConfig::default());
    }

    #[test]
    fn debounce_is_capped() {
        let cfg = WizardConfig::from_json(r#"{"preview_debounce_ms": 900000}"#).unwrap();
        assert_eq!(cfg.preview_debounce_ms, 5_000);
    }

    #[test]
    fn builds_asset_urls() {
        let cfg = WizardConfig::default();
        assert_eq!(cfg.step_url("025-libraries"), "/step/025-libraries");
        assert_eq!(
            cfg.preview_image_url("mov-library_movies", MediaKind::Movie, 42),
            "/config/previews/mov-library_movies-movie_preview.png?t=42"
        );
        assert_eq!(
            cfg.uploaded_image_url(MediaKind::Show, "bg.png"),
            "/config/uploads/shows/bg.png"
        );
        assert_eq!(
            cfg.separator_preview_url("blue"),
            "https://github.com/Kometa-Team/Default-Images/blob/master/separators/blue/chart.jpg?raw=true"
        );
    }
}
