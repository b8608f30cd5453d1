//! Authorize-URL helpers for the Trakt and MyAnimeList pages.

use crate::config::WizardConfig;

pub const TRAKT_CLIENT_ID_LEN: usize = 64;
pub const MAL_CLIENT_ID_LEN: usize = 32;

/// Trakt hands out a PIN on an out-of-band page once the user authorizes.
pub fn trakt_authorize_url(config: &WizardConfig, client_id: &str) -> Option<String> {
    let client_id = client_id.trim();
    if client_id.len() != TRAKT_CLIENT_ID_LEN {
        return None;
    }
    Some(format!(
        "{}?response_type=code&client_id={}&redirect_uri={}",
        config.trakt_authorize_url,
        urlencoding::encode(client_id),
        config.trakt_redirect_uri
    ))
}

/// MyAnimeList uses the plain PKCE method, so the challenge is the verifier.
pub fn mal_authorize_url(
    config: &WizardConfig,
    client_id: &str,
    code_verifier: &str,
) -> Option<String> {
    let client_id = client_id.trim();
    if client_id.len() != MAL_CLIENT_ID_LEN {
        return None;
    }
    Some(format!(
        "{}?response_type=code&client_id={}&code_challenge={}",
        config.mal_authorize_url,
        urlencoding::encode(client_id),
        urlencoding::encode(code_verifier.trim())
    ))
}

/// Which of the two authorize-flow buttons are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizeButtons {
    pub open_url: bool,
    pub validate: bool,
}

impl AuthorizeButtons {
    /// `code` is the Trakt PIN or the MyAnimeList localhost redirect URL.
    pub fn evaluate(authorize_url: &str, code: &str, validated: bool) -> Self {
        Self {
            open_url: !authorize_url.trim().is_empty(),
            validate: !code.trim().is_empty() && !validated,
        }
    }
}

/// Start-page config names: lowercase, `[a-z0-9_]` only.
pub fn sanitize_config_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trakt_url_needs_full_client_id() {
        let config = WizardConfig::default();
        assert_eq!(trakt_authorize_url(&config, "short"), None);
        let id = "a".repeat(64);
        assert_eq!(
            trakt_authorize_url(&config, &id).unwrap(),
            format!(
                "https://trakt.tv/oauth/authorize?response_type=code&client_id={id}&redirect_uri=urn:ietf:wg:oauth:2.0:oob"
            )
        );
    }

    #[test]
    fn mal_challenge_is_verifier() {
        let config = WizardConfig::default();
        let id = "b".repeat(32);
        let url = mal_authorize_url(&config, &id, "verifier123").unwrap();
        assert!(url.ends_with("&code_challenge=verifier123"));
        assert_eq!(mal_authorize_url(&config, "b", "verifier123"), None);
    }

    #[test]
    fn buttons_follow_inputs() {
        assert_eq!(
            AuthorizeButtons::evaluate("", "", false),
            AuthorizeButtons {
                open_url: false,
                validate: false
            }
        );
        let buttons = AuthorizeButtons::evaluate("https://trakt.tv/x", "1234ABCD", false);
        assert!(buttons.open_url && buttons.validate);
        assert!(!AuthorizeButtons::evaluate("u", "pin", true).validate);
    }

    #[test]
    fn config_names_are_sanitized() {
        assert_eq!(sanitize_config_name("My Config-2!"), "myconfig2");
        assert_eq!(sanitize_config_name("home_server"), "home_server");
    }
}
