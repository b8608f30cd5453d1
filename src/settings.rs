//! Settings page field checks and the playlist user pickers.

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::flags::StatusMessage;

pub const SETTINGS_FLAG: &str = "settings_validated";
pub const ASSET_DIRECTORY: &str = "asset_directory";
pub const SYNC_USERS_INPUT: &str = "playlist_sync_to_users";
pub const EXCLUDE_USERS_INPUT: &str = "playlist_exclude_users";
pub const ALL_USERS: &str = "all";

const NON_NEGATIVE: &str = "Please enter a valid integer (0 or greater).";
const POSITIVE: &str = "Please enter a valid integer greater than 0.";

#[derive(Debug)]
pub struct FieldRule {
    pub id: &'static str,
    pub pattern: &'static str,
    pub message: &'static str,
}

pub static RULES: &[FieldRule] = &[
    FieldRule {
        id: ASSET_DIRECTORY,
        pattern: r#"^(?:[a-zA-Z]:\\(?:[^\\/:*?"<>|\r\n]+\\)*[^\\/:*?"<>|\r\n]*|\\{2}[^\\/:*?"<>|\r\n]+(?:\\[^\\/:*?"<>|\r\n]+)*|(?:[^\\/:*?"<>|\r\n]+\\)*[^\\/:*?"<>|\r\n]+|/(?:[^/]+/)*[^/]*|\.{1,2}(?:/[^/]*)*|(?:[^/]+/)*[^/]*)$"#,
        message: "Please enter a valid asset directory path.",
    },
    FieldRule {
        id: "asset_depth",
        pattern: r"^(0|[1-9][0-9]*)$",
        message: NON_NEGATIVE,
    },
    FieldRule {
        id: "overlay_artwork_quality",
        pattern: r"^(100|[1-9][0-9]?)$",
        message: "Please enter an integer between 1 and 100.",
    },
    FieldRule {
        id: "cache_expiration",
        pattern: r"^[1-9][0-9]*$",
        message: POSITIVE,
    },
    FieldRule {
        id: "item_refresh_delay",
        pattern: r"^(0|[1-9][0-9]*)$",
        message: NON_NEGATIVE,
    },
    FieldRule {
        id: "minimum_items",
        pattern: r"^[1-9][0-9]*$",
        message: POSITIVE,
    },
    FieldRule {
        id: "run_again_delay",
        pattern: r"^(0|[1-9][0-9]*)$",
        message: NON_NEGATIVE,
    },
    FieldRule {
        id: "ignore_ids",
        pattern: r"^(None|[0-9]{1,8}(,[0-9]{1,8})*)$",
        message: "Please enter a valid CSV list of numeric IDs (1-8 digits) or \"None\".",
    },
    FieldRule {
        id: "ignore_imdb_ids",
        pattern: r"^(None|tt[0-9]{7,8}(,tt[0-9]{7,8})*)$",
        message: "Please enter a valid CSV list of IMDb IDs (e.g., tt1234567) or \"None\".",
    },
    FieldRule {
        id: "custom_repo",
        pattern: r"^(None|https?://[0-9a-z.-]+\.[a-z.]{2,6}([/A-Za-z0-9_.-]*)*/?)$",
        message: "Please enter a valid URL or \"None\".",
    },
];

pub const ALL_VALID_MESSAGE: &str = "All fields are valid!";
pub const FIX_ERRORS_MESSAGE: &str = "Please fix the highlighted errors before submitting.";

/// Result for one input; `index` tells repeated asset directory rows apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub id: String,
    pub index: usize,
    pub error: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsReport {
    pub checks: Vec<FieldCheck>,
    pub valid: bool,
    pub message: StatusMessage,
}

impl SettingsReport {
    pub fn errors(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|check| check.error.is_some())
    }
}

pub struct SettingsValidator {
    rules: Vec<(&'static FieldRule, Regex)>,
}

impl SettingsValidator {
    pub fn new() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|rule| Ok((rule, Regex::new(rule.pattern)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn has_rule(&self, id: &str) -> bool {
        self.rules.iter().any(|(rule, _)| rule.id == id)
    }

    /// Error text for a value, `None` when it passes or has no rule.
    pub fn check(&self, id: &str, value: &str) -> Option<&'static str> {
        let (rule, re) = self.rules.iter().find(|(rule, _)| rule.id == id)?;
        (!re.is_match(value.trim())).then_some(rule.message)
    }

    /// Checks every `(input name, value)` pair that has a rule.
    pub fn validate_page(&self, fields: &[(String, String)]) -> SettingsReport {
        let mut asset_rows = 0;
        let checks: Vec<FieldCheck> = fields
            .iter()
            .filter(|(id, _)| self.has_rule(id))
            .map(|(id, value)| {
                let index = if id == ASSET_DIRECTORY {
                    asset_rows += 1;
                    asset_rows - 1
                } else {
                    0
                };
                FieldCheck {
                    id: id.clone(),
                    index,
                    error: self.check(id, value),
                }
            })
            .collect();
        let valid = checks.iter().all(|check| check.error.is_none());
        debug!("settings valid={valid} checked={}", checks.len());
        SettingsReport {
            checks,
            valid,
            message: if valid {
                StatusMessage::success(ALL_VALID_MESSAGE)
            } else {
                StatusMessage::error(FIX_ERRORS_MESSAGE)
            },
        }
    }
}

/// Repeatable asset directory inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetDirectories {
    rows: Vec<String>,
}

impl AssetDirectories {
    pub fn new(rows: Vec<String>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn add_row(&mut self) -> usize {
        self.rows.push(String::new());
        self.rows.len() - 1
    }

    pub fn set(&mut self, index: usize, value: &str) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = value.to_string();
        }
    }

    pub fn remove_row(&mut self, index: usize) -> Option<String> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }
}

pub fn parse_user_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checkbox states when a picker opens.
pub fn picker_states(saved: &str, users: &[String]) -> (bool, Vec<bool>) {
    let selected = parse_user_list(saved);
    let all = selected.iter().any(|user| user == ALL_USERS);
    let states = users.iter().map(|user| selected.contains(user)).collect();
    (all, states)
}

/// "all" supersedes individual users.
pub fn sync_users_value(all: bool, checked: &[String]) -> String {
    if all {
        return ALL_USERS.to_string();
    }
    checked
        .iter()
        .map(|user| user.trim())
        .filter(|user| !user.is_empty() && *user != ALL_USERS)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn exclude_users_value(checked: &[String]) -> String {
    checked
        .iter()
        .map(|user| user.trim())
        .filter(|user| !user.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SettingsValidator {
        SettingsValidator::new().unwrap()
    }

    #[test]
    fn all_patterns_compile() {
        assert_eq!(validator().rules.len(), RULES.len());
    }

    #[test]
    fn numeric_rules() {
        let v = validator();
        assert_eq!(v.check("asset_depth", "0"), None);
        assert_eq!(v.check("asset_depth", "01"), Some(NON_NEGATIVE));
        assert_eq!(v.check("overlay_artwork_quality", "100"), None);
        assert!(v.check("overlay_artwork_quality", "0").is_some());
        assert!(v.check("overlay_artwork_quality", "101").is_some());
        assert_eq!(v.check("cache_expiration", "0"), Some(POSITIVE));
        assert_eq!(v.check("minimum_items", "1"), None);
        assert_eq!(v.check("unknown_field", "anything"), None);
    }

    #[test]
    fn id_lists_and_urls() {
        let v = validator();
        assert_eq!(v.check("ignore_ids", "None"), None);
        assert_eq!(v.check("ignore_ids", "12345,678"), None);
        assert!(v.check("ignore_ids", "123456789").is_some());
        assert_eq!(v.check("ignore_imdb_ids", "tt1234567,tt12345678"), None);
        assert!(v.check("ignore_imdb_ids", "1234567").is_some());
        assert_eq!(v.check("custom_repo", "https://github.com/me/configs"), None);
        assert!(v.check("custom_repo", "ftp://x").is_some());
        assert!(v.check("custom_repo", "https://github.com/mé/configs").is_some());
    }

    #[test]
    fn asset_directories_accept_common_paths() {
        let v = validator();
        for path in ["/config/assets", "C:\\kometa\\assets", "assets", "../assets"] {
            assert_eq!(v.check(ASSET_DIRECTORY, path), None, "{path}");
        }
        assert!(v.check(ASSET_DIRECTORY, "assets//nested").is_some());
    }

    #[test]
    fn page_report_indexes_asset_rows() {
        let fields = vec![
            (ASSET_DIRECTORY.to_string(), "/config/assets".to_string()),
            (ASSET_DIRECTORY.to_string(), "assets//nested".to_string()),
            ("asset_depth".to_string(), "0".to_string()),
            ("plex_url".to_string(), "ignored".to_string()),
        ];
        let report = validator().validate_page(&fields);
        assert!(!report.valid);
        assert_eq!(report.checks.len(), 3);
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 1);
        assert_eq!(report.message.text, FIX_ERRORS_MESSAGE);
    }

    #[test]
    fn asset_rows_add_and_remove() {
        let mut dirs = AssetDirectories::new(vec!["/config/assets".to_string()]);
        let index = dirs.add_row();
        dirs.set(index, "/more");
        assert_eq!(dirs.rows(), ["/config/assets", "/more"]);
        assert_eq!(dirs.remove_row(0).as_deref(), Some("/config/assets"));
        assert_eq!(dirs.remove_row(3), None);
    }

    #[test]
    fn user_pickers() {
        let users = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(sync_users_value(true, &users), "all");
        assert_eq!(sync_users_value(false, &users), "alice, bob");
        assert_eq!(exclude_users_value(&users[1..]), "bob");
        let (all, states) = picker_states("alice, all", &users);
        assert!(all);
        assert_eq!(states, vec![true, false]);
    }
}
