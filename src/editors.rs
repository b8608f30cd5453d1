//! Add/remove editors whose state lives as JSON in a hidden input.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, WizardError};

pub const LIST_PREFIXES: [&str; 4] = [
    "mass_genre_update",
    "radarr_remove_by_tag",
    "sonarr_remove_by_tag",
    "metadata_backup",
];

pub const MAPPING_PREFIXES: [&str; 2] = ["genre_mapper", "content_rating_mapper"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEditorIds {
    pub hidden: String,
    pub input: String,
    pub add_button: String,
    pub list: String,
}

impl ListEditorIds {
    pub fn new(library_id: &str, prefix: &str) -> Self {
        let stem = format!("{library_id}-{prefix}_custom");
        Self {
            hidden: format!("{stem}_hidden"),
            input: format!("{stem}_input"),
            add_button: format!("{stem}_add"),
            list: format!("{stem}_list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEditorIds {
    pub hidden: String,
    pub input: String,
    pub output: String,
    pub add_button: String,
    pub list: String,
}

impl MappingEditorIds {
    pub fn new(library_id: &str, prefix: &str) -> Self {
        let stem = format!("{library_id}-attribute_{prefix}");
        Self {
            hidden: format!("{stem}_hidden"),
            input: format!("{stem}_input"),
            output: format!("{stem}_output"),
            add_button: format!("{stem}_add"),
            list: format!("{stem}_list"),
        }
    }

    /// Library id from a hidden mapping input id.
    pub fn library_id(hidden_id: &str) -> Option<&str> {
        hidden_id.split_once("-attribute_").map(|(library, _)| library)
    }
}

/// An ordered list of unique strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEditor {
    field: String,
    items: Vec<String>,
}

impl ListEditor {
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let items = if raw.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<String>>(raw).map_err(|source| WizardError::MalformedJson {
                field: field.to_string(),
                source,
            })?
        };
        Ok(Self {
            field: field.to_string(),
            items: items
                .into_iter()
                .map(|item| item.trim().trim_matches('"').to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        })
    }

    /// Like [`Self::parse`] but a malformed value starts the editor empty.
    pub fn load(field: &str, raw: &str) -> Self {
        Self::parse(field, raw).unwrap_or_else(|err| {
            warn!("{err}");
            Self {
                field: field.to_string(),
                items: Vec::new(),
            }
        })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn add(&mut self, raw: &str) -> Result<()> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(WizardError::MissingFields(vec![self.field.clone()]));
        }
        if self.items.iter().any(|item| item == value) {
            return Err(WizardError::rejected(format!("{value} is already in the list")));
        }
        self.items.push(value.to_string());
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Hidden input value; empty lists serialize to an empty string.
    pub fn serialize(&self) -> String {
        if self.items.is_empty() {
            String::new()
        } else {
            Value::from(self.items.clone()).to_string()
        }
    }
}

/// Key to optional replacement; a missing replacement removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingEditor {
    field: String,
    entries: Vec<(String, Option<String>)>,
}

impl MappingEditor {
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let map = if raw.is_empty() {
            Map::new()
        } else {
            serde_json::from_str::<Map<String, Value>>(raw).map_err(|source| {
                WizardError::MalformedJson {
                    field: field.to_string(),
                    source,
                }
            })?
        };
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(text) if !text.is_empty() => Some(text),
                    Value::Null | Value::String(_) => None,
                    other => Some(other.to_string()),
                };
                (key, value)
            })
            .collect();
        Ok(Self {
            field: field.to_string(),
            entries,
        })
    }

    pub fn load(field: &str, raw: &str) -> Self {
        Self::parse(field, raw).unwrap_or_else(|err| {
            warn!("{err}");
            Self {
                field: field.to_string(),
                entries: Vec::new(),
            }
        })
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    pub fn add(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(WizardError::MissingFields(vec![self.field.clone()]));
        }
        if self.entries.iter().any(|(existing, _)| existing == key) {
            return Err(WizardError::rejected(format!("{key} is already mapped")));
        }
        let value = value.trim();
        self.entries.push((
            key.to_string(),
            (!value.is_empty()).then(|| value.to_string()),
        ));
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != key);
        self.entries.len() != before
    }

    pub fn serialize(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(key, value)| {
                let value = value.clone().map_or(Value::Null, Value::String);
                (key.clone(), value)
            })
            .collect();
        Value::Object(map).to_string()
    }

    pub fn display(key: &str, value: Option<&str>) -> String {
        match value {
            Some(value) => format!("{key} → {value}"),
            None => format!("{key} → (remove)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rejects_blank_and_duplicates() {
        let mut editor = ListEditor::load("genres", r#"["Action"]"#);
        assert!(matches!(editor.add("  "), Err(WizardError::MissingFields(_))));
        assert!(matches!(editor.add("Action"), Err(WizardError::Rejected(_))));
        editor.add(" Drama ").unwrap();
        assert_eq!(editor.items(), ["Action", "Drama"]);
        assert_eq!(editor.serialize(), r#"["Action","Drama"]"#);
        assert_eq!(editor.remove(0).as_deref(), Some("Action"));
        assert_eq!(editor.remove(5), None);
        editor.remove(0);
        assert_eq!(editor.serialize(), "");
    }

    #[test]
    fn malformed_json_degrades_to_empty() {
        assert!(ListEditor::parse("tags", "{oops").is_err());
        assert!(ListEditor::load("tags", "{oops").items().is_empty());
        assert!(MappingEditor::load("genre_mapper", "[1,2").entries().is_empty());
    }

    #[test]
    fn mapping_keys_are_unique_and_ordered() {
        let mut editor = MappingEditor::load("genre_mapper", r#"{"Sci-Fi": "Science Fiction"}"#);
        editor.add("Anime", "").unwrap();
        assert!(editor.add("Sci-Fi", "Other").is_err());
        assert_eq!(
            editor.serialize(),
            r#"{"Sci-Fi":"Science Fiction","Anime":null}"#
        );
        assert_eq!(MappingEditor::display("Anime", None), "Anime → (remove)");
        assert!(editor.remove("Sci-Fi"));
        assert!(!editor.remove("Sci-Fi"));
        assert_eq!(editor.serialize(), r#"{"Anime":null}"#);
    }

    #[test]
    fn editor_ids() {
        let ids = MappingEditorIds::new("mov-library_movies", "genre_mapper");
        assert_eq!(ids.hidden, "mov-library_movies-attribute_genre_mapper_hidden");
        assert_eq!(
            MappingEditorIds::library_id(&ids.hidden),
            Some("mov-library_movies")
        );
        let ids = ListEditorIds::new("sho-library_tv", "metadata_backup");
        assert_eq!(ids.add_button, "sho-library_tv-metadata_backup_custom_add");
    }
}
