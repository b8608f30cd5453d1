//! Separator style cascade and the placeholder title it requires.

use tracing::debug;

use crate::api::{self, ImdbItem, MediaKind, Transport};
use crate::config::WizardConfig;
use crate::credentials::SelectOption;
use crate::error::Result;
use crate::flags::flag_value;

pub const NO_SEPARATOR: &str = "none";
pub const PLACEHOLDER_PROMPT: &str = "Select a placeholder";

/// Element ids and names derived from a library id such as
/// `mov-library_movies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorIds {
    pub style_name: String,
    pub use_separator_hidden: String,
    pub sep_style_hidden: String,
    pub award_toggle: String,
    pub chart_toggle: String,
    pub award_accordion_prefix: String,
    pub chart_accordion_prefix: String,
    pub preview_container: String,
    pub preview_image: String,
}

impl SeparatorIds {
    pub fn for_library(library_id: &str) -> Self {
        let style_name = format!("{library_id}-template_variables[use_separator]");
        let safe = style_name.replacen('[', "_", 1).replacen(']', "", 1);
        Self {
            use_separator_hidden: format!("{library_id}-template_variables_use_separator"),
            sep_style_hidden: format!("{library_id}-template_variables_sep_style"),
            award_toggle: format!("{library_id}-collection_separator_award"),
            chart_toggle: format!("{library_id}-collection_separator_chart"),
            award_accordion_prefix: format!("{library_id}-awardCollectionsAccordion"),
            chart_accordion_prefix: format!("{library_id}-chartCollectionsAccordion"),
            preview_container: format!("{safe}-separatorPreviewContainer"),
            preview_image: format!("{safe}-separatorPreviewImage"),
            style_name,
        }
    }
}

/// Library id for a placeholder dropdown, which carries the display name
/// and media type rather than the id.
pub fn library_id_for(kind: MediaKind, library_name: &str) -> String {
    let compact: String = library_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    format!("{}-library_{compact}", kind.prefix())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorInputs {
    pub style: String,
    pub award_items_checked: bool,
    pub chart_items_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub enabled: bool,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorState {
    pub use_separator: bool,
    pub sep_style: String,
    pub award: Toggle,
    pub chart: Toggle,
    pub preview_url: Option<String>,
    pub placeholder_required: bool,
}

impl SeparatorState {
    pub fn use_separator_value(&self) -> &'static str {
        flag_value(self.use_separator)
    }
}

pub fn is_enabled(style: &str) -> bool {
    let style = style.trim();
    !style.is_empty() && style != NO_SEPARATOR
}

/// Everything downstream of the style dropdown.
pub fn cascade(config: &WizardConfig, inputs: &SeparatorInputs) -> SeparatorState {
    let style = inputs.style.trim();
    let enabled = is_enabled(style);
    let toggle = |items_checked: bool| Toggle {
        enabled: enabled && items_checked,
        checked: enabled && items_checked,
    };
    let state = SeparatorState {
        use_separator: enabled,
        sep_style: if enabled { style.to_string() } else { String::new() },
        award: toggle(inputs.award_items_checked),
        chart: toggle(inputs.chart_items_checked),
        preview_url: enabled.then(|| config.separator_preview_url(style)),
        placeholder_required: enabled,
    };
    debug!("separator style {style:?} enabled={enabled}");
    state
}

/// The placeholder is satisfied unless separators are on and nothing is
/// chosen.
pub fn placeholder_satisfied(style: &str, placeholder: &str) -> bool {
    !is_enabled(style) || !placeholder.trim().is_empty()
}

/// Dropdown options for the placeholder select, keeping `current` even if
/// the backend no longer lists it.
pub fn placeholder_options(items: &[ImdbItem], current: &str) -> Vec<SelectOption> {
    let current = current.trim();
    let mut options = vec![SelectOption::new("", PLACEHOLDER_PROMPT)];
    options.extend(
        items
            .iter()
            .filter(|item| !item.id.trim().is_empty())
            .map(|item| SelectOption::new(item.id.trim(), item.label())),
    );
    if !current.is_empty() && !options.iter().any(|option| option.value == current) {
        options.push(SelectOption::new(current, current));
    }
    options
}

pub async fn load_placeholder_options<T: Transport>(
    transport: &T,
    library_name: &str,
    kind: MediaKind,
    current: &str,
) -> Result<Vec<SelectOption>> {
    let items = api::top_imdb_items(transport, library_name, kind, current.trim()).await?;
    Ok(placeholder_options(&items, current))
}
