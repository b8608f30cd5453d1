//! The libraries page: which Plex libraries are configured and whether
//! each of them has enough selected to be written out.

use tracing::debug;

use crate::accordion::{AccordionNode, Highlights};
use crate::api::MediaKind;
use crate::flags::{StatusMessage, flag_value};
use crate::navigation::{JumpLink, NavState, plex_gate_link};
use crate::separator;

pub const LIBRARIES_INPUT: &str = "libraries";
pub const LIBRARIES_FLAG: &str = "libraries_validated";
pub const PLAYLIST_FILES_FLAG: &str = "playlist_files_validated";

pub const VALID_MESSAGE: &str = "Validation successful! You may proceed.";
pub const NO_LIBRARY_MESSAGE: &str = "You must select at least one library to proceed.";
pub const INVALID_MESSAGE: &str = "Please review your selections: ensure you have picked at least one library, selected an item inside each chosen library, and if using Separators, selected a valid Placeholder IMDb ID. Items needing attention are highlighted in red below.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Key of the accordion node holding the dropdown.
    pub node_key: String,
    pub value: String,
}

/// One library's card as read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCard {
    /// Element id stem, e.g. `mov-library_movies`.
    pub id: String,
    /// Checkbox value, the Plex library title.
    pub name: String,
    pub checked: bool,
    pub accordion: Vec<AccordionNode>,
    pub separator_style: String,
    pub placeholder: Option<Placeholder>,
}

impl LibraryCard {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            checked: false,
            accordion: Vec::new(),
            separator_style: separator::NO_SEPARATOR.to_string(),
            placeholder: None,
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_library_id(&self.id)
    }

    pub fn container_id(&self) -> String {
        format!("{}-container", self.id)
    }

    pub fn card_container_id(&self) -> String {
        format!("{}-card-container", self.id)
    }

    fn placeholder_ok(&self) -> bool {
        let value = self.placeholder.as_ref().map_or("", |p| p.value.as_str());
        separator::placeholder_satisfied(&self.separator_style, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrariesPage {
    pub plex_valid: bool,
    pub cards: Vec<LibraryCard>,
}

/// Everything the page shows after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct LibrariesEvaluation {
    pub valid: bool,
    pub libraries_value: String,
    pub message: StatusMessage,
    pub gate: Option<JumpLink>,
    pub nav: NavState,
    pub highlights: Highlights,
    /// Library containers that get the red border.
    pub invalid_containers: Vec<String>,
    /// Placeholder nodes that need `is-invalid`.
    pub invalid_placeholders: Vec<String>,
    /// `(card container id, visible)`.
    pub card_visibility: Vec<(String, bool)>,
}

impl LibrariesEvaluation {
    pub fn flag_value(&self) -> &'static str {
        flag_value(self.valid)
    }
}

impl LibrariesPage {
    /// Re-checks cards listed in the saved comma list.
    pub fn restore(&mut self, saved: &str) {
        let saved: Vec<&str> = saved
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        for card in &mut self.cards {
            if saved.contains(&card.name.trim()) {
                card.checked = true;
            }
        }
    }

    pub fn selected_libraries(&self, kind: MediaKind) -> Vec<String> {
        self.cards
            .iter()
            .filter(|card| card.checked && card.kind() == Some(kind))
            .map(|card| card.name.trim().to_string())
            .collect()
    }

    /// Movie libraries then show libraries, comma-joined.
    pub fn libraries_value(&self) -> String {
        let mut all = self.selected_libraries(MediaKind::Movie);
        all.extend(self.selected_libraries(MediaKind::Show));
        all.join(",")
    }

    pub fn evaluate(&self) -> LibrariesEvaluation {
        let roots: Vec<AccordionNode> = self
            .cards
            .iter()
            .flat_map(|card| card.accordion.iter().cloned())
            .collect();
        let mut highlights = Highlights::compute(&roots);
        let card_visibility = self
            .cards
            .iter()
            .map(|card| (card.card_container_id(), self.plex_valid && card.checked))
            .collect();

        if !self.plex_valid {
            let gate = plex_gate_link();
            return LibrariesEvaluation {
                valid: false,
                libraries_value: self.libraries_value(),
                message: StatusMessage::error(gate.plain_text()),
                gate: Some(gate),
                nav: NavState::from_validity(false),
                highlights,
                invalid_containers: Vec::new(),
                invalid_placeholders: Vec::new(),
                card_visibility,
            };
        }

        let selected: Vec<&LibraryCard> = self.cards.iter().filter(|card| card.checked).collect();
        let invalid_containers: Vec<String> = selected
            .iter()
            .filter(|card| !Highlights::compute(&card.accordion).any_selected())
            .map(|card| card.container_id())
            .collect();

        let mut invalid_placeholders = Vec::new();
        for card in &self.cards {
            let Some(placeholder) = &card.placeholder else {
                continue;
            };
            if !separator::is_enabled(&card.separator_style) {
                continue;
            }
            let ok = card.placeholder_ok();
            highlights.mark_chain(&card.accordion, &placeholder.node_key, !ok);
            if !ok {
                invalid_placeholders.push(placeholder.node_key.clone());
            }
        }

        // Placeholders count on every card, ticked or not.
        let valid =
            !selected.is_empty() && invalid_containers.is_empty() && invalid_placeholders.is_empty();
        debug!(
            "libraries valid={valid} selected={} invalid={}",
            selected.len(),
            invalid_containers.len()
        );
        let message = if valid {
            StatusMessage::success(VALID_MESSAGE)
        } else if selected.is_empty() {
            StatusMessage::error(NO_LIBRARY_MESSAGE)
        } else {
            StatusMessage::error(INVALID_MESSAGE)
        };
        LibrariesEvaluation {
            valid,
            libraries_value: self.libraries_value(),
            message,
            gate: None,
            nav: NavState::from_validity(valid),
            highlights,
            invalid_containers,
            invalid_placeholders,
            card_visibility,
        }
    }
}

/// The playlist files page only needs one library ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistLibraries {
    pub plex_valid: bool,
    pub available: Vec<String>,
    pub selected: Vec<String>,
}

impl PlaylistLibraries {
    pub fn new(plex_valid: bool, available: Vec<String>, saved: &str) -> Self {
        let selected = saved
            .split(',')
            .map(str::trim)
            .filter(|name| available.iter().any(|a| a.as_str() == *name))
            .map(str::to_string)
            .collect();
        Self {
            plex_valid,
            available,
            selected,
        }
    }

    pub fn toggle(&mut self, name: &str, checked: bool) {
        let name = name.trim();
        self.selected.retain(|s| s != name);
        if checked {
            self.selected.push(name.to_string());
        }
        // Keep page order.
        let order = &self.available;
        self.selected
            .sort_by_key(|s| order.iter().position(|a| a == s).unwrap_or(usize::MAX));
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    pub fn value(&self) -> String {
        self.selected.join(", ")
    }

    pub fn is_valid(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn gate(&self) -> Option<JumpLink> {
        (!self.plex_valid).then(plex_gate_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accordion::Control;

    fn card(id: &str, name: &str, item_checked: bool) -> LibraryCard {
        let mut card = LibraryCard::new(id, name);
        card.accordion = vec![
            AccordionNode::new(format!("{id}-attributes"), "Attributes").with_child(
                AccordionNode::new(format!("{id}-mass_genre"), "Mass Genre Update")
                    .with_control(Control::toggle(item_checked)),
            ),
        ];
        card
    }

    fn with_separator(mut card: LibraryCard, style: &str, placeholder: &str) -> LibraryCard {
        let key = format!("{}-placeholder", card.id);
        card.accordion.push(
            AccordionNode::new(format!("{}-separators", card.id), "Separators")
                .with_control(Control::select(style))
                .with_child(
                    AccordionNode::new(key.clone(), "Placeholder IMDb ID")
                        .with_control(Control::select(placeholder)),
                ),
        );
        card.separator_style = style.to_string();
        card.placeholder = Some(Placeholder {
            node_key: key,
            value: placeholder.to_string(),
        });
        card
    }

    #[test]
    fn one_library_one_item_no_separator_is_valid() {
        let mut page = LibrariesPage {
            plex_valid: true,
            cards: vec![card("mov-library_movies", "Movies", true)],
        };
        page.cards[0].checked = true;
        let eval = page.evaluate();
        assert!(eval.valid);
        assert_eq!(eval.flag_value(), "true");
        assert_eq!(eval.libraries_value, "Movies");
        assert!(eval.nav.next && eval.nav.jump && eval.nav.previous);
        assert_eq!(eval.message.text, VALID_MESSAGE);
    }

    #[test]
    fn separator_without_placeholder_is_invalid() {
        let mut page = LibrariesPage {
            plex_valid: true,
            cards: vec![with_separator(
                card("mov-library_movies", "Movies", true),
                "blue",
                "",
            )],
        };
        page.cards[0].checked = true;
        let eval = page.evaluate();
        assert!(!eval.valid);
        assert!(!eval.nav.next);
        assert!(eval.nav.previous);
        assert_eq!(eval.invalid_placeholders, vec!["mov-library_movies-placeholder"]);
        assert!(eval.highlights.get("mov-library_movies-placeholder").invalid);
        assert!(eval.highlights.get("mov-library_movies-separators").invalid);
    }

    #[test]
    fn unticked_library_missing_placeholder_blocks_page() {
        let mut page = LibrariesPage {
            plex_valid: true,
            cards: vec![
                card("mov-library_movies", "Movies", true),
                with_separator(card("sho-library_shows", "Shows", false), "blue", ""),
            ],
        };
        page.cards[0].checked = true;
        let eval = page.evaluate();
        assert!(!eval.valid);
        assert!(!eval.nav.next);
        assert_eq!(eval.invalid_placeholders, vec!["sho-library_shows-placeholder"]);
        assert_eq!(eval.message.text, INVALID_MESSAGE);
        assert_eq!(eval.flag_value(), "false");
    }

    #[test]
    fn validity_agrees_with_reported_problems() {
        let layouts = [
            (true, "blue", "", false, "none", ""),
            (true, "blue", "tt0111161", false, "blue", ""),
            (true, "none", "", false, "blue", "tt0068646"),
            (false, "blue", "", true, "none", ""),
            (true, "blue", "tt0111161", true, "gray", "tt0068646"),
            (false, "none", "", false, "none", ""),
        ];
        for (movie_on, movie_style, movie_ph, show_on, show_style, show_ph) in layouts {
            let mut page = LibrariesPage {
                plex_valid: true,
                cards: vec![
                    with_separator(card("mov-library_movies", "Movies", true), movie_style, movie_ph),
                    with_separator(card("sho-library_shows", "Shows", true), show_style, show_ph),
                ],
            };
            page.cards[0].checked = movie_on;
            page.cards[1].checked = show_on;
            let eval = page.evaluate();
            let expected = (movie_on || show_on)
                && eval.invalid_containers.is_empty()
                && eval.invalid_placeholders.is_empty();
            assert_eq!(eval.valid, expected, "{movie_on} {movie_style} {show_on} {show_style}");
            assert_eq!(eval.nav.next, eval.valid);
        }
    }

    #[test]
    fn clearing_only_content_rating_invalidates_library() {
        let mut group = crate::images::ContentRatingGroup::new(None);
        group.click("us_movie");
        let rated = |group: &crate::images::ContentRatingGroup| {
            let mut card = LibraryCard::new("mov-library_movies", "Movies");
            card.checked = true;
            card.accordion = vec![
                AccordionNode::new("mov-library_movies-overlays", "Overlays").with_child(
                    AccordionNode::new("mov-library_movies-overlay_content_rating_us_movie", "US")
                        .with_control(Control::toggle(group.selected() == Some("us_movie"))),
                ),
            ];
            LibrariesPage {
                plex_valid: true,
                cards: vec![card],
            }
        };
        assert!(rated(&group).evaluate().valid);

        group.click("us_movie");
        let eval = rated(&group).evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.invalid_containers, vec!["mov-library_movies-container"]);
    }

    #[test]
    fn selected_library_without_items_gets_red_border() {
        let mut page = LibrariesPage {
            plex_valid: true,
            cards: vec![
                card("mov-library_movies", "Movies", true),
                card("sho-library_tv_shows", "TV Shows", false),
            ],
        };
        page.restore("Movies, TV Shows");
        let eval = page.evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.invalid_containers, vec!["sho-library_tv_shows-container"]);
        assert_eq!(eval.libraries_value, "Movies,TV Shows");
        assert_eq!(eval.message.text, INVALID_MESSAGE);
    }

    #[test]
    fn joined_value_matches_selection_order() {
        let mut page = LibrariesPage {
            plex_valid: true,
            cards: vec![
                card("sho-library_anime", "Anime", true),
                card("mov-library_movies", "Movies", true),
            ],
        };
        page.restore("Anime,Movies");
        let mut expected = page.selected_libraries(MediaKind::Movie);
        expected.extend(page.selected_libraries(MediaKind::Show));
        assert_eq!(page.evaluate().libraries_value, expected.join(","));
        assert_eq!(page.libraries_value(), "Movies,Anime");
    }

    #[test]
    fn nothing_selected_is_invalid() {
        let page = LibrariesPage {
            plex_valid: true,
            cards: vec![card("mov-library_movies", "Movies", true)],
        };
        let eval = page.evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.message.text, NO_LIBRARY_MESSAGE);
        assert_eq!(
            eval.card_visibility,
            vec![("mov-library_movies-card-container".to_string(), false)]
        );
    }

    #[test]
    fn plex_gate_blocks_page() {
        let mut page = LibrariesPage {
            plex_valid: false,
            cards: vec![card("mov-library_movies", "Movies", true)],
        };
        page.cards[0].checked = true;
        let eval = page.evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.gate.unwrap().step, "010-plex");
        assert!(eval.nav.previous && !eval.nav.next);
        assert!(eval.card_visibility.iter().all(|(_, visible)| !visible));
    }

    #[test]
    fn playlist_page_needs_one_library() {
        let mut page = PlaylistLibraries::new(
            true,
            vec!["Movies".to_string(), "TV Shows".to_string()],
            "TV Shows, Gone",
        );
        assert_eq!(page.value(), "TV Shows");
        page.toggle("Movies", true);
        assert_eq!(page.value(), "Movies, TV Shows");
        page.toggle("Movies", false);
        page.toggle("TV Shows", false);
        assert!(!page.is_valid());
        assert!(page.gate().is_none());
    }
}
