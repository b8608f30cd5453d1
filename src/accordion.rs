//! Header highlighting for the nested library accordions.
//!
//! The page is read into a tree of [`AccordionNode`]s, one per
//! `.accordion-item`, each holding only the controls that sit directly
//! inside it. Highlights are a pure function of that tree.

use std::collections::BTreeMap;

use tracing::debug;

const PREVIEW_OVERLAYS: &str = "preview overlays";
const OVERLAYS: &str = "overlays";

/// A form control directly owned by an accordion section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Toggle { checked: bool },
    Select { value: String },
    /// Rendered items of a custom list or mapping editor.
    ListItems(usize),
}

impl Control {
    pub fn toggle(checked: bool) -> Self {
        Self::Toggle { checked }
    }

    pub fn select(value: impl Into<String>) -> Self {
        Self::Select {
            value: value.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Toggle { checked } => *checked,
            Self::Select { value } => {
                let value = value.trim();
                !value.is_empty() && value != "none"
            }
            Self::ListItems(count) => *count > 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccordionNode {
    /// Stable handle the caller uses to find the header again.
    pub key: String,
    pub title: String,
    pub controls: Vec<Control>,
    pub children: Vec<AccordionNode>,
}

impl AccordionNode {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_child(mut self, child: AccordionNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_preview(&self) -> bool {
        self.title.to_lowercase().contains(PREVIEW_OVERLAYS)
    }

    pub fn is_overlays_section(&self) -> bool {
        self.title.trim().eq_ignore_ascii_case(OVERLAYS)
    }

    fn own_active(&self) -> bool {
        self.controls.iter().any(Control::is_active)
    }

    /// Path of keys from this node down to `key`, inclusive.
    fn path_to(&self, key: &str) -> Option<Vec<String>> {
        if self.key == key {
            return Some(vec![self.key.clone()]);
        }
        self.children.iter().find_map(|child| {
            child.path_to(key).map(|mut path| {
                path.insert(0, self.key.clone());
                path
            })
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderState {
    pub selected: bool,
    pub invalid: bool,
}

/// Header classes for every node, keyed by node key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    states: BTreeMap<String, HeaderState>,
}

impl Highlights {
    pub fn compute(roots: &[AccordionNode]) -> Self {
        let mut highlights = Self::default();
        for root in roots {
            highlights.visit(root);
        }
        highlights
    }

    fn visit(&mut self, node: &AccordionNode) -> bool {
        let mut child_selected = false;
        for child in &node.children {
            child_selected |= self.visit(child);
        }
        let selected = if node.is_preview() {
            false
        } else if node.is_overlays_section() {
            child_selected
        } else {
            node.own_active() || child_selected
        };
        self.states.insert(
            node.key.clone(),
            HeaderState {
                selected,
                invalid: false,
            },
        );
        selected
    }

    pub fn get(&self, key: &str) -> HeaderState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, HeaderState)> {
        self.states.iter().map(|(key, state)| (key.as_str(), *state))
    }

    pub fn any_selected(&self) -> bool {
        self.states.values().any(|state| state.selected)
    }

    /// Marks the chain from `key` up to its root. Invalid chains lose
    /// their highlight; valid ones gain it.
    pub fn mark_chain(&mut self, roots: &[AccordionNode], key: &str, invalid: bool) {
        let Some(path) = roots.iter().find_map(|root| root.path_to(key)) else {
            debug!("no accordion node {key} to mark");
            return;
        };
        for node_key in path {
            let state = self.states.entry(node_key).or_default();
            state.invalid = invalid;
            state.selected = !invalid;
        }
    }

    pub fn invalid_keys(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, state)| state.invalid)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
