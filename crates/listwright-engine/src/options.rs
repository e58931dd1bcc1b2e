use serde::{Deserialize, Serialize};

use crate::ordinal::OrdinalType;

/// Tag used for content that leaves a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnterMode {
    #[default]
    P,
    Div,
    /// Freed inline content stays unwrapped, separated by `br`s.
    Br,
}

impl EnterMode {
    pub fn paragraph_tag(self) -> &'static str {
        match self {
            EnterMode::P => "p",
            EnterMode::Div | EnterMode::Br => "div",
        }
    }
}

/// Behaviour switches for the list engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub enter_mode: EnterMode,
    /// Numbering type of a freshly created ordered list.
    pub default_ordinal_type: OrdinalType,
    /// Type given to a list whose first label is plain digits.
    pub numeric_labels_as: OrdinalType,
    /// Wrap new lists in a `div` carrying `wrapper_class` and a fresh id.
    pub wrap_lists: bool,
    pub label_class: String,
    /// Class put on new `ol`s, whose labels replace the default marker.
    pub unmarked_class: String,
    pub wrapper_class: String,
    /// Items carrying this class are numbered by hand.
    pub exception_class: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            enter_mode: EnterMode::P,
            default_ordinal_type: OrdinalType::Outline,
            numeric_labels_as: OrdinalType::Outline,
            wrap_lists: false,
            label_class: "label".to_string(),
            unmarked_class: "no_mark".to_string(),
            wrapper_class: "list".to_string(),
            exception_class: "exception".to_string(),
        }
    }
}

impl ListOptions {
    pub fn paragraph_tag(&self) -> &'static str {
        self.enter_mode.paragraph_tag()
    }
}
