//! Label text parsing.
//!
//! A label such as `"(2.3.a)"` splits into a prefix (`"(2.3."`), the ordinal
//! token (`"a"`) and a suffix (`")"`). The prefix itself is a leading marker
//! (`"("`, `"Class "`, `"CHAPTER "`) followed by an outline chain of dotted
//! ordinals.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn label_regex() -> &'static Regex {
    static LABEL_REGEX: OnceLock<Regex> = OnceLock::new();
    LABEL_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^(?P<marker>\s*(?:\(|Class|CHAPTER)?\s*)(?P<chain>(?:[a-z0-9]+\.)*)(?P<ordinal>[a-z0-9]+)(?P<suffix>\s*?(?:[.)])?.*?)$",
        )
        .expect("Invalid label regex")
    })
}

/// The parts of a parsed label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts {
    /// The trimmed label text the parts were taken from.
    pub text: String,
    pub marker: String,
    pub chain: String,
    pub ordinal: String,
    pub suffix: String,
}

impl LabelParts {
    /// Marker plus outline chain: everything before the ordinal.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.marker, self.chain)
    }

    /// The label with a new ordinal and, when it differs, a new prefix.
    pub fn relabel(&self, prefix: &str, ordinal: &str) -> String {
        let label = replace_ordinal(&self.text, ordinal);
        if self.prefix() == prefix {
            label
        } else {
            replace_prefix(&label, prefix)
        }
    }

    /// The prefix a child item of this label takes in outline numbering.
    pub fn outline_chain(&self) -> String {
        format!("{}{}.", self.chain, self.ordinal)
    }
}

/// Strip trailing whitespace and non-breaking spaces, written either as the
/// character or as the `&nbsp;` entity.
fn trim_label(text: &str) -> &str {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
        match trimmed.strip_suffix("&nbsp;") {
            Some(shorter) => rest = shorter,
            None => return trimmed,
        }
    }
}

/// Split a label into its parts. `None` means there is no ordinal to work
/// with, which callers treat as "leave the label alone" rather than an error.
pub fn parse(label: &str) -> Option<LabelParts> {
    let text = trim_label(label);
    let captures = label_regex().captures(text)?;
    let group = |name: &str| captures.name(name).map_or("", |m| m.as_str()).to_string();
    Some(LabelParts {
        text: text.to_string(),
        marker: group("marker"),
        chain: group("chain"),
        ordinal: group("ordinal"),
        suffix: group("suffix"),
    })
}

/// Substitute only the ordinal token, keeping everything else verbatim.
pub fn replace_ordinal(label: &str, ordinal: &str) -> String {
    label_regex()
        .replace(label, |caps: &Captures<'_>| {
            format!("{}{}{}{}", &caps["marker"], &caps["chain"], ordinal, &caps["suffix"])
        })
        .into_owned()
}

/// Substitute the whole prefix (marker and chain), keeping the ordinal and
/// the suffix verbatim.
pub fn replace_prefix(label: &str, prefix: &str) -> String {
    label_regex()
        .replace(label, |caps: &Captures<'_>| {
            format!("{}{}{}", prefix, &caps["ordinal"], &caps["suffix"])
        })
        .into_owned()
}
