//! Attribute propagation when content changes parents.
//!
//! Each situation has a table of (attribute, rule) pairs. The tables are
//! applied the same way by the array builder, the create/remove operations
//! and the Enter handling.

use crate::dom::{Direction, Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Stamp the source direction on a target without its own `dir`, when
    /// the source direction differs from the target's new surroundings.
    Direction,
    /// Put the source declarations in front of the target's own.
    PrependStyle,
    /// Add the source classes to the target's.
    MergeClasses,
    /// Overwrite the target attribute with the source value.
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub attribute: &'static str,
    pub propagation: Propagation,
}

const fn rule(attribute: &'static str, propagation: Propagation) -> Rule {
    Rule {
        attribute,
        propagation,
    }
}

/// Existing blocks freed from an outdented item.
pub const FREED_BLOCK: &[Rule] = &[
    rule("dir", Propagation::Direction),
    rule("style", Propagation::PrependStyle),
    rule("class", Propagation::MergeClasses),
];

/// A block created to hold inline content freed from an item.
pub const WRAPPING_BLOCK: &[Rule] = &[
    rule("dir", Propagation::Direction),
    rule("style", Propagation::Copy),
    rule("class", Propagation::Copy),
];

/// An item moved into another container.
pub const MOVED_ITEM: &[Rule] = &[rule("dir", Propagation::Direction)];

/// Direction facts about the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Resolved direction of the source before the move.
    pub direction: Direction,
    /// The destination resolves to a different direction.
    pub loose: bool,
}

pub fn apply(doc: &mut Document, source: NodeId, target: NodeId, rules: &[Rule], context: Context) {
    for rule in rules {
        match rule.propagation {
            Propagation::Direction => {
                if context.loose && doc.attr(target, rule.attribute).is_none() {
                    doc.set_attr(target, rule.attribute, context.direction.as_str());
                }
            }
            Propagation::PrependStyle => {
                let Some(inherited) = doc.attr(source, rule.attribute) else {
                    continue;
                };
                let own = doc.attr(target, rule.attribute).unwrap_or_default();
                let separator = if inherited.trim_end().ends_with(';') { "" } else { ";" };
                let merged = format!("{}{separator}{own}", inherited.trim_end());
                doc.set_attr(target, rule.attribute, merged);
            }
            Propagation::MergeClasses => {
                let Some(classes) = doc.attr(source, rule.attribute).map(str::to_string) else {
                    continue;
                };
                for class in classes.split_whitespace() {
                    doc.add_class(target, class);
                }
            }
            Propagation::Copy => {
                if let Some(value) = doc.attr(source, rule.attribute).map(str::to_string) {
                    doc.set_attr(target, rule.attribute, value);
                }
            }
        }
    }
}

/// Stamp `item`'s direction on it when it differs from `destination`'s.
pub fn keep_direction(doc: &mut Document, item: NodeId, destination: NodeId) {
    let direction = doc.resolved_direction(item);
    let context = Context {
        direction,
        loose: direction != doc.resolved_direction(destination),
    };
    apply(doc, item, item, MOVED_ITEM, context);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tree;

    fn two_nodes(source: Tree, target: Tree) -> (Document, NodeId, NodeId) {
        let doc = Document::from_trees([source, target]);
        let children = doc.children(doc.body()).to_vec();
        (doc, children[0], children[1])
    }

    #[test]
    fn test_freed_block_rules() {
        let (mut doc, item, block) = two_nodes(
            Tree::element("li")
                .attr("style", "color: red")
                .attr("class", "a b"),
            Tree::element("p").attr("style", "margin: 0").attr("class", "b c"),
        );

        apply(
            &mut doc,
            item,
            block,
            FREED_BLOCK,
            Context {
                direction: Direction::Rtl,
                loose: true,
            },
        );

        assert_eq!(doc.attr(block, "style"), Some("color: red;margin: 0"));
        assert_eq!(doc.attr(block, "class"), Some("b c a"));
        assert_eq!(doc.attr(block, "dir"), Some("rtl"));
    }

    #[test]
    fn test_direction_is_not_stamped_when_not_loose() {
        let (mut doc, item, block) = two_nodes(Tree::element("li"), Tree::element("p"));

        apply(
            &mut doc,
            item,
            block,
            WRAPPING_BLOCK,
            Context {
                direction: Direction::Rtl,
                loose: false,
            },
        );

        assert_eq!(doc.attr(block, "dir"), None);
    }

    #[test]
    fn test_keep_direction_for_moved_item() {
        let (mut doc, rtl_list, ltr_list) = two_nodes(
            Tree::element("ol")
                .attr("dir", "rtl")
                .child(Tree::element("li")),
            Tree::element("ol"),
        );
        let item = doc.children(rtl_list)[0];

        keep_direction(&mut doc, item, ltr_list);

        assert_eq!(doc.attr(item, "dir"), Some("rtl"));
    }
}
