//! # Lists
//!
//! Structure and numbering of nested lists. Every structural edit works the
//! same way: flatten the affected list into a [`ListArray`], change indents
//! or containers, build a replacement fragment, splice it in, then renumber.
//! Building never touches the live tree, so a failed operation leaves the
//! document exactly as it was.
//!
//! ## Modules
//!
//! - **`array`**: flatten/build between list trees and [`ListRecord`]s
//! - **`inherit`**: direction/style/class propagation tables
//! - **`renumber`**: label creation and renumbering for `ol`/`ul`
//! - **`indent`**: indent and outdent of item ranges
//! - **`create`**, **`remove`**, **`convert`**, **`merge`**: the other
//!   structural operations
//! - **`toggle`**: the list button command built from the operations above

pub mod array;
mod convert;
mod create;
mod indent;
pub mod inherit;
mod merge;
mod remove;
pub mod renumber;
mod toggle;

use uuid::Uuid;

use crate::dom::{Document, NodeId};
use crate::options::ListOptions;

pub use array::{BuiltList, ListArray, ListRecord, OUTDENT, build, flatten};
pub use convert::change_list_type;
pub use create::create_list;
pub use indent::{ItemRange, indent, outdent};
pub use merge::merge_adjacent_lists;
pub use remove::remove_list;
pub use renumber::{
    LabelReport, Numbering, infer_ordinal_type, is_manually_numbered, renumber_document,
    renumber_list, renumber_ordered, renumber_unordered,
};
pub use toggle::toggle_list;

/// What a structural operation did. An empty change means nothing happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChange {
    /// Top-level nodes that were inserted or survived a merge.
    pub roots: Vec<NodeId>,
    pub labels: LabelReport,
    /// Node a host would move the caret into.
    pub focus: Option<NodeId>,
}

impl ListChange {
    pub fn is_noop(&self) -> bool {
        self.roots.is_empty() && self.labels.is_empty() && self.focus.is_none()
    }

    pub fn absorb(&mut self, other: ListChange) {
        for root in other.roots {
            if !self.roots.contains(&root) {
                self.roots.push(root);
            }
        }
        self.labels.extend(other.labels);
        if other.focus.is_some() {
            self.focus = other.focus;
        }
    }
}

pub fn is_label(doc: &Document, node: NodeId, options: &ListOptions) -> bool {
    doc.is_tag(node, "span") && doc.has_class(node, &options.label_class)
}

/// The paragraph holding an item's label: the first `p` whose nearest item
/// is `item` itself.
pub fn label_paragraph(doc: &Document, item: NodeId) -> Option<NodeId> {
    doc.find_first(item, |node| {
        doc.is_tag(node, "p") && doc.ascendant(node, "li") == Some(item)
    })
}

pub fn find_label(doc: &Document, item: NodeId, options: &ListOptions) -> Option<NodeId> {
    let paragraph = label_paragraph(doc, item)?;
    doc.find_first(paragraph, |node| is_label(doc, node, options))
}

/// Detach a label together with the whitespace that separated it from the
/// item text.
pub fn remove_label(doc: &mut Document, label: NodeId) {
    if let Some(next) = doc.next_sibling(label)
        && let Some(text) = doc.text(next)
    {
        let rest = text
            .trim_start_matches(|c: char| c.is_whitespace() || c == '\u{a0}')
            .to_string();
        if rest.is_empty() {
            doc.detach(next);
        } else {
            doc.set_text(next, &rest);
        }
    }
    doc.detach(label);
}

/// The node standing for `list` among its siblings: its wrapper, if any.
pub fn outer_node(doc: &Document, list: NodeId, options: &ListOptions) -> NodeId {
    doc.parent(list)
        .filter(|&parent| doc.is_wrapper(parent, &options.wrapper_class))
        .unwrap_or(list)
}

/// Lists represented by `node`: itself, or the lists inside a wrapper.
pub fn lists_in(doc: &Document, node: NodeId, options: &ListOptions) -> Vec<NodeId> {
    if doc.is_list(node) {
        vec![node]
    } else if doc.is_wrapper(node, &options.wrapper_class) {
        doc.children(node)
            .iter()
            .copied()
            .filter(|&child| doc.is_list(child))
            .collect()
    } else {
        Vec::new()
    }
}

/// The outermost list containing `node` (inclusive).
pub fn outermost_list(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.ancestors_inclusive(node)
        .filter(|&ancestor| doc.is_list(ancestor))
        .last()
}

/// Lists nested directly inside an item.
pub fn sub_lists(doc: &Document, item: NodeId) -> Vec<NodeId> {
    doc.children(item)
        .iter()
        .copied()
        .filter(|&child| doc.is_list(child))
        .collect()
}

/// Items of a list, skipping anything that is not an `li`.
pub fn items_of(doc: &Document, list: NodeId) -> Vec<NodeId> {
    doc.children(list)
        .iter()
        .copied()
        .filter(|&child| doc.is_list_item(child))
        .collect()
}

/// Create an empty list container, wrapped when the options ask for it.
/// Returns `(outer, list)`; `outer` is the node to insert.
pub fn create_list_node(doc: &mut Document, tag: &str, options: &ListOptions) -> (NodeId, NodeId) {
    let list = doc.create_element(tag);
    if tag == "ol" {
        doc.add_class(list, &options.unmarked_class);
        doc.set_list_type(list, options.default_ordinal_type);
    }
    if !options.wrap_lists {
        return (list, list);
    }
    let wrapper = doc.create_element("div");
    doc.add_class(wrapper, &options.wrapper_class);
    doc.set_attr(wrapper, "id", Uuid::new_v4().to_string());
    doc.append_child(wrapper, list);
    (wrapper, list)
}

/// Replace `target` by the children of `fragment`, returning them.
pub(crate) fn splice(doc: &mut Document, target: NodeId, fragment: NodeId) -> Vec<NodeId> {
    let inserted = doc.children(fragment).to_vec();
    doc.replace(target, fragment);
    for &node in &inserted {
        clean_up_directions(doc, node);
    }
    inserted
}

/// Drop item `dir` attributes that match the direction they would inherit.
pub(crate) fn clean_up_directions(doc: &mut Document, root: NodeId) {
    let mut nodes = vec![root];
    nodes.extend(doc.descendants(root));
    for node in nodes {
        if !doc.is_list_item(node) {
            continue;
        }
        if let Some(own) = doc.direction(node)
            && let Some(parent) = doc.parent(node)
            && doc.resolved_direction(parent) == own
        {
            doc.remove_attr(node, "dir");
        }
    }
}

/// Renumber every list among `nodes`, looking inside wrappers.
pub(crate) fn renumber_nodes(
    doc: &mut Document,
    nodes: &[NodeId],
    indent: bool,
    options: &ListOptions,
) -> LabelReport {
    let mut report = LabelReport::default();
    for &node in nodes {
        for list in lists_in(doc, node, options) {
            if let Ok(labels) = renumber_list(doc, list, indent, options) {
                report.extend(labels);
            }
        }
    }
    report
}
