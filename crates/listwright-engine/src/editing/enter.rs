//! Enter inside a list item.
//!
//! A non-empty item splits: a new item is inserted after it, labelled with
//! the previous label plus one, and the list is renumbered. An empty item
//! leaves its list instead, one level at a time.

use uuid::Uuid;

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::label;
use crate::lists::inherit::{self, Context, WRAPPING_BLOCK};
use crate::lists::{
    LabelReport, ListChange, find_label, infer_ordinal_type, is_label, items_of, label_paragraph,
    outer_node, outermost_list, remove_label, renumber_list, renumber_nodes, sub_lists,
};
use crate::options::{EnterMode, ListOptions};
use crate::ordinal;

/// Where the caret splits an item: children of `paragraph` from `offset`
/// on move to the new item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    pub paragraph: NodeId,
    pub offset: usize,
}

/// Enter in `item`. Anything that is not a list item is left alone.
pub fn enter(
    doc: &mut Document,
    item: NodeId,
    split: Option<SplitPoint>,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    if !doc.is_list_item(item) {
        log::debug!("enter outside a list item: {item:?}");
        return Ok(ListChange::default());
    }
    let list = doc
        .parent(item)
        .filter(|&parent| doc.is_list(parent))
        .ok_or(ListError::MissingContainer(item))?;

    if is_item_empty(doc, item, options) {
        return match doc.parent(list).filter(|&parent| doc.is_list_item(parent)) {
            Some(parent_item) => leave_nested(doc, item, list, parent_item, options),
            None => leave_top_level(doc, item, list, options),
        };
    }
    split_item(doc, item, list, split, options)
}

/// An item with nothing but its label, whitespace and line breaks.
pub fn is_item_empty(doc: &Document, item: NodeId, options: &ListOptions) -> bool {
    fn blank_line(doc: &Document, node: NodeId, options: &ListOptions) -> bool {
        if is_label(doc, node, options) {
            return true;
        }
        if doc.is_tag(node, "p") {
            return doc
                .children(node)
                .iter()
                .all(|&child| blank_line(doc, child, options));
        }
        doc.is_empty_content(node)
    }
    doc.children(item)
        .iter()
        .all(|&child| blank_line(doc, child, options))
}

fn split_item(
    doc: &mut Document,
    item: NodeId,
    list: NodeId,
    split: Option<SplitPoint>,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let new_item = doc.shallow_clone(item);
    doc.remove_attr(new_item, "value");
    doc.insert_after(item, new_item);

    let mut report = LabelReport::default();
    match split.filter(|point| doc.contains(item, point.paragraph)) {
        Some(SplitPoint { paragraph, offset }) => {
            let moved = doc.shallow_clone(paragraph);
            let tail: Vec<NodeId> = doc.children(paragraph).iter().skip(offset).copied().collect();
            for node in tail {
                doc.append_child(moved, node);
            }
            if let Some(label) = doc.find_first(moved, |node| is_label(doc, node, options)) {
                remove_label(doc, label);
                report.removed.push(label);
            }
            doc.append_child(new_item, moved);
            if let Some(top) = doc.child_towards(item, paragraph) {
                move_following(doc, item, top, new_item);
            }
        }
        None => {
            let paragraph = doc.create_element("p");
            doc.append_child(new_item, paragraph);
            match label_paragraph(doc, item).and_then(|p| doc.child_towards(item, p)) {
                Some(top) => move_following(doc, item, top, new_item),
                None => {
                    for sub_list in sub_lists(doc, item) {
                        doc.append_child(new_item, sub_list);
                    }
                }
            }
        }
    }

    if doc.is_tag(list, "ol")
        && let Some(label) = next_label(doc, item, list, options)
    {
        let paragraph = match label_paragraph(doc, new_item) {
            Some(paragraph) => paragraph,
            None => {
                let created = doc.create_element("p");
                doc.prepend_child(new_item, created);
                created
            }
        };
        let span = doc.create_element("span");
        doc.add_class(span, &options.label_class);
        doc.set_text(span, &label);
        let space = doc.create_text(" ");
        doc.prepend_child(paragraph, space);
        doc.prepend_child(paragraph, span);
        report.created.push(span);
    }

    report.extend(renumber_list(doc, list, false, options)?);
    Ok(ListChange {
        roots: vec![new_item],
        labels: report,
        focus: Some(new_item),
    })
}

/// Move the children of `item` after `top` to the end of `into`.
fn move_following(doc: &mut Document, item: NodeId, top: NodeId, into: NodeId) {
    let Some(index) = doc.index_in_parent(top) else {
        return;
    };
    let following: Vec<NodeId> = doc.children(item)[index + 1..].to_vec();
    for node in following {
        doc.append_child(into, node);
    }
}

/// The label of `item` with its ordinal moved on by one.
fn next_label(doc: &Document, item: NodeId, list: NodeId, options: &ListOptions) -> Option<String> {
    let label = find_label(doc, item, options)?;
    let parts = label::parse(&doc.text_content(label))?;
    let ordinal_type = doc
        .list_type(list)
        .or_else(|| infer_ordinal_type(doc, list, options))
        .unwrap_or(options.default_ordinal_type);
    match ordinal::translate(&parts.ordinal, 1, Some(ordinal_type)) {
        Ok(next) => Some(label::replace_ordinal(&parts.text, &next)),
        Err(err) => {
            log::warn!("cannot continue label {:?}: {err}", parts.text);
            None
        }
    }
}

/// Move an empty nested item up to its parent item's list.
fn leave_nested(
    doc: &mut Document,
    item: NodeId,
    list: NodeId,
    parent_item: NodeId,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let items = items_of(doc, list);
    let first = items.first() == Some(&item);
    let last = items.last() == Some(&item);
    log::debug!("leaving nested list {list:?} (first: {first}, last: {last})");

    if last {
        doc.insert_after(parent_item, item);
    } else if first {
        doc.insert_before(parent_item, item);
    } else {
        doc.break_parent(item, parent_item);
    }
    if items_of(doc, list).is_empty() {
        doc.detach(list);
    }

    let labels = match outermost_list(doc, item) {
        Some(outermost) => renumber_list(doc, outermost, false, options)?,
        None => LabelReport::default(),
    };
    Ok(ListChange {
        roots: vec![item],
        labels,
        focus: Some(item),
    })
}

/// Turn an empty top-level item into a block outside its list, splitting
/// the list when the item sits in the middle.
fn leave_top_level(
    doc: &mut Document,
    item: NodeId,
    list: NodeId,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let target = outer_node(doc, list, options);
    let Some(outside) = doc.parent(target) else {
        return Err(ListError::MissingContainer(item));
    };

    let direction = doc.resolved_direction(item);
    let loose = direction != doc.resolved_direction(outside);
    let needs_block = options.enter_mode != EnterMode::Br
        || loose
        || doc.attr(item, "style").is_some()
        || doc.attr(item, "class").is_some();
    let block = if needs_block {
        let block = doc.create_element(options.paragraph_tag());
        inherit::apply(doc, item, block, WRAPPING_BLOCK, Context { direction, loose });
        block
    } else {
        doc.create_element("br")
    };

    let mut labels = LabelReport::default();
    if let Some(label) = find_label(doc, item, options) {
        labels.removed.push(label);
    }

    let items = items_of(doc, list);
    let first = items.first() == Some(&item);
    let last = items.last() == Some(&item);
    let mut roots = vec![block];
    if first && last {
        doc.replace(target, block);
    } else if last {
        doc.insert_after(target, block);
        doc.detach(item);
        roots.push(target);
    } else if first {
        doc.insert_before(target, block);
        doc.detach(item);
        roots.push(target);
    } else {
        let tail = doc.break_parent(item, target);
        doc.replace(item, block);
        roots.push(target);
        if let Some(tail) = tail {
            if doc.is_wrapper(tail, &options.wrapper_class) {
                doc.set_attr(tail, "id", Uuid::new_v4().to_string());
            }
            roots.push(tail);
        }
    }

    let lists: Vec<NodeId> = roots[1..].to_vec();
    labels.extend(renumber_nodes(doc, &lists, false, options));
    Ok(ListChange {
        roots,
        labels,
        focus: Some(block),
    })
}
