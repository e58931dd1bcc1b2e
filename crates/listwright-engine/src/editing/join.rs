//! Backspace and Delete across line boundaries in and around lists.
//!
//! Both keys end up joining one visual line onto the end of another with
//! [`join_line`]. The joined line loses its label, its nested lists move
//! along, emptied lists and wrappers disappear and lists that became
//! neighbours are merged.

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::inherit::keep_direction;
use crate::lists::{
    ItemRange, LabelReport, ListChange, is_label, items_of, label_paragraph, lists_in,
    merge_adjacent_lists, outdent, outer_node, outermost_list, remove_label, renumber_list,
    sub_lists,
};
use crate::options::ListOptions;

/// Backspace with the caret at the start of `block`.
pub fn backspace(
    doc: &mut Document,
    block: NodeId,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    if let Some(item) = line_item(doc, block) {
        let list = doc
            .parent(item)
            .filter(|&parent| doc.is_list(parent))
            .ok_or(ListError::MissingContainer(item))?;

        if let Some(previous) = doc
            .previous_content_sibling(item)
            .filter(|&node| doc.is_list_item(node))
        {
            let target = line_end(doc, last_visual_item(doc, previous));
            return join_line(doc, target, item, options);
        }
        if let Some(parent_item) = doc.parent(list).filter(|&node| doc.is_list_item(node)) {
            let target = doc
                .previous_content_sibling(list)
                .filter(|&node| doc.is_element(node))
                .unwrap_or(parent_item);
            return join_line(doc, target, item, options);
        }
        if !sub_lists(doc, item).is_empty() {
            log::debug!("backspace on first item {item:?} with a sub-list does nothing");
            return Ok(ListChange::default());
        }
        return outdent(doc, ItemRange::single(item), options);
    }

    let Some(list) = doc
        .previous_content_sibling(block)
        .and_then(|previous| lists_in(doc, previous, options).pop())
    else {
        return Ok(ListChange::default());
    };
    let Some(last) = items_of(doc, list).pop() else {
        return Ok(ListChange::default());
    };
    let target = line_end(doc, last_visual_item(doc, last));
    join_line(doc, target, block, options)
}

/// Delete with the caret at the end of `block`.
pub fn delete(
    doc: &mut Document,
    block: NodeId,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    if let Some(item) = doc.closest(block, |node| doc.is_list_item(node)) {
        let target = if block == item {
            label_paragraph(doc, item).unwrap_or(item)
        } else {
            block
        };
        return match next_line(doc, item, options) {
            Some(next) => join_line(doc, target, next, options),
            None => Ok(ListChange::default()),
        };
    }

    let Some(next) = doc.next_content_sibling(block) else {
        return Ok(ListChange::default());
    };
    let Some(first) = lists_in(doc, next, options)
        .first()
        .and_then(|&list| items_of(doc, list).first().copied())
    else {
        return Ok(ListChange::default());
    };
    if doc.is_empty_content(block) {
        doc.detach(block);
        return Ok(ListChange {
            roots: vec![next],
            focus: Some(first),
            ..ListChange::default()
        });
    }
    if !sub_lists(doc, first).is_empty() {
        log::debug!("delete before an item with a sub-list does nothing");
        return Ok(ListChange::default());
    }
    join_line(doc, block, first, options)
}

/// The item whose first line is `block`.
fn line_item(doc: &Document, block: NodeId) -> Option<NodeId> {
    if doc.is_list_item(block) {
        return Some(block);
    }
    let item = doc.parent(block).filter(|&parent| doc.is_list_item(parent))?;
    (label_paragraph(doc, item) == Some(block)).then_some(item)
}

/// The item drawn last inside `item`: its deepest last descendant item.
fn last_visual_item(doc: &Document, item: NodeId) -> NodeId {
    let mut current = item;
    while let Some(last) = sub_lists(doc, current)
        .last()
        .and_then(|&list| items_of(doc, list).pop())
    {
        current = last;
    }
    current
}

/// The block that content joined onto `item` ends up in.
fn line_end(doc: &Document, item: NodeId) -> NodeId {
    doc.children(item)
        .iter()
        .rev()
        .copied()
        .find(|&child| doc.is_block(child) && !doc.is_list(child))
        .unwrap_or(item)
}

/// The line drawn after `item`: its first sub-item, the next item at this
/// level or above, or a plain block right after the outermost list.
fn next_line(doc: &Document, item: NodeId, options: &ListOptions) -> Option<NodeId> {
    if let Some(first) = sub_lists(doc, item)
        .first()
        .and_then(|&list| items_of(doc, list).first().copied())
    {
        return Some(first);
    }

    let mut current = item;
    loop {
        if let Some(next) = doc
            .next_content_sibling(current)
            .filter(|&node| doc.is_list_item(node))
        {
            return Some(next);
        }
        match doc
            .parent(current)
            .and_then(|list| doc.parent(list))
            .filter(|&node| doc.is_list_item(node))
        {
            Some(parent_item) => current = parent_item,
            None => break,
        }
    }

    let list = outermost_list(doc, item)?;
    let outer = outer_node(doc, list, options);
    doc.next_content_sibling(outer).filter(|&node| {
        doc.is_block(node) && !doc.is_list(node) && lists_in(doc, node, options).is_empty()
    })
}

/// Move the first line of `source` (an item or a plain block) onto the end
/// of `target`, then tidy up what is left behind.
pub fn join_line(
    doc: &mut Document,
    target: NodeId,
    source: NodeId,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    log::debug!("joining {source:?} onto {target:?}");
    let source_root = outermost_list(doc, source);
    let mut labels = LabelReport::default();

    // The line itself.
    let holder = if doc.is_list_item(source) {
        label_paragraph(doc, source)
    } else {
        Some(source)
    };
    let mut line: Vec<NodeId> = match holder {
        Some(holder) => {
            if let Some(label) = doc.find_first(holder, |node| is_label(doc, node, options)) {
                remove_label(doc, label);
                labels.removed.push(label);
            }
            doc.children(holder).to_vec()
        }
        None => doc
            .children(source)
            .iter()
            .copied()
            .take_while(|&child| !doc.is_block(child))
            .collect(),
    };
    if line.last().is_some_and(|&last| doc.is_tag(last, "br")) {
        line.pop();
    }
    if let Some(last) = doc.last_child(target)
        && doc.is_tag(last, "br")
    {
        doc.detach(last);
    }
    let anchor = doc
        .is_list_item(target)
        .then(|| {
            doc.children(target)
                .iter()
                .copied()
                .find(|&child| doc.is_block(child))
        })
        .flatten();
    for node in line {
        match anchor {
            Some(anchor) => doc.insert_before(anchor, node),
            None => doc.append_child(target, node),
        }
    }

    // Whatever followed the line in the source item.
    let rest: Vec<NodeId> = if doc.is_list_item(source) {
        doc.element_children(source)
            .into_iter()
            .filter(|&child| Some(child) != holder)
            .collect()
    } else {
        Vec::new()
    };
    let target_item = doc.closest(target, |node| doc.is_list_item(node));
    match target_item {
        Some(target_item) if doc.contains(target_item, source) => {
            let mut after = source;
            for node in rest {
                if doc.is_list(node) {
                    for item in items_of(doc, node) {
                        if let Some(list) = doc.parent(source) {
                            keep_direction(doc, item, list);
                        }
                        doc.insert_after(after, item);
                        after = item;
                    }
                    doc.detach(node);
                } else {
                    match sub_lists(doc, target_item).first() {
                        Some(&list) => doc.insert_before(list, node),
                        None => doc.append_child(target_item, node),
                    }
                }
            }
        }
        Some(target_item) => {
            for node in rest {
                doc.append_child(target_item, node);
            }
        }
        None => {
            let mut after = target;
            for node in rest {
                doc.insert_after(after, node);
                after = node;
            }
        }
    }

    if let Some(before) = prune(doc, source, options)
        && doc.parent(before).is_some()
        && let Some(list) = lists_in(doc, before, options).pop()
    {
        labels.extend(merge_adjacent_lists(doc, list, options).labels);
    }

    let target_root = outermost_list(doc, target);
    if let Some(list) = target_root {
        labels.extend(renumber_list(doc, list, false, options)?);
    }
    if let Some(list) = source_root
        && Some(list) != target_root
        && is_attached(doc, list)
    {
        labels.extend(renumber_list(doc, list, false, options)?);
    }

    let root = target_root.map_or(target, |list| outer_node(doc, list, options));
    Ok(ListChange {
        roots: vec![root],
        labels,
        focus: Some(target),
    })
}

/// Detach `node`, then every ancestor the removal left empty. Returns the
/// node that preceded the topmost removed one.
fn prune(doc: &mut Document, node: NodeId, options: &ListOptions) -> Option<NodeId> {
    let mut current = node;
    loop {
        let parent = doc.parent(current);
        let before = doc.previous_content_sibling(current);
        doc.detach(current);
        match parent {
            Some(parent) if is_emptied(doc, parent, options) => current = parent,
            _ => return before,
        }
    }
}

fn is_emptied(doc: &Document, node: NodeId, options: &ListOptions) -> bool {
    let empty = doc.element_children(node).is_empty();
    if doc.is_list(node) {
        return items_of(doc, node).is_empty();
    }
    empty
        && (doc.is_list_item(node)
            || (doc.is_tag(node, "div") && doc.has_class(node, &options.wrapper_class)))
}

fn is_attached(doc: &Document, node: NodeId) -> bool {
    let body = doc.body();
    node == body || doc.ancestors(node).any(|ancestor| ancestor == body)
}
