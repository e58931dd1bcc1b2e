use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::{ListChange, OUTDENT, build, flatten, outer_node, renumber_nodes, splice};
use crate::options::ListOptions;

/// Take the items holding `selected` out of `root`, turning their content
/// back into plain blocks. Unselected items stay in (possibly split) lists.
pub fn remove_list(
    doc: &mut Document,
    root: NodeId,
    selected: &[NodeId],
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let mut array = flatten(doc, root)?;

    let mut last: Option<usize> = None;
    for &node in selected {
        let Some(position) = doc
            .closest(node, |n| doc.is_list_item(n))
            .and_then(|item| array.position(item))
        else {
            continue;
        };
        array.records[position].indent = OUTDENT;
        last = Some(last.map_or(position, |current| current.max(position)));
    }
    let Some(last) = last else {
        log::debug!("nothing selected in list {root:?}");
        return Ok(ListChange::default());
    };
    array.repair_indents(last + 1);

    let direction = doc.direction(root);
    let built = build(doc, &array, 0, direction, options)?;
    let target = outer_node(doc, root, options);
    compensate_breaks(doc, target, built.fragment);

    let inserted = splice(doc, target, built.fragment);
    let labels = renumber_nodes(doc, &inserted, false, options);
    Ok(ListChange {
        focus: inserted.first().copied(),
        roots: inserted,
        labels,
    })
}

/// Keep a freed inline run from running into inline neighbours of `target`.
fn compensate_breaks(doc: &mut Document, target: NodeId, fragment: NodeId) {
    let touches_inline = |doc: &Document, edge: Option<NodeId>, neighbour: Option<NodeId>| {
        edge.is_some_and(|edge| !doc.is_block_boundary(edge))
            && neighbour.is_some_and(|neighbour| !doc.is_block_boundary(neighbour))
    };

    let first = doc.first_child(fragment);
    if touches_inline(doc, first, doc.previous_content_sibling(target))
        && let Some(first) = first
    {
        let line_break = doc.create_element("br");
        doc.insert_before(first, line_break);
    }
    let last = doc.last_child(fragment);
    if touches_inline(doc, last, doc.next_content_sibling(target))
        && let Some(last) = last
    {
        let line_break = doc.create_element("br");
        doc.insert_after(last, line_break);
    }
}
