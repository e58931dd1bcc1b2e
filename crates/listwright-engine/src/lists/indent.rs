use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::{
    ListChange, build, flatten, items_of, outer_node, renumber_list, renumber_nodes, splice,
};
use crate::options::ListOptions;

/// A run of selected content, given by the first and last selected nodes.
/// Either end may be any node inside an item, or the item itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub start: NodeId,
    pub end: NodeId,
}

impl ItemRange {
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }

    pub fn single(node: NodeId) -> Self {
        Self {
            start: node,
            end: node,
        }
    }
}

/// The list to flatten and the first and last of its items in the range.
struct Selection {
    list: NodeId,
    first: NodeId,
    last: NodeId,
}

impl Selection {
    fn resolve(doc: &Document, range: ItemRange) -> Option<Self> {
        let common = doc.common_ancestor(range.start, range.end)?;
        let list = doc
            .closest(common, |node| doc.is_list(node))
            .or_else(|| doc.closest(range.start, |node| doc.is_list(node)))?;
        let items = items_of(doc, list);
        let first = doc
            .child_towards(list, range.start)
            .filter(|&node| doc.is_list_item(node))
            .or_else(|| items.first().copied())?;
        let last = doc
            .child_towards(list, range.end)
            .filter(|&node| doc.is_list_item(node))
            .or_else(|| items.last().copied())?;
        Some(Self { list, first, last })
    }
}

/// True when `node` sits in the first item of its list.
fn in_first_item(doc: &Document, node: NodeId) -> bool {
    doc.closest(node, |n| doc.is_list_item(n))
        .and_then(|item| {
            let list = doc.parent(item)?;
            Some(items_of(doc, list).first() == Some(&item))
        })
        .unwrap_or(false)
}

/// Nest the selected items one level deeper, under the item before them.
///
/// Refused (an empty change) when the selection starts in the first item of
/// its list, since there is no item to nest under.
pub fn indent(
    doc: &mut Document,
    range: ItemRange,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    if in_first_item(doc, range.start) {
        log::debug!("not indenting: selection starts at the first item of its list");
        return Ok(ListChange::default());
    }
    shift(doc, range, 1, options)
}

/// Move the selected items one level up. Items of a top-level list leave the
/// list and become plain blocks.
pub fn outdent(
    doc: &mut Document,
    range: ItemRange,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    shift(doc, range, -1, options)
}

fn shift(
    doc: &mut Document,
    range: ItemRange,
    offset: i32,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let Some(selection) = Selection::resolve(doc, range) else {
        log::debug!("no list around {range:?}");
        return Ok(ListChange::default());
    };
    let list = selection.list;
    let mut array = flatten(doc, list)?;
    let (Some(first), Some(last)) = (array.position(selection.first), array.position(selection.last))
    else {
        return Ok(ListChange::default());
    };
    let (first, last) = (first.min(last), first.max(last));

    // Items moving one level down get a container of their own.
    let mut fresh: HashMap<NodeId, NodeId> = HashMap::new();
    if offset > 0 {
        for record in &array.records[first..=last] {
            if fresh.contains_key(&record.container) {
                continue;
            }
            let tag = doc.tag(record.container).unwrap_or("ol").to_string();
            let container = doc.create_element(&tag);
            if doc.has_class(record.container, &options.unmarked_class) {
                doc.add_class(container, &options.unmarked_class);
            }
            fresh.insert(record.container, container);
        }
    }

    let base = array.records[last].indent;
    for record in &mut array.records[first..=last] {
        record.indent += offset;
        if let Some(&container) = fresh.get(&record.container) {
            record.container = container;
        }
    }
    for record in &mut array.records[last + 1..] {
        if record.indent <= base {
            break;
        }
        record.indent += offset;
    }

    let direction = doc.direction(list);
    let built = build(doc, &array, 0, direction, options)?;

    let parent_item = doc
        .parent(list)
        .filter(|&parent| offset < 0 && doc.is_list_item(parent));
    let lifted: Vec<NodeId> = match parent_item {
        Some(_) => doc
            .children(built.fragment)
            .iter()
            .copied()
            .filter(|&node| doc.is_list_item(node))
            .collect(),
        None => Vec::new(),
    };

    let target = outer_node(doc, list, options);
    let inserted = splice(doc, target, built.fragment);

    // Items outdented out of a nested list land after the item that held
    // the list, taking the lists that followed them along as children.
    if let Some(parent_item) = parent_item {
        for &item in lifted.iter().rev() {
            while let Some(next) = doc.next_content_sibling(item)
                && doc.is_list(next)
            {
                doc.append_child(item, next);
            }
            doc.insert_after(parent_item, item);
        }
    }

    let mut labels = renumber_nodes(doc, &inserted, offset > 0, options);
    if let Some(parent_item) = parent_item
        && let Some(parent_list) = doc.parent(parent_item)
        && let Ok(report) = renumber_list(doc, parent_list, false, options)
    {
        labels.extend(report);
    }

    let focus = built
        .item_for(&array, selection.first)
        .or_else(|| inserted.first().copied());
    Ok(ListChange {
        roots: inserted,
        labels,
        focus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::{renumber_document, sub_lists};
    use crate::tests::{body_list, item, item_with, labels, list};
    use pretty_assertions::assert_eq;

    fn numbered(tree: crate::dom::Tree) -> (Document, NodeId) {
        let (mut doc, ol) = body_list(tree);
        renumber_document(&mut doc, &ListOptions::default());
        (doc, ol)
    }

    fn three_items() -> (Document, NodeId) {
        numbered(list("ol").children([item("one"), item("two"), item("three")]))
    }

    #[test]
    fn test_indent_second_item_nests_under_first() {
        // Given a flat list of three numbered items
        let (mut doc, ol) = three_items();
        let two = item_with(&doc, "two");

        // When indenting the second
        let change = indent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        // Then it sits in a sub-list of the first, and the top level lost one item
        let root = change.roots[0];
        assert_eq!(items_of(&doc, root).len(), 2);
        let first = items_of(&doc, root)[0];
        assert_eq!(sub_lists(&doc, first).len(), 1);
        assert_eq!(labels(&doc, doc.body()), vec!["1.", "1.1.", "2."]);
        assert!(doc.parent(ol).is_none());
    }

    #[test]
    fn test_focus_is_the_rebuilt_item() {
        let (mut doc, _) = three_items();
        let two = item_with(&doc, "two");

        let change = indent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        assert_eq!(change.focus, Some(item_with(&doc, "two")));
        assert_ne!(change.focus, Some(two));
    }

    #[test]
    fn test_outdent_restores_flat_list_and_labels() {
        let (mut doc, _) = three_items();
        let original = doc.body_html();
        let two = item_with(&doc, "two");
        indent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        let two = item_with(&doc, "two");
        outdent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        assert_eq!(doc.body_html(), original);
    }

    #[test]
    fn test_indent_first_item_is_noop() {
        let (mut doc, _) = three_items();
        let before = doc.body_html();
        let one = item_with(&doc, "one");

        let change = indent(&mut doc, ItemRange::single(one), &ListOptions::default()).unwrap();

        assert!(change.is_noop());
        assert_eq!(doc.body_html(), before);
    }

    #[test]
    fn test_range_outside_lists_is_noop() {
        let (mut doc, p) = body_list(crate::tests::paragraph("plain"));

        let change = indent(&mut doc, ItemRange::single(p), &ListOptions::default()).unwrap();

        assert!(change.is_noop());
    }

    #[test]
    fn test_indent_carries_nested_children_along() {
        let (mut doc, _) = numbered(list("ol").children([
            item("one"),
            item("two").child(list("ol").child(item("two.a"))),
            item("three"),
        ]));
        let two = item_with(&doc, "two");

        indent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        assert_eq!(labels(&doc, doc.body()), vec!["1.", "1.1.", "1.1.1.", "2."]);
    }

    #[test]
    fn test_outdent_top_level_item_leaves_list() {
        let (mut doc, _) = three_items();
        let two = item_with(&doc, "two");

        outdent(&mut doc, ItemRange::single(two), &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol><li><p><span class="label">1.</span> one</p></li></ol><p>two</p><ol><li><p><span class="label">1.</span> three</p></li></ol>"#
        );
    }

    #[test]
    fn test_outdent_nested_item_takes_following_siblings() {
        let (mut doc, _) = numbered(list("ol").children([
            item("one").child(list("ol").children([item("a"), item("b"), item("c")])),
            item("two"),
        ]));
        let b = item_with(&doc, "b");

        outdent(&mut doc, ItemRange::single(b), &ListOptions::default()).unwrap();

        assert_eq!(labels(&doc, doc.body()), vec!["1.", "1.1.", "2.", "2.1.", "3."]);
        let b = item_with(&doc, "b");
        let c = item_with(&doc, "c");
        assert_eq!(doc.ascendant(c, "li"), Some(b));
    }

    #[test]
    fn test_indent_range_of_items() {
        let (mut doc, _) = numbered(list("ol").children([
            item("one"),
            item("two"),
            item("three"),
            item("four"),
        ]));
        let two = crate::tests::find_text(&doc, doc.body(), "two");
        let three = crate::tests::find_text(&doc, doc.body(), "three");

        indent(&mut doc, ItemRange::new(two, three), &ListOptions::default()).unwrap();

        assert_eq!(labels(&doc, doc.body()), vec!["1.", "1.1.", "1.2.", "2."]);
    }
}
