use crate::dom::{Document, NodeId};
use crate::lists::inherit::keep_direction;
use crate::lists::{ListChange, lists_in, outer_node, renumber_nodes};
use crate::options::ListOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Next,
    Previous,
}

/// Merge `list` with same-tag lists directly before and after it, then
/// renumber the survivor. Wrapped lists only merge with wrapped lists.
pub fn merge_adjacent_lists(doc: &mut Document, list: NodeId, options: &ListOptions) -> ListChange {
    let mut node = outer_node(doc, list, options);
    let mut merged = false;
    for side in [Side::Next, Side::Previous] {
        if let Some(survivor) = merge_sibling(doc, node, side, options) {
            node = survivor;
            merged = true;
        }
    }
    if !merged {
        return ListChange::default();
    }
    let labels = renumber_nodes(doc, &[node], false, options);
    ListChange {
        roots: vec![node],
        labels,
        focus: None,
    }
}

/// Move the children of `node` into its sibling on `side` and drop `node`.
/// Returns the sibling.
fn merge_sibling(doc: &mut Document, node: NodeId, side: Side, options: &ListOptions) -> Option<NodeId> {
    let sibling = match side {
        Side::Next => doc.next_content_sibling(node)?,
        Side::Previous => doc.previous_content_sibling(node)?,
    };
    let wrapped = doc.is_wrapper(node, &options.wrapper_class);

    let (list, sibling_list) = if wrapped {
        if !doc.is_wrapper(sibling, &options.wrapper_class) {
            return None;
        }
        let list = lists_in(doc, node, options).into_iter().next()?;
        let tag = doc.tag(list)?.to_string();
        let sibling_list = doc
            .children(sibling)
            .iter()
            .copied()
            .find(|&child| doc.is_tag(child, &tag))?;
        (list, sibling_list)
    } else {
        if !doc.is_list(node) || doc.tag(sibling) != doc.tag(node) {
            return None;
        }
        (node, sibling)
    };

    move_elements(doc, list, sibling_list, side);
    doc.detach(list);
    if wrapped {
        move_elements(doc, node, sibling, side);
        doc.detach(node);
    }
    Some(sibling)
}

/// Move the element children of `from` to the near end of `into`, keeping
/// their order and their resolved direction.
fn move_elements(doc: &mut Document, from: NodeId, into: NodeId, side: Side) {
    let elements = doc.element_children(from);
    match side {
        Side::Next => {
            for &child in elements.iter().rev() {
                keep_direction(doc, child, into);
                doc.prepend_child(into, child);
            }
        }
        Side::Previous => {
            for child in elements {
                keep_direction(doc, child, into);
                doc.append_child(into, child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tree;
    use crate::tests::{item, labels, list};
    use pretty_assertions::assert_eq;

    fn wrapped(tag: &str, text: &str) -> Tree {
        Tree::element("div")
            .attr("class", "list")
            .child(list(tag).child(item(text)))
    }

    #[test]
    fn test_merges_both_neighbours_in_order() {
        let doc_trees = [
            list("ol").child(item("a")),
            list("ol").child(item("b")),
            list("ol").child(item("c")),
        ];
        let mut doc = Document::from_trees(doc_trees);
        let middle = doc.children(doc.body())[1];

        let change = merge_adjacent_lists(&mut doc, middle, &ListOptions::default());

        assert_eq!(doc.children(doc.body()).len(), 1);
        assert_eq!(change.roots, doc.children(doc.body()).to_vec());
        assert_eq!(labels(&doc, doc.body()), vec!["1.", "2.", "3."]);
        assert_eq!(doc.text_content(doc.body()), "1. a2. b3. c");
    }

    #[test]
    fn test_different_tags_do_not_merge() {
        let mut doc = Document::from_trees([list("ol").child(item("a")), list("ul").child(item("b"))]);
        let ol = doc.children(doc.body())[0];

        let change = merge_adjacent_lists(&mut doc, ol, &ListOptions::default());

        assert!(change.is_noop());
        assert_eq!(doc.children(doc.body()).len(), 2);
    }

    #[test]
    fn test_wrapped_lists_merge_through_wrappers() {
        let mut doc = Document::from_trees([wrapped("ul", "a"), wrapped("ul", "b")]);
        let second = doc.children(doc.body())[1];
        let inner = doc.children(second)[0];

        merge_adjacent_lists(&mut doc, inner, &ListOptions::default());

        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<div class="list"><ul><li><p>a</p></li><li><p>b</p></li></ul></div>"#
        );
    }

    #[test]
    fn test_wrapped_and_bare_lists_stay_apart() {
        let mut doc = Document::from_trees([wrapped("ul", "a"), list("ul").child(item("b"))]);
        let bare = doc.children(doc.body())[1];

        let change = merge_adjacent_lists(&mut doc, bare, &ListOptions::default());

        assert!(change.is_noop());
    }

    #[test]
    fn test_moved_items_keep_direction() {
        let mut doc = Document::from_trees([
            list("ul").attr("dir", "rtl").child(item("a")),
            list("ul").child(item("b")),
        ]);
        let rtl = doc.children(doc.body())[0];

        merge_adjacent_lists(&mut doc, rtl, &ListOptions::default());

        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ul><li dir="rtl"><p>a</p></li><li><p>b</p></li></ul>"#
        );
    }
}
