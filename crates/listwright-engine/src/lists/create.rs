use crate::dom::{Direction, Document, NodeId};
use crate::error::ListError;
use crate::lists::{ListChange, create_list_node, renumber_list};
use crate::options::ListOptions;

/// Blocks kept whole inside the new item instead of becoming its content.
fn is_preserved(doc: &Document, block: NodeId) -> bool {
    let heading = doc.tag(block).is_some_and(|tag| {
        tag.len() == 2 && tag.starts_with('h') && matches!(tag.as_bytes()[1], b'1'..=b'6')
    });
    heading || doc.is_tag(block, "pre") || doc.attr(block, "contenteditable") == Some("false")
}

/// Turn `blocks` into the items of a new `tag` list, inserted where the
/// blocks were.
///
/// Blocks at different depths are first lifted to children of their common
/// parent. Attributes of converted blocks move to their items. When every
/// block resolves to the same direction and at least one states it, the
/// direction moves to the list.
pub fn create_list(
    doc: &mut Document,
    blocks: &[NodeId],
    tag: &str,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let Some(&first) = blocks.first() else {
        return Ok(ListChange::default());
    };
    let mut blocks = blocks.to_vec();

    // A lone block limit (a table cell, say) lists its content, not itself.
    if blocks.len() == 1 && doc.is_block_limit(first) {
        let holder = doc.create_element("div");
        doc.move_children(first, holder);
        doc.append_child(first, holder);
        blocks[0] = holder;
    }

    let Some(mut common) = doc.parent(blocks[0]) else {
        log::debug!("block {:?} is detached", blocks[0]);
        return Ok(ListChange::default());
    };
    for &block in &blocks[1..] {
        if let Some(ancestor) = doc
            .parent(block)
            .and_then(|parent| doc.common_ancestor(common, parent))
        {
            common = ancestor;
        }
    }

    let mut contents: Vec<NodeId> = Vec::new();
    for &block in &blocks {
        if let Some(content) = doc.child_towards(common, block)
            && !contents.contains(&content)
        {
            contents.push(content);
        }
    }
    // Blocks may arrive in any order; items follow the document.
    contents.sort_by_key(|&content| doc.index_in_parent(content));
    let Some(&last) = contents.last() else {
        return Ok(ListChange::default());
    };

    let explicit = contents.iter().any(|&block| doc.direction(block).is_some());
    let mut shared: Option<Direction> = None;
    let mut mixed = false;
    for &block in &contents {
        let direction = doc.resolved_direction(block);
        match shared {
            None => shared = Some(direction),
            Some(existing) if existing != direction => mixed = true,
            Some(_) => {}
        }
    }
    let list_direction = shared.filter(|_| !mixed);

    let anchor = doc.next_sibling(last);
    let (outer, list) = create_list_node(doc, tag, options);

    let mut first_item = None;
    for block in contents {
        let item = doc.create_element("li");
        if is_preserved(doc, block) {
            let paragraph = doc.create_element("p");
            doc.append_child(item, paragraph);
            doc.append_child(item, block);
        } else {
            doc.copy_attrs(block, item, &[]);
            if list_direction.is_some() && doc.direction(block).is_some() {
                doc.remove_style(item, "direction");
                doc.remove_attr(item, "dir");
            }
            let holds_blocks = doc.children(block).iter().any(|&child| doc.is_block(child));
            if holds_blocks {
                doc.move_children(block, item);
            } else {
                let paragraph = doc.create_element("p");
                doc.move_children(block, paragraph);
                doc.append_child(item, paragraph);
            }
            doc.detach(block);
        }
        doc.append_child(list, item);
        first_item.get_or_insert(item);
    }

    if explicit && let Some(direction) = list_direction {
        doc.set_direction(list, direction);
    }
    match anchor {
        Some(anchor) => doc.insert_before(anchor, outer),
        None => doc.append_child(common, outer),
    }

    let labels = renumber_list(doc, list, false, options)?;
    Ok(ListChange {
        roots: vec![outer],
        labels,
        focus: first_item,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tree;
    use crate::tests::{labels, paragraph};
    use pretty_assertions::assert_eq;

    fn blocks(trees: impl IntoIterator<Item = Tree>) -> (Document, Vec<NodeId>) {
        let doc = Document::from_trees(trees);
        let children = doc.children(doc.body()).to_vec();
        (doc, children)
    }

    #[test]
    fn test_paragraphs_become_numbered_items() {
        // Given three paragraphs, one with a class
        let (mut doc, nodes) = blocks([
            paragraph("one").attr("class", "x"),
            paragraph("two"),
            paragraph("three"),
        ]);

        // When they become an ordered list
        let change = create_list(&mut doc, &nodes, "ol", &ListOptions::default()).unwrap();

        // Then each is an item numbered in order and the class moved to its item
        assert_eq!(change.labels.created.len(), 3);
        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol class="no_mark"><li class="x"><p><span class="label">1.</span> one</p></li><li><p><span class="label">2.</span> two</p></li><li><p><span class="label">3.</span> three</p></li></ol>"#
        );
    }

    #[test]
    fn test_list_is_inserted_where_blocks_were() {
        let (mut doc, nodes) = blocks([paragraph("before"), paragraph("item"), paragraph("after")]);

        create_list(&mut doc, &nodes[1..2], "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(doc.body_html(), @"<p>before</p><ul><li><p>item</p></li></ul><p>after</p>");
    }

    #[test]
    fn test_heading_is_preserved_inside_item() {
        let (mut doc, nodes) = blocks([Tree::element("h2").child(Tree::text("Title"))]);

        create_list(&mut doc, &nodes, "ol", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol class="no_mark"><li><p><span class="label">1.</span> </p><h2>Title</h2></li></ol>"#
        );
    }

    #[test]
    fn test_existing_label_is_reused() {
        let (mut doc, nodes) = blocks([Tree::element("div").child(
            Tree::element("p")
                .child(Tree::element("span").attr("class", "label").child(Tree::text("7.")))
                .child(Tree::text(" seven")),
        )]);

        let change = create_list(&mut doc, &nodes, "ol", &ListOptions::default()).unwrap();

        assert!(change.labels.created.is_empty());
        assert_eq!(labels(&doc, doc.body()), vec!["1."]);
        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol class="no_mark"><li><p><span class="label">1.</span> seven</p></li></ol>"#
        );
    }

    #[test]
    fn test_shared_direction_moves_to_list() {
        let (mut doc, nodes) = blocks([
            paragraph("a").attr("dir", "rtl"),
            paragraph("b").attr("dir", "rtl"),
        ]);

        create_list(&mut doc, &nodes, "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ul dir="rtl"><li><p>a</p></li><li><p>b</p></li></ul>"#
        );
    }

    #[test]
    fn test_blocks_at_different_depths_lift_to_common_parent() {
        let (mut doc, nodes) = blocks([
            paragraph("top"),
            Tree::element("div").child(paragraph("inner")),
        ]);
        let inner = doc.children(nodes[1])[0];

        create_list(&mut doc, &[nodes[0], inner], "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @"<ul><li><p>top</p></li><li><p>inner</p></li></ul>"
        );
    }

    #[test]
    fn test_blocks_given_out_of_order_keep_document_order() {
        let (mut doc, nodes) = blocks([paragraph("one"), paragraph("two"), paragraph("three")]);
        let reversed: Vec<NodeId> = nodes.iter().rev().copied().collect();

        create_list(&mut doc, &reversed, "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @"<ul><li><p>one</p></li><li><p>two</p></li><li><p>three</p></li></ul>"
        );
    }

    #[test]
    fn test_out_of_order_blocks_stay_before_following_content() {
        let (mut doc, nodes) = blocks([paragraph("a"), paragraph("b"), paragraph("after")]);

        create_list(&mut doc, &[nodes[1], nodes[0]], "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(
            doc.body_html(),
            @"<ul><li><p>a</p></li><li><p>b</p></li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_wrapped_list_gets_wrapper() {
        let (mut doc, nodes) = blocks([paragraph("x")]);
        let options = ListOptions {
            wrap_lists: true,
            ..ListOptions::default()
        };

        let change = create_list(&mut doc, &nodes, "ul", &options).unwrap();

        assert!(doc.is_wrapper(change.roots[0], "list"));
    }

    #[test]
    fn test_no_blocks_is_noop() {
        let mut doc = Document::new();

        let change = create_list(&mut doc, &[], "ol", &ListOptions::default()).unwrap();

        assert!(change.is_noop());
    }
}
