use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::{
    ListChange, change_list_type, create_list, lists_in, merge_adjacent_lists, remove_list,
};
use crate::options::ListOptions;

/// Blocks that will be handled together: items of one list, or a run of
/// plain blocks inside one block limit.
#[derive(Debug)]
struct Group {
    root: NodeId,
    list: bool,
    contents: Vec<NodeId>,
}

/// The list button: turn `blocks` into a `tag` list, or take them out of it
/// when the first block already sits in a `tag` list.
pub fn toggle_list(
    doc: &mut Document,
    blocks: &[NodeId],
    tag: &str,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let mut blocks = blocks.to_vec();
    let body = doc.body();
    if doc.children(body).iter().all(|&child| doc.is_blank(child)) {
        let paragraph = doc.create_element(options.paragraph_tag());
        doc.append_child(body, paragraph);
        blocks = vec![paragraph];
    }
    let Some(&first) = blocks.first() else {
        return Ok(ListChange::default());
    };

    let active = doc
        .closest(first, |node| doc.is_list(node))
        .is_some_and(|list| doc.is_tag(list, tag));
    log::debug!("toggling <{tag}> over {} blocks, active: {active}", blocks.len());

    let mut change = ListChange::default();
    let mut created: Vec<NodeId> = Vec::new();
    for group in group_blocks(doc, &blocks) {
        match (active, group.list) {
            (false, true) => {
                let converted = change_list_type(doc, group.root, &group.contents, tag, options)?;
                created.extend(converted.roots.iter().copied());
                change.absorb(converted);
            }
            (false, false) => {
                let made = create_list(doc, &group.contents, tag, options)?;
                created.extend(made.roots.iter().copied());
                change.absorb(made);
            }
            (true, true) => change.absorb(remove_list(doc, group.root, &group.contents, options)?),
            (true, false) => {}
        }
    }

    for node in created {
        if doc.parent(node).is_none() {
            continue;
        }
        let Some(list) = lists_in(doc, node, options)
            .into_iter()
            .find(|&list| doc.is_tag(list, tag))
        else {
            continue;
        };
        change.absorb(merge_adjacent_lists(doc, list, options));
    }
    change.roots.retain(|&root| doc.parent(root).is_some());
    Ok(change)
}

/// Group blocks by their outermost list inside the block limit, or else by
/// the block limit. A list met inside a limit closes that limit's open
/// paragraph group.
fn group_blocks(doc: &Document, blocks: &[NodeId]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut by_list: HashMap<NodeId, usize> = HashMap::new();
    let mut open_paragraphs: HashMap<NodeId, usize> = HashMap::new();
    let mut seen: Vec<NodeId> = Vec::new();

    for &block in blocks {
        if seen.contains(&block) {
            continue;
        }
        seen.push(block);
        let Some(limit) = doc.block_limit(block) else {
            continue;
        };
        let outermost = doc
            .ancestors_inclusive(block)
            .take_while(|&node| node != limit)
            .filter(|&node| doc.is_list(node))
            .last();

        match outermost {
            Some(list) => {
                open_paragraphs.remove(&limit);
                match by_list.get(&list) {
                    Some(&index) => groups[index].contents.push(block),
                    None => {
                        by_list.insert(list, groups.len());
                        groups.push(Group {
                            root: list,
                            list: true,
                            contents: vec![block],
                        });
                    }
                }
            }
            None => match open_paragraphs.get(&limit) {
                Some(&index) => groups[index].contents.push(block),
                None => {
                    open_paragraphs.insert(limit, groups.len());
                    groups.push(Group {
                        root: limit,
                        list: false,
                        contents: vec![block],
                    });
                }
            },
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::renumber_document;
    use crate::tests::{find_text, item, labels, list, paragraph};
    use pretty_assertions::assert_eq;

    fn paragraphs_of(doc: &Document, texts: &[&str]) -> Vec<NodeId> {
        texts
            .iter()
            .map(|text| {
                let node = find_text(doc, doc.body(), text);
                doc.parent(node).expect("Text sits in a paragraph")
            })
            .collect()
    }

    #[test]
    fn test_paragraphs_become_list_and_merge_with_neighbour() {
        // Given a list followed by two paragraphs
        let mut doc = Document::from_trees([
            list("ol").child(item("first")),
            paragraph("second"),
            paragraph("third"),
        ]);
        renumber_document(&mut doc, &ListOptions::default());
        let blocks = paragraphs_of(&doc, &["second", "third"]);

        // When the paragraphs are toggled into an ordered list
        toggle_list(&mut doc, &blocks, "ol", &ListOptions::default()).unwrap();

        // Then they join the list above
        assert_eq!(doc.children(doc.body()).len(), 1);
        assert_eq!(labels(&doc, doc.body()), vec!["1.", "2.", "3."]);
    }

    #[test]
    fn test_toggle_off_removes_list() {
        let mut doc = Document::from_trees([list("ul").children([item("a"), item("b")])]);
        let blocks = paragraphs_of(&doc, &["a", "b"]);

        toggle_list(&mut doc, &blocks, "ul", &ListOptions::default()).unwrap();

        insta::assert_snapshot!(doc.body_html(), @"<p>a</p><p>b</p>");
    }

    #[test]
    fn test_other_tag_changes_type() {
        let mut doc = Document::from_trees([list("ul").children([item("a"), item("b")])]);
        let blocks = paragraphs_of(&doc, &["a", "b"]);

        toggle_list(&mut doc, &blocks, "ol", &ListOptions::default()).unwrap();

        assert_eq!(labels(&doc, doc.body()), vec!["1.", "2."]);
        let root = doc.children(doc.body())[0];
        assert!(doc.is_tag(root, "ol"));
    }

    #[test]
    fn test_empty_body_gets_a_list() {
        let mut doc = Document::new();

        let change = toggle_list(&mut doc, &[], "ol", &ListOptions::default()).unwrap();

        assert_eq!(change.roots.len(), 1);
        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol class="no_mark"><li><p><span class="label">1.</span> </p></li></ol>"#
        );
    }

    #[test]
    fn test_list_between_paragraphs_splits_groups() {
        let doc = Document::from_trees([
            paragraph("p1"),
            list("ul").child(item("in list")),
            paragraph("p2"),
        ]);
        let blocks = paragraphs_of(&doc, &["p1", "in list", "p2"]);

        let groups = group_blocks(&doc, &blocks);

        let shapes: Vec<(bool, usize)> = groups.iter().map(|g| (g.list, g.contents.len())).collect();
        assert_eq!(shapes, vec![(false, 1), (true, 1), (false, 1)]);
    }
}
