use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::{
    ListChange, Numbering, build, flatten, outer_node, renumber_ordered, renumber_unordered,
    splice,
};
use crate::options::ListOptions;

/// Switch the items holding `selected` to a `tag` container. An empty
/// selection, or one naming no item, converts every item of `root`.
///
/// Containers are cloned with their attributes, minus `start`, `type` and
/// the `list-style-type` style. Lists of the new tag are then renumbered by
/// their tag's rules, except manually numbered ones.
pub fn change_list_type(
    doc: &mut Document,
    root: NodeId,
    selected: &[NodeId],
    tag: &str,
    options: &ListOptions,
) -> Result<ListChange, ListError> {
    let mut array = flatten(doc, root)?;

    let mut positions: Vec<usize> = selected
        .iter()
        .filter_map(|&node| {
            doc.closest(node, |n| doc.is_list_item(n))
                .and_then(|item| array.position(item))
        })
        .collect();
    if positions.is_empty() {
        positions = (0..array.len()).collect();
    }

    let mut converted: HashMap<NodeId, NodeId> = HashMap::new();
    for position in positions {
        let container = array.records[position].container;
        if doc.is_tag(container, tag) {
            continue;
        }
        let replacement = match converted.get(&container) {
            Some(&existing) => existing,
            None => {
                let created = convert_container(doc, container, tag, options);
                converted.insert(container, created);
                created
            }
        };
        array.records[position].container = replacement;
    }
    if converted.is_empty() {
        log::debug!("list {root:?} is already <{tag}>");
        return Ok(ListChange::default());
    }

    let built = build(doc, &array, 0, None, options)?;
    let created = lists_of_tag(doc, built.fragment, tag);
    let target = outer_node(doc, root, options);
    let inserted = splice(doc, target, built.fragment);

    let mut change = ListChange {
        roots: inserted,
        ..ListChange::default()
    };
    for list in created {
        if tag == "ol" {
            change
                .labels
                .extend(renumber_ordered(doc, list, Numbering::default(), options));
        } else {
            change.labels.extend(renumber_unordered(doc, list, options));
        }
    }
    Ok(change)
}

fn convert_container(doc: &mut Document, from: NodeId, tag: &str, options: &ListOptions) -> NodeId {
    let container = doc.create_element(tag);
    doc.copy_attrs(from, container, &["start", "type"]);
    doc.remove_style(container, "list-style-type");
    if tag == "ol" {
        doc.add_class(container, &options.unmarked_class);
        doc.set_list_type(container, options.default_ordinal_type);
    } else {
        doc.remove_class(container, &options.unmarked_class);
    }
    container
}

/// Lists with `tag` in the fragment that are not inside another one.
fn lists_of_tag(doc: &Document, fragment: NodeId, tag: &str) -> Vec<NodeId> {
    doc.descendants(fragment)
        .into_iter()
        .filter(|&node| {
            doc.is_tag(node, tag)
                && !doc
                    .ancestors(node)
                    .take_while(|&ancestor| ancestor != fragment)
                    .any(|ancestor| doc.is_tag(ancestor, tag))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tree;
    use crate::lists::renumber_document;
    use crate::ordinal::OrdinalType;
    use crate::tests::{body_list, item, item_with, labels, list};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ol_to_ul_drops_labels_only() {
        let (mut doc, ol) = body_list(list("ol").children([item("one"), item("two")]));
        renumber_document(&mut doc, &ListOptions::default());
        assert_eq!(labels(&doc, doc.body()), vec!["1.", "2."]);

        let change = change_list_type(&mut doc, ol, &[], "ul", &ListOptions::default()).unwrap();

        assert_eq!(change.labels.removed.len(), 2);
        insta::assert_snapshot!(doc.body_html(), @"<ul><li><p>one</p></li><li><p>two</p></li></ul>");
    }

    #[test]
    fn test_ul_to_ol_numbers_items() {
        let (mut doc, ul) = body_list(
            list("ul")
                .attr("style", "list-style-type: square; color: red")
                .attr("type", "disc")
                .children([item("one"), item("two")]),
        );

        change_list_type(&mut doc, ul, &[], "ol", &ListOptions::default()).unwrap();

        let ol = doc.children(doc.body())[0];
        assert_eq!(doc.list_type(ol), Some(OrdinalType::Outline));
        insta::assert_snapshot!(
            doc.body_html(),
            @r#"<ol class="no_mark" style="color: red"><li><p><span class="label">1.</span> one</p></li><li><p><span class="label">2.</span> two</p></li></ol>"#
        );
    }

    #[test]
    fn test_converting_nested_items_only() {
        let (mut doc, ol) = body_list(list("ol").children([
            item("one").child(list("ol").children([item("a"), item("b")])),
            item("two"),
        ]));
        renumber_document(&mut doc, &ListOptions::default());
        let a = item_with(&doc, "a");
        let b = item_with(&doc, "b");

        change_list_type(&mut doc, ol, &[a, b], "ul", &ListOptions::default()).unwrap();

        assert_eq!(labels(&doc, doc.body()), vec!["1.", "2."]);
        let a = item_with(&doc, "a");
        assert!(doc.is_tag(doc.parent(a).unwrap(), "ul"));
    }

    #[test]
    fn test_same_tag_is_noop() {
        let (mut doc, ol) = body_list(list("ol").child(item("one")));

        let change = change_list_type(&mut doc, ol, &[], "ol", &ListOptions::default()).unwrap();

        assert!(change.is_noop());
    }

    #[test]
    fn test_exception_lists_keep_manual_labels() {
        let mut doc = Document::from_trees([Tree::element("div").attr("class", "list").child(
            list("ol").child(
                item("outer").child(
                    list("ol")
                        .attr("class", "exception")
                        .child(item("manual").child(list("ul").child(item("deep")))),
                ),
            ),
        )]);
        let wrapper = doc.children(doc.body())[0];
        let outer = doc.children(wrapper)[0];
        let deep = item_with(&doc, "deep");
        let options = ListOptions::default();

        change_list_type(&mut doc, outer, &[deep], "ol", &options).unwrap();

        let deep = item_with(&doc, "deep");
        let manual = item_with(&doc, "manual");
        assert!(doc.is_tag(doc.parent(deep).unwrap(), "ol"));
        assert_eq!(crate::lists::find_label(&doc, deep, &options), None);
        assert!(crate::lists::find_label(&doc, manual, &options).is_some());
    }
}
