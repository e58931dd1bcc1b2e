//! Document builders shared by the unit tests.

use crate::dom::{Document, NodeId, Tree};
use crate::lists::is_label;
use crate::options::ListOptions;

pub fn list(tag: &str) -> Tree {
    Tree::element(tag)
}

pub fn paragraph(text: &str) -> Tree {
    Tree::element("p").child(Tree::text(text))
}

/// `li > p > text`
pub fn item(text: &str) -> Tree {
    Tree::element("li").child(paragraph(text))
}

/// `li > p > (span.label, " text")`
pub fn labelled_item(label: &str, text: &str) -> Tree {
    Tree::element("li").child(
        Tree::element("p")
            .child(Tree::element("span").attr("class", "label").child(Tree::text(label)))
            .child(Tree::text(&format!(" {text}"))),
    )
}

/// A document whose body holds only `tree`, plus the node built for it.
pub fn body_list(tree: Tree) -> (Document, NodeId) {
    let doc = Document::from_trees([tree]);
    let node = doc.children(doc.body())[0];
    (doc, node)
}

/// Label texts below `root` in document order.
pub fn labels(doc: &Document, root: NodeId) -> Vec<String> {
    let options = ListOptions::default();
    doc.descendants(root)
        .into_iter()
        .filter(|&node| is_label(doc, node, &options))
        .map(|node| doc.text_content(node))
        .collect()
}

/// The first node below `root` whose own text contains `needle`.
pub fn find_text(doc: &Document, root: NodeId, needle: &str) -> NodeId {
    doc.descendants(root)
        .into_iter()
        .find(|&node| doc.text(node).is_some_and(|text| text.contains(needle)))
        .unwrap_or_else(|| panic!("no text node containing {needle:?}"))
}

/// The `li` holding the text `needle`.
pub fn item_with(doc: &Document, needle: &str) -> NodeId {
    let text = find_text(doc, doc.body(), needle);
    doc.ascendant(text, "li")
        .unwrap_or_else(|| panic!("{needle:?} is not inside an item"))
}
