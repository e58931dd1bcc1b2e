use std::collections::BTreeMap;

use super::{Document, NodeId, NodeKind};

/// Owned, detached copy of a subtree.
///
/// Attributes are kept in a sorted map so two trees compare equal regardless
/// of the order attributes were written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<Tree>,
    },
    Text(String),
    Fragment(Vec<Tree>),
}

impl Tree {
    pub fn element(tag: &str) -> Self {
        Tree::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Tree::Text(text.to_string())
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let Tree::Element { attrs, .. } = &mut self {
            attrs.insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn child(mut self, child: Tree) -> Self {
        match &mut self {
            Tree::Element { children, .. } | Tree::Fragment(children) => children.push(child),
            Tree::Text(_) => {}
        }
        self
    }

    pub fn children(self, children: impl IntoIterator<Item = Tree>) -> Self {
        children.into_iter().fold(self, Tree::child)
    }
}

impl Document {
    /// Build a document whose body holds the given trees.
    pub fn from_trees(trees: impl IntoIterator<Item = Tree>) -> Self {
        let mut doc = Document::new();
        let body = doc.body();
        for tree in trees {
            doc.insert_tree(body, &tree);
        }
        doc
    }

    /// Materialise `tree` as the last child of `parent`.
    pub fn insert_tree(&mut self, parent: NodeId, tree: &Tree) -> NodeId {
        let node = self.build_tree(tree);
        self.append_child(parent, node);
        node
    }

    /// Materialise `tree` as detached nodes.
    pub fn build_tree(&mut self, tree: &Tree) -> NodeId {
        match tree {
            Tree::Text(text) => self.create_text(text),
            Tree::Element {
                tag,
                attrs,
                children,
            } => {
                let node = self.create_element(tag);
                for (name, value) in attrs {
                    self.set_attr(node, name, value.as_str());
                }
                for child in children {
                    let child = self.build_tree(child);
                    self.append_child(node, child);
                }
                node
            }
            Tree::Fragment(children) => {
                let node = self.create_fragment();
                for child in children {
                    let child = self.build_tree(child);
                    self.append_child(node, child);
                }
                node
            }
        }
    }

    pub fn to_tree(&self, id: NodeId) -> Tree {
        let children = || -> Vec<Tree> { self.children(id).iter().map(|&c| self.to_tree(c)).collect() };
        match self.kind(id) {
            NodeKind::Text(text) => Tree::Text(text.clone()),
            NodeKind::Element { tag, attrs } => Tree::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: children(),
            },
            NodeKind::Fragment => Tree::Fragment(children()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tree_roundtrip_through_document() {
        let tree = Tree::element("ol").attr("dir", "rtl").child(
            Tree::element("li").child(Tree::element("p").child(Tree::text("one"))),
        );
        let mut doc = Document::new();
        let body = doc.body();

        let node = doc.insert_tree(body, &tree);

        assert_eq!(doc.to_tree(node), tree);
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let a = Tree::element("li").attr("class", "x").attr("dir", "ltr");
        let b = Tree::element("li").attr("dir", "ltr").attr("class", "x");

        assert_eq!(a, b);
    }
}
