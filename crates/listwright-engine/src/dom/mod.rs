//! # Node tree
//!
//! The list engine edits an element/text tree held in an arena. Nodes are
//! addressed by [`NodeId`], which stays valid after a node is detached, so
//! operations can hold on to source nodes while they build replacement
//! structure. [`Document::collect_garbage`] frees detached subtrees for reuse;
//! ids of freed nodes must not be used afterwards.
//!
//! ## Modules
//!
//! - **`tree`**: owned [`Tree`] values used to build and compare subtrees
//! - **`html`**: compact HTML serialisation
//! - **`markdown`**: Markdown import through pulldown-cmark

mod html;
mod markdown;
pub mod tree;

use std::collections::{BTreeMap, HashMap};

use crate::ordinal::OrdinalType;

pub use tree::Tree;

/// Tags treated as block-level when deciding where line boundaries are.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Attribute marking a selection bookmark span.
pub const BOOKMARK_ATTR: &str = "data-bookmark";

/// Stable handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Text direction carried by the `dir` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
    /// Detached container; inserting it moves its children instead.
    Fragment,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document with a `body` root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    /// Numbering type of `ol` containers, kept out of the attributes.
    list_types: HashMap<NodeId, OrdinalType>,
    /// Slots freed by the last collection, reused by `alloc`.
    free: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId(0),
            list_types: HashMap::new(),
            free: Vec::new(),
        };
        doc.body = doc.create_element("body");
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Number of live nodes, counting detached ones not yet collected.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Free every node that is neither under the body nor in the tree of one
    /// of `keep`. Returns how many nodes were freed.
    pub fn collect_garbage(&mut self, keep: &[NodeId]) -> usize {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![self.body];
        for &id in keep {
            if let Some(root) = self.ancestors_inclusive(id).last() {
                stack.push(root);
            }
        }
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut reachable[id.0], true) {
                continue;
            }
            stack.extend(self.children(id).iter().copied());
        }

        let before = self.free.len();
        self.free.clear();
        for (index, live) in reachable.into_iter().enumerate() {
            if live {
                continue;
            }
            let id = NodeId(index);
            self.nodes[index] = Node {
                kind: NodeKind::Fragment,
                parent: None,
                children: Vec::new(),
            };
            self.list_types.remove(&id);
            self.free.push(id);
        }
        // Hand out low slots first.
        self.free.reverse();
        let freed = self.free.len().saturating_sub(before);
        if freed > 0 {
            log::trace!("freed {freed} detached nodes");
        }
        freed
    }

    // ============ Creation ============

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// Copy a node without its children. Numbering metadata travels with it.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.node(id).kind.clone();
        let copy = self.alloc(kind);
        if let Some(ordinal_type) = self.list_types.get(&id).copied() {
            self.list_types.insert(copy, ordinal_type);
        }
        copy
    }

    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_clone(id);
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // ============ Kinds ============

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Fragment)
    }

    /// `ol` or `ul`.
    pub fn is_list(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some("ol" | "ul"))
    }

    pub fn is_list_item(&self, id: NodeId) -> bool {
        self.is_tag(id, "li")
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| BLOCK_TAGS.contains(&tag))
    }

    /// A block, or a `br` which ends a line just the same.
    pub fn is_block_boundary(&self, id: NodeId) -> bool {
        self.is_block(id) || self.is_tag(id, "br")
    }

    /// Elements that bound block grouping: list commands never look past
    /// them.
    pub fn is_block_limit(&self, id: NodeId) -> bool {
        matches!(
            self.tag(id),
            Some("body" | "td" | "th" | "caption" | "blockquote" | "section" | "article" | "aside")
        )
    }

    /// Nearest block limit around `id`, inclusive.
    pub fn block_limit(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |node| self.is_block_limit(node))
    }

    /// Text made only of collapsible whitespace.
    pub fn is_whitespace(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Text(text) => text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')),
            _ => false,
        }
    }

    pub fn is_bookmark(&self, id: NodeId) -> bool {
        self.is_tag(id, "span") && self.attr(id, BOOKMARK_ATTR).is_some()
    }

    /// Nodes that do not show up as content: whitespace text and bookmarks.
    pub fn is_blank(&self, id: NodeId) -> bool {
        self.is_whitespace(id) || self.is_bookmark(id)
    }

    /// A `div` carrying `class` that holds a list container.
    pub fn is_wrapper(&self, id: NodeId, class: &str) -> bool {
        self.is_tag(id, "div")
            && self.has_class(id, class)
            && self.children(id).iter().any(|&child| self.is_list(child))
    }

    /// True when the node has no visible content: only whitespace, bookmarks,
    /// `br`s and elements that are themselves empty.
    pub fn is_empty_content(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Text(text) => text
                .chars()
                .all(|c| c.is_whitespace() || c == '\u{a0}' || c == '\u{200b}'),
            _ if self.is_bookmark(id) || self.is_tag(id, "br") => true,
            _ if matches!(self.tag(id), Some("hr" | "img")) => false,
            _ => self
                .children(id)
                .iter()
                .all(|&child| self.is_empty_content(child)),
        }
    }

    // ============ Attributes ============

    pub fn attrs(&self, id: NodeId) -> Option<&BTreeMap<String, String>> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)?.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            attrs.remove(name);
        }
    }

    /// Copy every attribute of `from` onto `to`, except the `skip` names.
    pub fn copy_attrs(&mut self, from: NodeId, to: NodeId, skip: &[&str]) {
        let Some(attrs) = self.attrs(from).cloned() else {
            return;
        };
        for (name, value) in attrs {
            if !skip.contains(&name.as_str()) {
                self.set_attr(to, &name, value);
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let classes = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", classes);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attr(id, "class") else {
            return;
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr(id, "class");
        } else {
            let remaining = remaining.join(" ");
            self.set_attr(id, "class", remaining);
        }
    }

    /// Drop one declaration from the inline `style` attribute.
    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        let Some(style) = self.attr(id, "style") else {
            return;
        };
        let kept: Vec<&str> = style
            .split(';')
            .map(str::trim)
            .filter(|declaration| {
                !declaration.is_empty()
                    && !declaration
                        .split(':')
                        .next()
                        .is_some_and(|name| name.trim().eq_ignore_ascii_case(property))
            })
            .collect();
        if kept.is_empty() {
            self.remove_attr(id, "style");
        } else {
            let kept = kept.join("; ");
            self.set_attr(id, "style", kept);
        }
    }

    // ============ Text ============

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Replace the text of a text node, or the whole content of an element.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let NodeKind::Text(text) = &mut self.node_mut(id).kind {
            *text = value.to_string();
            return;
        }
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let text = self.create_text(value);
        self.append_child(id, text);
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // ============ Navigation ============

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Next sibling that is not whitespace text or a bookmark.
    pub fn next_content_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(node) = current {
            if !self.is_blank(node) {
                return Some(node);
            }
            current = self.next_sibling(node);
        }
        None
    }

    /// Previous sibling that is not whitespace text or a bookmark.
    pub fn previous_content_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.previous_sibling(id);
        while let Some(node) = current {
            if !self.is_blank(node) {
                return Some(node);
            }
            current = self.previous_sibling(node);
        }
        None
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// The node itself, then its ancestors.
    pub fn ancestors_inclusive(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Nearest ancestor-or-self matching `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.ancestors_inclusive(id).find(|&node| pred(node))
    }

    /// Nearest strict ancestor with the given tag.
    pub fn ascendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(id).find(|&node| self.is_tag(node, tag))
    }

    /// True when `node` sits strictly below `ancestor`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let path: Vec<NodeId> = self.ancestors_inclusive(a).collect();
        self.ancestors_inclusive(b).find(|node| path.contains(node))
    }

    /// Ancestor-or-self of `node` whose parent is `ancestor`.
    pub fn child_towards(&self, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
        self.ancestors_inclusive(node)
            .find(|&n| self.parent(n) == Some(ancestor))
    }

    /// Descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn find_first(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|&node| pred(node))
    }

    // ============ Mutation ============

    /// Detach `node`, or empty it when it is a fragment, returning what to insert.
    fn take_for_insert(&mut self, node: NodeId) -> Vec<NodeId> {
        if self.is_fragment(node) {
            let children = std::mem::take(&mut self.node_mut(node).children);
            for &child in &children {
                self.node_mut(child).parent = None;
            }
            children
        } else {
            self.detach(node);
            vec![node]
        }
    }

    /// True when `node` is `parent` or one of its ancestors, so inserting it
    /// there would cut the subtree loose.
    fn encloses(&self, node: NodeId, parent: NodeId) -> bool {
        let encloses = node == parent || self.contains(node, parent);
        if encloses {
            log::warn!("refusing to insert {node:?} into its own subtree at {parent:?}");
        }
        encloses
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if self.encloses(node, parent) {
            return;
        }
        let nodes = self.take_for_insert(node);
        let mut at = index.min(self.children(parent).len());
        for inserted in nodes {
            self.node_mut(inserted).parent = Some(parent);
            self.node_mut(parent).children.insert(at, inserted);
            at += 1;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.encloses(child, parent) {
            return;
        }
        let nodes = self.take_for_insert(child);
        for inserted in nodes {
            self.node_mut(inserted).parent = Some(parent);
            self.node_mut(parent).children.push(inserted);
        }
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_at(parent, 0, child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if self.encloses(node, parent) {
            return;
        }
        let nodes = self.take_for_insert(node);
        let Some(index) = self.index_in_parent(reference) else {
            return;
        };
        let mut at = index;
        for inserted in nodes {
            self.node_mut(inserted).parent = Some(parent);
            self.node_mut(parent).children.insert(at, inserted);
            at += 1;
        }
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if self.encloses(node, parent) {
            return;
        }
        let nodes = self.take_for_insert(node);
        let Some(index) = self.index_in_parent(reference) else {
            return;
        };
        let mut at = index + 1;
        for inserted in nodes {
            self.node_mut(inserted).parent = Some(parent);
            self.node_mut(parent).children.insert(at, inserted);
            at += 1;
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&child| child != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(old, new);
        self.detach(old);
    }

    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from).to_vec() {
            self.append_child(to, child);
        }
    }

    /// Split every node between `node` and `ancestor` (inclusive) so that
    /// `node` ends up as a sibling directly after `ancestor`. Content that
    /// followed `node` goes into clones placed after it; the outermost clone
    /// is returned.
    pub fn break_parent(&mut self, node: NodeId, ancestor: NodeId) -> Option<NodeId> {
        if !self.contains(ancestor, node) {
            return None;
        }
        let mut current = node;
        let mut tail: Option<NodeId> = None;
        loop {
            let parent = self.parent(current)?;
            let clone = self.shallow_clone(parent);
            if let Some(inner) = tail {
                self.append_child(clone, inner);
            }
            let index = self.index_in_parent(current)?;
            let following: Vec<NodeId> = self.children(parent)[index + 1..].to_vec();
            for sibling in following {
                self.append_child(clone, sibling);
            }
            tail = Some(clone);
            if parent == ancestor {
                break;
            }
            current = parent;
        }
        self.insert_after(ancestor, node);
        if let Some(tail) = tail {
            self.insert_after(node, tail);
        }
        tail
    }

    // ============ Direction ============

    /// Direction from the node's own `dir` attribute.
    pub fn direction(&self, id: NodeId) -> Option<Direction> {
        self.attr(id, "dir").and_then(Direction::parse)
    }

    /// Direction of the nearest ancestor-or-self with `dir`, else left-to-right.
    pub fn resolved_direction(&self, id: NodeId) -> Direction {
        self.ancestors_inclusive(id)
            .find_map(|node| self.direction(node))
            .unwrap_or_default()
    }

    /// Direction of the nearest strict ancestor carrying `dir`.
    pub fn explicit_direction_above(&self, id: NodeId) -> Option<Direction> {
        self.ancestors(id).find_map(|node| self.direction(node))
    }

    pub fn set_direction(&mut self, id: NodeId, direction: Direction) {
        self.set_attr(id, "dir", direction.as_str());
    }

    // ============ Numbering metadata ============

    pub fn list_type(&self, id: NodeId) -> Option<OrdinalType> {
        self.list_types.get(&id).copied()
    }

    pub fn set_list_type(&mut self, id: NodeId, ordinal_type: OrdinalType) {
        self.list_types.insert(id, ordinal_type);
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
