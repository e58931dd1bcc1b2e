//! Flat, indent-annotated view of a list tree.
//!
//! Structural edits are done on this view: flatten the list, change the
//! `indent` or `container` of some records, then build a replacement tree
//! from the records. Building only ever clones, so the live tree stays
//! untouched until the caller splices the result in.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::dom::{Direction, Document, NodeId};
use crate::error::ListError;
use crate::lists::{inherit, remove_label};
use crate::options::{EnterMode, ListOptions};

/// Indent of a record that leaves the list altogether.
pub const OUTDENT: i32 = -1;

/// One list item in a [`ListArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecord {
    /// Container the item is (or will be) rebuilt in; only its tag and
    /// attributes matter.
    pub container: NodeId,
    pub indent: i32,
    pub item: NodeId,
    /// Nearest non-item node above the flattened list. Decides where an
    /// item goes when it is outdented past the list.
    pub grandparent: Option<NodeId>,
    /// Children of the item other than nested lists.
    pub contents: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ListArray {
    pub records: Vec<ListRecord>,
    /// Record index per item, alive for one operation.
    positions: HashMap<NodeId, usize>,
}

impl ListArray {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, item: NodeId) -> Option<usize> {
        self.positions.get(&item).copied()
    }

    /// Every record nests at most one level deeper than its predecessor.
    pub fn is_valid(&self) -> bool {
        self.records.first().is_none_or(|first| first.indent >= OUTDENT)
            && self
                .records
                .windows(2)
                .all(|pair| pair[1].indent <= pair[0].indent + 1)
    }

    /// Shift runs that nest too deep back up, starting at `from`.
    pub fn repair_indents(&mut self, from: usize) {
        let mut i = from.max(1);
        while i < self.records.len() {
            let ceiling = self.records[i - 1].indent + 1;
            let indent = self.records[i].indent;
            if indent > ceiling {
                let offset = ceiling - indent;
                while i < self.records.len() && self.records[i].indent >= indent {
                    self.records[i].indent += offset;
                    i += 1;
                }
                continue;
            }
            i += 1;
        }
    }
}

/// Flatten `container` depth-first into records.
///
/// Lists sitting directly inside a list (not wrapped in an item) are first
/// moved under the preceding item, or into a new item when there is none.
pub fn flatten(doc: &mut Document, container: NodeId) -> Result<ListArray, ListError> {
    if !doc.is_list(container) {
        return Err(ListError::NotAList(container));
    }
    repair_nesting(doc, container);

    let grandparent = doc.parent(container).and_then(|parent| {
        if doc.is_list_item(parent) {
            doc.parent(parent)
        } else {
            Some(parent)
        }
    });
    let mut array = ListArray::default();
    collect(doc, container, 0, grandparent, &mut array);
    Ok(array)
}

fn repair_nesting(doc: &mut Document, list: NodeId) {
    for child in doc.children(list).to_vec() {
        if doc.is_list(child) {
            log::debug!("moving list {child:?} nested directly in {list:?} into an item");
            match doc.previous_content_sibling(child) {
                Some(item) if doc.is_list_item(item) => doc.append_child(item, child),
                _ => {
                    let item = doc.create_element("li");
                    doc.insert_before(child, item);
                    doc.append_child(item, child);
                }
            }
            repair_nesting(doc, child);
        } else if doc.is_list_item(child) {
            for nested in doc.children(child).to_vec() {
                if doc.is_list(nested) {
                    repair_nesting(doc, nested);
                }
            }
        }
    }
}

fn collect(
    doc: &Document,
    list: NodeId,
    indent: i32,
    grandparent: Option<NodeId>,
    array: &mut ListArray,
) {
    for &child in doc.children(list) {
        if !doc.is_list_item(child) {
            continue;
        }
        let position = array.records.len();
        array.positions.insert(child, position);
        array.records.push(ListRecord {
            container: list,
            indent,
            item: child,
            grandparent,
            contents: Vec::new(),
        });
        for &content in doc.children(child) {
            if doc.is_list(content) {
                collect(doc, content, indent + 1, grandparent, array);
            } else {
                array.records[position].contents.push(content);
            }
        }
    }
}

/// Result of [`build`]: a detached fragment and the first record not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltList {
    pub fragment: NodeId,
    pub next_index: usize,
    /// The item rebuilt for each record, `None` where the record became
    /// plain content or was not reached.
    pub items: Vec<Option<NodeId>>,
}

impl BuiltList {
    /// The new item standing in for `item` of the flattened array.
    pub fn item_for(&self, array: &ListArray, item: NodeId) -> Option<NodeId> {
        array
            .position(item)
            .and_then(|index| self.items.get(index).copied().flatten())
    }
}

/// Rebuild a tree from `array`, starting at record `start`.
///
/// `direction` is stamped on the top-level containers when given. Records
/// with indent [`OUTDENT`] become plain content (or items of the enclosing
/// list when the flattened list was nested).
pub fn build(
    doc: &mut Document,
    array: &ListArray,
    start: usize,
    direction: Option<Direction>,
    options: &ListOptions,
) -> Result<BuiltList, ListError> {
    let mut builder = Builder {
        doc,
        records: &array.records,
        options,
        cloned_wrappers: HashSet::new(),
        items: vec![None; array.records.len()],
    };
    let (fragment, next_index) = builder.level(start, direction, true)?;
    builder.strip_redundant_directions(fragment);
    Ok(BuiltList {
        fragment,
        next_index,
        items: builder.items,
    })
}

struct Builder<'a> {
    doc: &'a mut Document,
    records: &'a [ListRecord],
    options: &'a ListOptions,
    cloned_wrappers: HashSet<NodeId>,
    items: Vec<Option<NodeId>>,
}

impl Builder<'_> {
    fn level(
        &mut self,
        start: usize,
        direction: Option<Direction>,
        top_level: bool,
    ) -> Result<(NodeId, usize), ListError> {
        let records = self.records;
        let first = records.get(start).ok_or(ListError::StartOutOfRange {
            start,
            len: records.len(),
        })?;
        let level = first.indent.max(0);
        let fragment = self.doc.create_fragment();
        let mut root: Option<NodeId> = None;
        let mut current_item: Option<NodeId> = None;
        let mut index = start;

        while index < records.len() && records[index].indent.max(0) >= level {
            let record = &records[index];
            let item_direction = self.doc.resolved_direction(record.item);

            if record.indent == level {
                let container = match root {
                    Some(existing) if self.doc.tag(existing) == self.doc.tag(record.container) => {
                        existing
                    }
                    _ => {
                        let opened = self.open_container(record, fragment, direction, top_level);
                        root = Some(opened);
                        opened
                    }
                };
                let item = self.doc.shallow_clone(record.item);
                self.doc.append_child(container, item);
                if item_direction != self.doc.resolved_direction(container) {
                    self.doc.set_direction(item, item_direction);
                }
                for &content in &record.contents {
                    let copy = self.doc.deep_clone(content);
                    self.doc.append_child(item, copy);
                }
                current_item = Some(item);
                self.items[index] = Some(item);
                index += 1;
            } else if record.indent == level + 1 {
                let Some(parent_item) = current_item else {
                    return Err(ListError::InvalidIndent {
                        index,
                        indent: record.indent,
                        level,
                    });
                };
                let previous_direction = self
                    .doc
                    .resolved_direction(records[index.saturating_sub(1)].item);
                let nested_direction = (previous_direction != item_direction).then_some(item_direction);
                let (nested, next_index) = self.level(index, nested_direction, false)?;
                self.doc.append_child(parent_item, nested);
                index = next_index;
            } else if record.indent == OUTDENT && top_level && record.grandparent.is_some() {
                current_item = self.outdent(record, index, item_direction, fragment);
                self.items[index] = current_item;
                root = None;
                index += 1;
            } else {
                return Err(ListError::InvalidIndent {
                    index,
                    indent: record.indent,
                    level,
                });
            }
        }

        Ok((fragment, index))
    }

    /// Start a new container for `record`, inside a clone of its wrapper when
    /// the original list was wrapped.
    fn open_container(
        &mut self,
        record: &ListRecord,
        fragment: NodeId,
        direction: Option<Direction>,
        top_level: bool,
    ) -> NodeId {
        let container = self.doc.shallow_clone(record.container);
        if let Some(direction) = direction {
            self.doc.set_direction(container, direction);
        }
        let wrapper = record.grandparent.filter(|&anchor| {
            top_level
                && record.indent == 0
                && self.doc.is_tag(anchor, "div")
                && self.doc.has_class(anchor, &self.options.wrapper_class)
        });
        match wrapper {
            Some(wrapper) => {
                let wrapper_copy = self.doc.shallow_clone(wrapper);
                let first_copy = self.cloned_wrappers.insert(wrapper);
                if !first_copy && self.doc.attr(wrapper, "id").is_some() {
                    self.doc.set_attr(wrapper_copy, "id", Uuid::new_v4().to_string());
                }
                self.doc.append_child(wrapper_copy, container);
                self.doc.append_child(fragment, wrapper_copy);
            }
            None => self.doc.append_child(fragment, container),
        }
        container
    }

    /// Turn an item outdented past the list into content of the node above
    /// it. Returns the new item when that node is itself a list.
    fn outdent(
        &mut self,
        record: &ListRecord,
        index: usize,
        item_direction: Direction,
        fragment: NodeId,
    ) -> Option<NodeId> {
        let grandparent = record.grandparent?;
        let loose = self.doc.resolved_direction(grandparent) != item_direction;
        let into_list = self.doc.is_list(grandparent);
        let container = if into_list {
            let item = self.doc.shallow_clone(record.item);
            if loose {
                self.doc.set_direction(item, item_direction);
            }
            item
        } else {
            self.doc.create_fragment()
        };

        let styled = self.doc.attr(record.item, "style").is_some()
            || self.doc.attr(record.item, "class").is_some();
        let needs_block =
            !into_list && (self.options.enter_mode != EnterMode::Br || loose || styled);
        let context = inherit::Context {
            direction: item_direction,
            loose,
        };
        let keep_bookmarks_aside = record.contents.len() > 1;
        let mut block: Option<NodeId> = None;
        let mut pending_bookmark: Option<NodeId> = None;

        for &content in &record.contents {
            let copy = self.doc.deep_clone(content);
            if keep_bookmarks_aside && self.doc.is_bookmark(content) {
                if needs_block {
                    pending_bookmark = Some(copy);
                } else {
                    self.doc.append_child(container, copy);
                }
            } else if self.doc.is_block_boundary(content) {
                if self.doc.is_block(copy) {
                    inherit::apply(self.doc, record.item, copy, inherit::FREED_BLOCK, context);
                }
                block = None;
                if let Some(bookmark) = pending_bookmark.take() {
                    self.doc.append_child(container, bookmark);
                }
                self.doc.append_child(container, copy);
            } else if needs_block {
                let target = match block {
                    Some(existing) => existing,
                    None => {
                        let created = self.doc.create_element(self.options.paragraph_tag());
                        self.doc.append_child(container, created);
                        inherit::apply(self.doc, record.item, created, inherit::WRAPPING_BLOCK, context);
                        block = Some(created);
                        created
                    }
                };
                if let Some(bookmark) = pending_bookmark.take() {
                    self.doc.append_child(target, bookmark);
                }
                self.doc.append_child(target, copy);
            } else {
                self.doc.append_child(container, copy);
            }
        }
        if let Some(bookmark) = pending_bookmark {
            self.doc.append_child(block.unwrap_or(container), bookmark);
        }

        self.strip_labels(container);

        if !into_list && index + 1 != self.records.len() {
            if let Some(last) = self.doc.last_child(container)
                && self.doc.is_tag(last, "br")
            {
                self.doc.detach(last);
            }
            let last_content = self
                .doc
                .children(container)
                .iter()
                .rev()
                .copied()
                .find(|&child| !self.doc.is_blank(child));
            if last_content.is_some_and(|child| !self.doc.is_block(child)) {
                let line_break = self.doc.create_element("br");
                self.doc.append_child(container, line_break);
            }
        }

        self.doc.append_child(fragment, container);
        into_list.then_some(container)
    }

    /// Remove labels from the paragraphs directly inside `container`.
    fn strip_labels(&mut self, container: NodeId) {
        for child in self.doc.children(container).to_vec() {
            if !self.doc.is_tag(child, "p") {
                continue;
            }
            let label = self.doc.find_first(child, |node| {
                self.doc.is_tag(node, "span") && self.doc.has_class(node, &self.options.label_class)
            });
            if let Some(label) = label {
                remove_label(self.doc, label);
            }
        }
    }

    /// Drop `dir` from items when the nearest explicit direction above them
    /// inside the fragment already says the same.
    fn strip_redundant_directions(&mut self, fragment: NodeId) {
        for node in self.doc.descendants(fragment) {
            if !self.doc.is_list_item(node) {
                continue;
            }
            if let Some(own) = self.doc.direction(node)
                && self.doc.explicit_direction_above(node) == Some(own)
            {
                self.doc.remove_attr(node, "dir");
            }
        }
    }
}
