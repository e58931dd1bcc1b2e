/*!
 * # Editing Core
 *
 * Key handling and the command layer on top of the structural list
 * operations.
 *
 * ## Architecture Overview
 *
 * ### 1. The editor owns the document
 * - [`ListEditor`] holds the [`Document`], the [`ListOptions`] it was opened
 *   with and a version counter
 * - Front ends never mutate the tree themselves
 *
 * ### 2. Command-Based Editing
 * - Every edit is a [`Cmd`] applied with [`ListEditor::apply`]
 * - A command either succeeds and yields a [`ListPatch`], or fails with a
 *   [`ListError`] and leaves the document as it was
 * - Commands that change nothing do not bump the version
 *
 * ### 3. Read API: Outline snapshots
 * - [`snapshot::outline`] flattens the body into [`OutlineLine`]s with depth,
 *   label and text, which is all a terminal front end needs to draw
 *
 * ## Module Structure
 *
 * - **`enter`**: Enter inside list items (split, or leave the list)
 * - **`join`**: Backspace and Delete across item boundaries
 * - **`snapshot`**: immutable outline view of the document
 *
 * ## Usage Pattern
 *
 * ```rust
 * use listwright_engine::editing::{Cmd, ListEditor, ListKind};
 * use listwright_engine::ListOptions;
 *
 * let mut editor = ListEditor::from_markdown("first\n\nsecond\n", ListOptions::default());
 * let blocks: Vec<_> = editor.outline().iter().map(|line| line.block).collect();
 *
 * let patch = editor
 *     .apply(Cmd::ToggleList { blocks, kind: ListKind::Ordered })
 *     .unwrap();
 *
 * assert_eq!(patch.version, 1);
 * assert_eq!(editor.outline()[1].label.as_deref(), Some("2."));
 * ```
 */

pub mod enter;
pub mod join;
pub mod snapshot;

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::lists::{
    self, ItemRange, LabelReport, ListChange, change_list_type, create_list, merge_adjacent_lists,
    remove_list, renumber_document, toggle_list,
};
use crate::options::ListOptions;

pub use enter::{SplitPoint, enter};
pub use join::{backspace, delete};
pub use snapshot::{LineKind, OutlineLine, outline};

/// The two list flavours a command can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

/// Edit commands understood by [`ListEditor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Enter inside `item`, optionally splitting its content.
    Enter {
        item: NodeId,
        split: Option<SplitPoint>,
    },
    /// Backspace with the caret at the start of `block`.
    Backspace { block: NodeId },
    /// Delete with the caret at the end of `block`.
    Delete { block: NodeId },
    Indent { range: ItemRange },
    Outdent { range: ItemRange },
    /// The toolbar list button.
    ToggleList { blocks: Vec<NodeId>, kind: ListKind },
    CreateList { blocks: Vec<NodeId>, kind: ListKind },
    ChangeListType { list: NodeId, kind: ListKind },
    /// Take the items holding `selected` out of `list`.
    RemoveList { list: NodeId, selected: Vec<NodeId> },
    MergeAdjacent { list: NodeId },
    /// Renumber every list in the document.
    Renumber,
}

/// Result of applying a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatch {
    /// Top-level nodes the command inserted or rewrote.
    pub changed: Vec<NodeId>,
    pub labels: LabelReport,
    /// Where a host should put the caret.
    pub focus: Option<NodeId>,
    pub version: u64,
}

impl ListPatch {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.labels.is_empty() && self.focus.is_none()
    }
}

/// A document plus the options it is edited with.
#[derive(Debug, Clone)]
pub struct ListEditor {
    doc: Document,
    options: ListOptions,
    version: u64,
}

impl ListEditor {
    pub fn new(doc: Document, options: ListOptions) -> Self {
        Self {
            doc,
            options,
            version: 0,
        }
    }

    /// Import Markdown and give every ordered list its labels.
    pub fn from_markdown(markdown: &str, options: ListOptions) -> Self {
        let mut doc = Document::from_markdown(markdown);
        let labels = renumber_document(&mut doc, &options);
        log::debug!("imported markdown, {} labels created", labels.created.len());
        Self::new(doc, options)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn to_html(&self) -> String {
        self.doc.body_html()
    }

    pub fn outline(&self) -> Vec<OutlineLine> {
        outline(&self.doc, &self.options)
    }

    /// Apply a command to the document.
    pub fn apply(&mut self, cmd: Cmd) -> Result<ListPatch, ListError> {
        log::debug!("applying {cmd:?}");
        let change = self.run(cmd)?;
        if !change.is_noop() {
            self.version += 1;
        }
        let mut keep = change.roots.clone();
        keep.extend(change.focus);
        self.doc.collect_garbage(&keep);
        Ok(ListPatch {
            changed: change.roots,
            labels: change.labels,
            focus: change.focus,
            version: self.version,
        })
    }

    fn run(&mut self, cmd: Cmd) -> Result<ListChange, ListError> {
        let doc = &mut self.doc;
        let options = &self.options;
        match cmd {
            Cmd::Enter { item, split } => enter(doc, item, split, options),
            Cmd::Backspace { block } => backspace(doc, block, options),
            Cmd::Delete { block } => delete(doc, block, options),
            Cmd::Indent { range } => lists::indent(doc, range, options),
            Cmd::Outdent { range } => lists::outdent(doc, range, options),
            Cmd::ToggleList { blocks, kind } => toggle_list(doc, &blocks, kind.tag(), options),
            Cmd::CreateList { blocks, kind } => create_list(doc, &blocks, kind.tag(), options),
            Cmd::ChangeListType { list, kind } => change_list_type(doc, list, &[], kind.tag(), options),
            Cmd::RemoveList { list, selected } => remove_list(doc, list, &selected, options),
            Cmd::MergeAdjacent { list } => Ok(merge_adjacent_lists(doc, list, options)),
            Cmd::Renumber => Ok(ListChange {
                labels: renumber_document(doc, options),
                ..ListChange::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(markdown: &str) -> ListEditor {
        ListEditor::from_markdown(markdown, ListOptions::default())
    }

    #[test]
    fn test_import_labels_ordered_lists() {
        let editor = editor("1. one\n2. two\n");

        let labels: Vec<Option<String>> = editor.outline().into_iter().map(|line| line.label).collect();

        assert_eq!(labels, vec![Some("1.".to_string()), Some("2.".to_string())]);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_toggle_list_bumps_version() {
        let mut editor = editor("first\n\nsecond\n");
        let blocks: Vec<NodeId> = editor.outline().iter().map(|line| line.block).collect();

        let patch = editor
            .apply(Cmd::ToggleList {
                blocks,
                kind: ListKind::Unordered,
            })
            .unwrap();

        assert_eq!(patch.version, 1);
        assert_eq!(patch.changed.len(), 1);
        insta::assert_snapshot!(editor.to_html(), @"<ul><li><p>first</p></li><li><p>second</p></li></ul>");
    }

    #[test]
    fn test_noop_command_keeps_version() {
        let mut editor = editor("- a\n- b\n");
        let first = editor.outline()[0].node;

        // Given the first item of a list, indenting it is refused
        let patch = editor
            .apply(Cmd::Indent {
                range: ItemRange::single(first),
            })
            .unwrap();

        assert!(patch.is_noop());
        assert_eq!(patch.version, 0);
    }

    #[test]
    fn test_failed_command_reports_error() {
        let mut editor = editor("just text\n");
        let paragraph = editor.outline()[0].node;

        let result = editor.apply(Cmd::RemoveList {
            list: paragraph,
            selected: vec![paragraph],
        });

        assert!(matches!(result, Err(ListError::NotAList(_))));
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_change_type_then_renumber_is_stable() {
        let mut editor = editor("- a\n- b\n");
        let list = editor.document().children(editor.document().body())[0];

        editor
            .apply(Cmd::ChangeListType {
                list,
                kind: ListKind::Ordered,
            })
            .unwrap();
        let patch = editor.apply(Cmd::Renumber).unwrap();

        assert!(patch.labels.created.is_empty());
        assert_eq!(editor.outline()[1].label.as_deref(), Some("2."));
    }
}
