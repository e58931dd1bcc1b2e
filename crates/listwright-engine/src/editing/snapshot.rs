use crate::dom::{Document, NodeId};
use crate::lists::{find_label, is_label, items_of, label_paragraph, lists_in};
use crate::options::ListOptions;

/// What a line of the outline is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    Heading(u8),
    OrderedItem,
    UnorderedItem,
    Other,
}

/// One visual line of the document, as a front end lays it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLine {
    /// The item for list lines, else the block itself.
    pub node: NodeId,
    /// The block holding the line's text; commands that take blocks want
    /// this one.
    pub block: NodeId,
    /// Nesting depth, 0 for top-level content.
    pub depth: usize,
    pub label: Option<String>,
    /// Line text without the label.
    pub text: String,
    pub kind: LineKind,
}

/// Immutable outline view of the document body.
pub fn outline(doc: &Document, options: &ListOptions) -> Vec<OutlineLine> {
    let mut lines = Vec::new();
    walk(doc, doc.body(), 0, options, &mut lines);
    lines
}

fn walk(doc: &Document, container: NodeId, depth: usize, options: &ListOptions, lines: &mut Vec<OutlineLine>) {
    for &child in doc.children(container) {
        if doc.is_text(child) {
            if !doc.is_empty_content(child) {
                lines.push(plain_line(doc, child, depth, LineKind::Other));
            }
            continue;
        }
        let lists = lists_in(doc, child, options);
        if !lists.is_empty() {
            for list in lists {
                walk_list(doc, list, depth, options, lines);
            }
            continue;
        }
        if doc.is_tag(child, "br") || doc.is_bookmark(child) {
            continue;
        }
        let holds_blocks = doc.children(child).iter().any(|&node| doc.is_block(node));
        if holds_blocks {
            walk(doc, child, depth, options, lines);
        } else {
            lines.push(plain_line(doc, child, depth, block_kind(doc, child)));
        }
    }
}

fn walk_list(doc: &Document, list: NodeId, depth: usize, options: &ListOptions, lines: &mut Vec<OutlineLine>) {
    let kind = if doc.is_tag(list, "ol") {
        LineKind::OrderedItem
    } else {
        LineKind::UnorderedItem
    };
    for item in items_of(doc, list) {
        let paragraph = label_paragraph(doc, item);
        let text = match paragraph {
            Some(paragraph) => doc
                .children(paragraph)
                .iter()
                .filter(|&&node| !is_label(doc, node, options))
                .map(|&node| doc.text_content(node))
                .collect::<String>(),
            None => doc
                .children(item)
                .iter()
                .take_while(|&&node| !doc.is_block(node))
                .map(|&node| doc.text_content(node))
                .collect::<String>(),
        };
        lines.push(OutlineLine {
            node: item,
            block: paragraph.unwrap_or(item),
            depth,
            label: find_label(doc, item, options).map(|label| doc.text_content(label)),
            text: text.trim_start().to_string(),
            kind,
        });

        for &child in doc.children(item) {
            if Some(child) == paragraph || !doc.is_element(child) {
                continue;
            }
            if doc.is_list(child) {
                walk_list(doc, child, depth + 1, options, lines);
            } else if doc.is_block(child) {
                lines.push(plain_line(doc, child, depth + 1, block_kind(doc, child)));
            }
        }
    }
}

fn plain_line(doc: &Document, node: NodeId, depth: usize, kind: LineKind) -> OutlineLine {
    OutlineLine {
        node,
        block: node,
        depth,
        label: None,
        text: doc.text_content(node),
        kind,
    }
}

fn block_kind(doc: &Document, node: NodeId) -> LineKind {
    match doc.tag(node) {
        Some("p") => LineKind::Paragraph,
        Some(tag) if tag.len() == 2 && tag.starts_with('h') => tag[1..]
            .parse()
            .map_or(LineKind::Other, LineKind::Heading),
        _ => LineKind::Other,
    }
}
