//! Label maintenance for ordered and unordered lists.
//!
//! Ordered items carry a label `span` inside their first paragraph; the
//! renumbering pass rewrites only the ordinal portion of existing labels (and
//! the outline prefix, for section numbering) and creates missing ones.
//! Unordered items carry no label, so the pass over a `ul` strips them.
//! Running either pass twice in a row changes nothing the second time.

use crate::dom::{Document, NodeId};
use crate::error::ListError;
use crate::label::{self, LabelParts};
use crate::lists::{find_label, is_label, items_of, label_paragraph, remove_label};
use crate::options::ListOptions;
use crate::ordinal::{OrdinalType, classify};

/// Label nodes touched by a renumbering pass, so a host can bind or destroy
/// whatever it attaches to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    pub created: Vec<NodeId>,
    pub updated: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl LabelReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn extend(&mut self, other: LabelReport) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.removed.extend(other.removed);
    }
}

/// Overrides for one ordered renumbering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Numbering<'a> {
    /// Use this type instead of the container's own or the inferred one.
    pub ordinal_type: Option<OrdinalType>,
    /// Outline prefix for items that have no labelled ancestor item.
    pub outline_prefix: Option<&'a str>,
    /// The pass follows an indent: items without a labelled ancestor keep
    /// their current prefix.
    pub indent: bool,
}

pub fn renumber_ordered(
    doc: &mut Document,
    list: NodeId,
    numbering: Numbering<'_>,
    options: &ListOptions,
) -> LabelReport {
    let mut pass = Renumber {
        doc,
        options,
        report: LabelReport::default(),
    };
    pass.ordered(list, numbering);
    pass.report
}

pub fn renumber_unordered(doc: &mut Document, list: NodeId, options: &ListOptions) -> LabelReport {
    let mut pass = Renumber {
        doc,
        options,
        report: LabelReport::default(),
    };
    pass.unordered(list, false);
    pass.report
}

/// Renumber `list` by its tag.
pub fn renumber_list(
    doc: &mut Document,
    list: NodeId,
    indent: bool,
    options: &ListOptions,
) -> Result<LabelReport, ListError> {
    match doc.tag(list) {
        Some("ol") => Ok(renumber_ordered(
            doc,
            list,
            Numbering {
                indent,
                ..Numbering::default()
            },
            options,
        )),
        Some("ul") => Ok(renumber_unordered(doc, list, options)),
        _ => Err(ListError::NotAList(list)),
    }
}

/// Renumber every outermost list in the document.
pub fn renumber_document(doc: &mut Document, options: &ListOptions) -> LabelReport {
    let body = doc.body();
    let roots: Vec<NodeId> = doc
        .descendants(body)
        .into_iter()
        .filter(|&node| doc.is_list(node) && !doc.ancestors(node).any(|a| doc.is_list(a)))
        .collect();
    let mut report = LabelReport::default();
    for list in roots {
        if let Ok(labels) = renumber_list(doc, list, false, options) {
            report.extend(labels);
        }
    }
    report
}

/// Numbering type suggested by the first item's label.
pub fn infer_ordinal_type(doc: &Document, list: NodeId, options: &ListOptions) -> Option<OrdinalType> {
    let first = items_of(doc, list).into_iter().next()?;
    let label = doc
        .children(first)
        .iter()
        .filter(|&&child| doc.is_tag(child, "p"))
        .find_map(|&paragraph| doc.find_first(paragraph, |node| is_label(doc, node, options)))?;
    let parts = label::parse(&doc.text_content(label))?;
    Some(match classify(&parts.ordinal) {
        OrdinalType::Arabic => options.numeric_labels_as,
        other => other,
    })
}

/// A list nested in an exception-class list which itself sits in a wrapped
/// list is numbered by hand.
pub fn is_manually_numbered(doc: &Document, list: NodeId, options: &ListOptions) -> bool {
    let Some(grandparent) = doc.parent(list).and_then(|parent| doc.parent(parent)) else {
        return false;
    };
    doc.has_class(grandparent, &options.exception_class)
        && doc
            .ascendant(grandparent, "ol")
            .and_then(|ancestor| doc.parent(ancestor))
            .is_some_and(|parent| doc.has_class(parent, &options.wrapper_class))
}

struct Renumber<'a> {
    doc: &'a mut Document,
    options: &'a ListOptions,
    report: LabelReport,
}

impl Renumber<'_> {
    fn ordered(&mut self, list: NodeId, numbering: Numbering<'_>) {
        if !self.doc.is_tag(list, "ol") {
            return;
        }
        if is_manually_numbered(self.doc, list, self.options) {
            log::debug!("leaving manually numbered list {list:?} alone");
            return;
        }
        let ordinal_type = numbering
            .ordinal_type
            .or_else(|| self.doc.list_type(list))
            .or_else(|| infer_ordinal_type(self.doc, list, self.options))
            .unwrap_or(self.options.default_ordinal_type);

        for (position, item) in items_of(self.doc, list).into_iter().enumerate() {
            let index = position + ordinal_type.first_index();
            let ordinal = ordinal_type.encode(index).unwrap_or_else(|err| {
                log::warn!("{err}; numbering item {} as {index}", position + 1);
                index.to_string()
            });
            self.relabel(item, ordinal_type, &ordinal, numbering);

            for child in self.doc.element_children(item) {
                if self.doc.is_tag(child, "ol") {
                    self.ordered(
                        child,
                        Numbering {
                            indent: numbering.indent,
                            ..Numbering::default()
                        },
                    );
                } else if self.doc.is_tag(child, "ul") {
                    self.unordered(child, numbering.indent);
                }
            }
        }
    }

    fn relabel(
        &mut self,
        item: NodeId,
        ordinal_type: OrdinalType,
        ordinal: &str,
        numbering: Numbering<'_>,
    ) {
        let paragraph = match label_paragraph(self.doc, item) {
            Some(paragraph) => paragraph,
            None => {
                let created = self.doc.create_element("p");
                self.doc.prepend_child(item, created);
                created
            }
        };
        let existing = self
            .doc
            .find_first(paragraph, |node| is_label(self.doc, node, self.options));

        match existing {
            Some(label) => {
                let current = self.doc.text_content(label);
                let next = match label::parse(&current) {
                    Some(parts) => {
                        let prefix = self.prefix_for(item, ordinal_type, &parts, numbering);
                        parts.relabel(&prefix, ordinal)
                    }
                    None => {
                        log::warn!("label {current:?} has no ordinal; replacing it");
                        self.fresh_label(item, ordinal_type, ordinal, numbering)
                    }
                };
                if next != current {
                    self.doc.set_text(label, &next);
                    self.report.updated.push(label);
                }
            }
            None => {
                let text = self.fresh_label(item, ordinal_type, ordinal, numbering);
                let label = self.doc.create_element("span");
                self.doc.add_class(label, &self.options.label_class);
                self.doc.set_text(label, &text);
                let space = self.doc.create_text(" ");
                self.doc.prepend_child(paragraph, space);
                self.doc.prepend_child(paragraph, label);
                self.report.created.push(label);
            }
        }
    }

    /// Outline chain of the nearest ancestor item's label, if it has one.
    fn ancestor_chain(&self, item: NodeId) -> Option<String> {
        let ancestor = self.doc.ascendant(item, "li")?;
        let label = find_label(self.doc, ancestor, self.options)?;
        label::parse(&self.doc.text_content(label)).map(|parts| parts.outline_chain())
    }

    fn prefix_for(
        &self,
        item: NodeId,
        ordinal_type: OrdinalType,
        parts: &LabelParts,
        numbering: Numbering<'_>,
    ) -> String {
        if ordinal_type != OrdinalType::Outline {
            return parts.marker.clone();
        }
        if let Some(chain) = self.ancestor_chain(item) {
            return format!("{}{chain}", parts.marker);
        }
        match numbering.outline_prefix {
            Some(prefix) => format!("{}{prefix}", parts.marker),
            None if numbering.indent && !parts.prefix().is_empty() => parts.prefix(),
            None => parts.marker.clone(),
        }
    }

    fn fresh_label(
        &self,
        item: NodeId,
        ordinal_type: OrdinalType,
        ordinal: &str,
        numbering: Numbering<'_>,
    ) -> String {
        let prefix = if ordinal_type == OrdinalType::Outline {
            self.ancestor_chain(item)
                .or_else(|| numbering.outline_prefix.map(str::to_string))
                .unwrap_or_default()
        } else {
            String::new()
        };
        format!("{prefix}{ordinal}.")
    }

    fn unordered(&mut self, list: NodeId, indent: bool) {
        if !self.doc.is_tag(list, "ul") {
            return;
        }
        for item in items_of(self.doc, list) {
            if let Some(label) = find_label(self.doc, item, self.options) {
                remove_label(self.doc, label);
                self.report.removed.push(label);
            }
            for child in self.doc.element_children(item) {
                if self.doc.is_tag(child, "ol") {
                    self.ordered(
                        child,
                        Numbering {
                            indent,
                            ..Numbering::default()
                        },
                    );
                } else if self.doc.is_tag(child, "ul") {
                    self.unordered(child, indent);
                }
            }
        }
    }
}
