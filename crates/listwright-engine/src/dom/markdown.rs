use std::collections::HashSet;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag};

use super::{Document, NodeId};

impl Document {
    /// Import Markdown into a fresh document.
    ///
    /// Lists become `ol`/`ul` with `li` items whose inline content is always
    /// wrapped in a `p`, which is where list labels live. No labels are
    /// added here; run the renumbering engine over the lists for that.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut doc = Document::new();
        let body = doc.body();
        let mut importer = Importer {
            doc: &mut doc,
            body,
            open: Vec::new(),
            implicit_paragraphs: HashSet::new(),
        };
        for event in Parser::new(markdown) {
            importer.event(event);
        }
        doc
    }
}

struct Importer<'a> {
    doc: &'a mut Document,
    body: NodeId,
    /// Open tags; `None` for tags that produce no element.
    open: Vec<Option<NodeId>>,
    /// Paragraphs created for tight list items.
    implicit_paragraphs: HashSet<NodeId>,
}

impl Importer<'_> {
    fn parent(&self) -> NodeId {
        self.open.iter().rev().find_map(|node| *node).unwrap_or(self.body)
    }

    /// Where inline content goes: tight list items get a paragraph.
    fn inline_parent(&mut self) -> NodeId {
        let parent = self.parent();
        if !self.doc.is_list_item(parent) {
            return parent;
        }
        if let Some(last) = self.doc.last_child(parent)
            && self.implicit_paragraphs.contains(&last)
        {
            return last;
        }
        let paragraph = self.doc.create_element("p");
        self.doc.append_child(parent, paragraph);
        self.implicit_paragraphs.insert(paragraph);
        paragraph
    }

    fn open_element(&mut self, tag: &str, inline: bool) -> NodeId {
        let parent = if inline {
            self.inline_parent()
        } else {
            self.parent()
        };
        let element = self.doc.create_element(tag);
        self.doc.append_child(parent, element);
        element
    }

    fn push_text(&mut self, text: &str) {
        let parent = self.inline_parent();
        // Merge with a preceding text node so entities do not split words.
        if let Some(last) = self.doc.last_child(parent)
            && let Some(existing) = self.doc.text(last)
        {
            let merged = format!("{existing}{text}");
            self.doc.set_text(last, &merged);
            return;
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => {
                let node = self.start(tag);
                self.open.push(node);
            }
            Event::End(_) => {
                self.open.pop();
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let element = self.open_element("code", true);
                let text = self.doc.create_text(&code);
                self.doc.append_child(element, text);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => {
                self.open_element("br", true);
            }
            Event::Rule => {
                self.open_element("hr", false);
            }
            Event::TaskListMarker(checked) => self.push_text(if checked { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) -> Option<NodeId> {
        match tag {
            Tag::Paragraph => Some(self.open_element("p", false)),
            Tag::Heading { level, .. } => {
                let tag = match level {
                    HeadingLevel::H1 => "h1",
                    HeadingLevel::H2 => "h2",
                    HeadingLevel::H3 => "h3",
                    HeadingLevel::H4 => "h4",
                    HeadingLevel::H5 => "h5",
                    HeadingLevel::H6 => "h6",
                };
                Some(self.open_element(tag, false))
            }
            Tag::BlockQuote(_) => Some(self.open_element("blockquote", false)),
            Tag::CodeBlock(kind) => {
                let pre = self.open_element("pre", false);
                let code = self.doc.create_element("code");
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.doc.set_attr(code, "class", format!("language-{lang}"));
                }
                self.doc.append_child(pre, code);
                Some(code)
            }
            Tag::List(Some(start)) => {
                let ol = self.open_element("ol", false);
                if start != 1 {
                    self.doc.set_attr(ol, "start", start.to_string());
                }
                Some(ol)
            }
            Tag::List(None) => Some(self.open_element("ul", false)),
            Tag::Item => Some(self.open_element("li", false)),
            Tag::Emphasis => Some(self.open_element("em", true)),
            Tag::Strong => Some(self.open_element("strong", true)),
            Tag::Strikethrough => Some(self.open_element("s", true)),
            Tag::Link { dest_url, .. } => {
                let link = self.open_element("a", true);
                self.doc.set_attr(link, "href", dest_url.to_string());
                Some(link)
            }
            _ => None,
        }
    }
}
