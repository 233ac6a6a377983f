//! Element tree built from Markdown events.
//!
//! pulldown-cmark produces a flat event stream; the sanitizer and decorator
//! need a tree. Raw HTML fragments are tokenized into elements of the same
//! tree so the allow-list sees them like any other node.

use crate::render::html::{HtmlToken, tokenize};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use std::fmt::Write as _;

/// Tags that never have children or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace the attribute if present, append it otherwise.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out, &|_| true);
        out
    }

    /// Text of descendants, skipping subtrees rejected by `descend`.
    pub fn text_content_filtered(&self, descend: &dyn Fn(&Element) -> bool) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out, descend);
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String, descend: &dyn Fn(&Element) -> bool) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if descend(element) => {
                collect_text(&element.children, out, descend)
            }
            Node::Element(_) => {}
        }
    }
}

/// Serialize a list of sibling nodes.
pub fn nodes_to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(text, false, out),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        let _ = write!(out, " {name}=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');
    if element.is_void() {
        return;
    }
    for child in &element.children {
        write_node(child, out);
    }
    let _ = write!(out, "</{}>", element.tag);
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// How a frame on the builder stack gets closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Opened by a Markdown `Start` event, closed by the matching `End`.
    Markdown,
    /// Opened alongside a Markdown frame and closed with it.
    Implicit,
    /// Opened by a raw HTML start tag.
    Raw,
}

struct Frame {
    element: Element,
    origin: Origin,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

struct TreeBuilder {
    stack: Vec<Frame>,
    roots: Vec<Node>,
    table: Option<TableState>,
}

fn parser_options() -> Options {
    Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Parse Markdown into a forest of nodes. Nothing is filtered here.
pub fn parse_markdown(source: &str) -> Vec<Node> {
    let mut builder = TreeBuilder {
        stack: Vec::new(),
        roots: Vec::new(),
        table: None,
    };
    for event in Parser::new_ext(source, parser_options()) {
        builder.handle(event);
    }
    builder.finish()
}

impl TreeBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let mut element = Element::new("code");
                element.push_text(&code);
                self.append(Node::Element(element));
            }
            Event::Html(html) => self.raw_html(&html),
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.append(Node::Element(Element::new("br"))),
            Event::Rule => self.append(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => self.text(if checked { "☑ " } else { "☐ " }),
            Event::FootnoteReference(label) => self.text(&format!("[{label}]")),
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open("p"),
            Tag::Heading(level, ..) => self.open(heading_tag(level)),
            Tag::BlockQuote => self.open("blockquote"),
            Tag::CodeBlock(kind) => {
                self.open("pre");
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code.set_attr("class", format!("language-{lang}"));
                    }
                }
                self.push(code, Origin::Implicit);
            }
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list.set_attr("start", start.to_string());
                }
                self.push(list, Origin::Markdown);
            }
            Tag::List(None) => self.open("ul"),
            Tag::Item => self.open("li"),
            Tag::FootnoteDefinition(label) => {
                self.open("div");
                self.text(&format!("[{label}] "));
            }
            Tag::Table(alignments) => {
                self.table = Some(TableState {
                    alignments,
                    ..TableState::default()
                });
                self.open("table");
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.cell = 0;
                }
                self.open("thead");
                self.push(Element::new("tr"), Origin::Implicit);
            }
            Tag::TableRow => {
                if self.top_tag() == Some("table") {
                    self.push(Element::new("tbody"), Origin::Implicit);
                }
                if let Some(table) = self.table.as_mut() {
                    table.cell = 0;
                }
                self.open("tr");
            }
            Tag::TableCell => {
                let (tag, alignment) = match self.table.as_mut() {
                    Some(table) => {
                        let alignment = table.alignments.get(table.cell).copied();
                        table.cell += 1;
                        (if table.in_head { "th" } else { "td" }, alignment)
                    }
                    None => ("td", None),
                };
                let mut cell = Element::new(tag);
                if let Some(align) = alignment.and_then(alignment_name) {
                    cell.set_attr("style", format!("text-align:{align}"));
                }
                self.push(cell, Origin::Markdown);
            }
            Tag::Emphasis => self.open("em"),
            Tag::Strong => self.open("strong"),
            Tag::Strikethrough => self.open("del"),
            Tag::Link(_, dest, _) => {
                self.push(
                    Element::new("a").with_attr("href", dest.to_string()),
                    Origin::Markdown,
                );
            }
            Tag::Image(_, dest, _) => {
                self.push(
                    Element::new("img").with_attr("src", dest.to_string()),
                    Origin::Markdown,
                );
            }
        }
    }

    fn end_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = false;
                }
            }
            Tag::Table(_) => self.table = None,
            _ => {}
        }
        self.close_markdown();
    }

    fn open(&mut self, tag: &str) {
        self.push(Element::new(tag), Origin::Markdown);
    }

    fn push(&mut self, element: Element, origin: Origin) {
        self.stack.push(Frame { element, origin });
    }

    fn top_tag(&self) -> Option<&str> {
        self.stack.last().map(|frame| frame.element.tag.as_str())
    }

    /// Pop frames up to and including the innermost Markdown frame. Raw HTML
    /// left open inside a Markdown block is closed with it.
    fn close_markdown(&mut self) {
        while let Some(frame) = self.stack.pop() {
            let origin = frame.origin;
            self.append(Node::Element(frame.element));
            if origin == Origin::Markdown {
                break;
            }
        }
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.element.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(frame) => frame.element.push_text(text),
            None => match self.roots.last_mut() {
                Some(Node::Text(last)) => last.push_str(text),
                _ => self.roots.push(Node::Text(text.to_string())),
            },
        }
    }

    fn raw_html(&mut self, html: &str) {
        for token in tokenize(html) {
            match token {
                HtmlToken::Text(text) => self.text(&text),
                HtmlToken::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let element = Element {
                        tag: name,
                        attrs,
                        children: Vec::new(),
                    };
                    if self_closing || element.is_void() {
                        self.append(Node::Element(element));
                    } else {
                        self.push(element, Origin::Raw);
                    }
                }
                HtmlToken::EndTag { name } => self.close_raw(&name),
            }
        }
    }

    /// Close the nearest raw element named `name`, if one is open above the
    /// innermost Markdown frame. Stray closing tags are ignored.
    fn close_raw(&mut self, name: &str) {
        let open = self
            .stack
            .iter()
            .rev()
            .take_while(|frame| frame.origin == Origin::Raw)
            .position(|frame| frame.element.tag == name);
        let Some(depth) = open else {
            return;
        };
        for _ in 0..=depth {
            if let Some(frame) = self.stack.pop() {
                self.append(Node::Element(frame.element));
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(frame) = self.stack.pop() {
            self.append(Node::Element(frame.element));
        }
        self.roots
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn alignment_name(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(source: &str) -> String {
        nodes_to_html(&parse_markdown(source))
    }

    #[test]
    fn builds_block_structure() {
        assert_eq!(
            html("# Title\n\n- a\n- *b*\n"),
            "<h1>Title</h1><ul><li>a</li><li><em>b</em></li></ul>"
        );
    }

    #[test]
    fn ordered_lists_keep_non_default_start() {
        assert_eq!(html("3. x\n4. y"), "<ol start=\"3\"><li>x</li><li>y</li></ol>");
        assert_eq!(html("1. x"), "<ol><li>x</li></ol>");
    }

    #[test]
    fn fenced_code_gets_language_class() {
        assert_eq!(
            html("```rust\nlet a = 1 < 2;\n```"),
            "<pre><code class=\"language-rust\">let a = 1 &lt; 2;\n</code></pre>"
        );
    }

    #[test]
    fn tables_get_head_body_and_alignment() {
        let out = html("| a | b |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            out,
            "<table><thead><tr><th style=\"text-align:left\">a</th>\
             <th style=\"text-align:right\">b</th></tr></thead>\
             <tbody><tr><td style=\"text-align:left\">1</td>\
             <td style=\"text-align:right\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn inline_html_becomes_elements() {
        let nodes = parse_markdown("a <span class=\"x\">b</span> c");
        let Node::Element(p) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.tag, "p");
        let Node::Element(span) = &p.children[1] else {
            panic!("expected span");
        };
        assert_eq!(span.tag, "span");
        assert_eq!(span.attr("class"), Some("x"));
        assert_eq!(span.text_content(), "b");
    }

    #[test]
    fn unclosed_raw_html_closes_with_its_block() {
        assert_eq!(html("<b>open\n\nnext"), "<p><b>open</b></p><p>next</p>");
        assert_eq!(html("a <i>b\n\nc"), "<p>a <i>b</i></p><p>c</p>");
    }

    #[test]
    fn serializer_escapes_text_and_attributes() {
        let mut element = Element::new("a")
            .with_attr("href", "x?a=1&b=\"2\"")
            .with_attr("title", "<t>");
        element.children.push(Node::Text("1 < 2 & 3".into()));
        assert_eq!(
            element.to_html(),
            "<a href=\"x?a=1&amp;b=&quot;2&quot;\" title=\"&lt;t&gt;\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn filtered_text_skips_rejected_subtrees() {
        let nodes = parse_markdown("- outer\n  - inner");
        let Node::Element(list) = &nodes[0] else {
            panic!("expected list");
        };
        let Node::Element(item) = &list.children[0] else {
            panic!("expected item");
        };
        assert_eq!(item.text_content_filtered(&|el| el.tag != "ul"), "outer");
    }
}
