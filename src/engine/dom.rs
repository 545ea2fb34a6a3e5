//! HTML parser – converts a document string into a simple DOM tree.
//!
//! Covers the markup the report renderer and fragment builder emit: document
//! structure, sectioning blocks, headings, paragraphs, spans, tables, images,
//! `hr`/`br`, plus `style` / `script` / `title` raw-text elements.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Meta,
    Link,
    Style,
    Script,
    Div,
    Section,
    Header,
    Footer,
    Main,
    Figure,
    Figcaption,
    P,
    H1,
    H2,
    H3,
    Span,
    Br,
    Hr,
    Img,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    /// Unrecognised elements are laid out as plain blocks.
    Unknown(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "link" => Tag::Link,
            "style" => Tag::Style,
            "script" => Tag::Script,
            "div" => Tag::Div,
            "section" => Tag::Section,
            "header" => Tag::Header,
            "footer" => Tag::Footer,
            "main" => Tag::Main,
            "figure" => Tag::Figure,
            "figcaption" => Tag::Figcaption,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "span" => Tag::Span,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tr" => Tag::Tr,
            "th" => Tag::Th,
            "td" => Tag::Td,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Meta | Tag::Link | Tag::Br | Tag::Hr | Tag::Img)
    }

    /// Elements whose content is text up to the matching close tag.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Style | Tag::Script | Tag::Title)
    }

    /// Elements that never produce boxes.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Tag::Head | Tag::Title | Tag::Meta | Tag::Link | Tag::Style | Tag::Script
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Body => "body",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Style => "style",
            Tag::Script => "script",
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Main => "main",
            Tag::Figure => "figure",
            Tag::Figcaption => "figcaption",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::Span => "span",
            Tag::Br => "br",
            Tag::Hr => "hr",
            Tag::Img => "img",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Th => "th",
            Tag::Td => "td",
            Tag::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                DomNode::Text(t) => out.push_str(t),
                DomNode::Element(e) => out.push_str(&e.text_content()),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of top-level nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    Parser { input: html, pos: 0 }.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() && !self.starts_with("</") {
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        let mut chars = self.rest().chars();
        let opens_tag = chars.next() == Some('<')
            && chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if opens_tag {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // A lone '<' that does not open a tag is text.
        self.advance_char();
        while !self.eof() && !self.starts_with("<") {
            self.advance_char();
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let tag = Tag::from_name(&self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character in the tag; skip it.
                self.advance_char();
                continue;
            }
            if !key.is_empty() {
                elem.attributes.entry(key).or_insert(value);
            }
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        if elem.tag.is_raw_text() {
            let raw = self.take_raw_text(elem.tag.name());
            if !raw.is_empty() {
                let text = if elem.tag == Tag::Title {
                    decode_entities(&raw)
                } else {
                    raw
                };
                elem.children.push(DomNode::Text(text));
            }
            return DomNode::Element(elem);
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }
        DomNode::Element(elem)
    }

    /// Text up to `</name`, consuming the closing tag.
    fn take_raw_text(&mut self, name: &str) -> String {
        let close = format!("</{name}");
        let rest = self.rest();
        let end = find_ascii_case_insensitive(rest, &close).unwrap_or(rest.len());
        let text = rest[..end].to_string();
        self.pos += end;
        if !self.eof() {
            self.skip_past(">");
        }
        text
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ':') {
                self.advance_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name().to_ascii_lowercase();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        (key, self.parse_attr_value())
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if self.current_char() == Some(quote) {
                self.pos += 1;
                let start = self.pos;
                while self.current_char().is_some_and(|c| c != quote) {
                    self.advance_char();
                }
                let value = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.pos += 1;
                }
                return value;
            }
        }
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance_char();
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    fn skip_past(&mut self, marker: &str) {
        match self.rest().find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Decode character references in one pass, so `&amp;lt;` stays `&lt;`.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "euro" => '\u{20AC}',
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// First element with `tag`, depth first.
pub fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if &e.tag == tag {
                return Some(e);
            }
            if let Some(found) = find_element(&e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

/// Every element with `tag`, in document order.
pub fn collect_elements<'a>(nodes: &'a [DomNode], tag: &Tag, out: &mut Vec<&'a ElementNode>) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if &e.tag == tag {
                out.push(e);
            }
            collect_elements(&e.children, tag, out);
        }
    }
}

/// Replace the children of every element carrying `class` with `text`.
pub fn fill_class(nodes: &mut [DomNode], class: &str, text: &str) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.has_class(class) {
                e.children = vec![DomNode::Text(text.to_string())];
            } else {
                fill_class(&mut e.children, class, text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &ElementNode {
        match node {
            DomNode::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parse_nested_blocks() {
        let nodes = parse_html(r#"<div class="flex p-4"><p>Hello</p></div>"#);
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, Tag::Div);
        assert_eq!(div.classes().collect::<Vec<_>>(), vec!["flex", "p-4"]);
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn void_elements_have_no_children() {
        let nodes = parse_html(r#"<img src="a.png"><hr><p>x<br>y</p>"#);
        assert_eq!(nodes.len(), 3);
        assert_eq!(element(&nodes[0]).attr("src"), Some("a.png"));
        assert_eq!(element(&nodes[1]).tag, Tag::Hr);
        assert_eq!(element(&nodes[2]).children.len(), 3);
    }

    #[test]
    fn whitespace_between_inline_elements_is_kept() {
        let nodes = parse_html("<div><span>Due</span> <span>today</span></div>");
        let div = element(&nodes[0]);
        assert_eq!(div.children.len(), 3);
        assert_eq!(div.text_content(), "Due today");
    }

    #[test]
    fn multibyte_text_at_node_start() {
        let nodes = parse_html("<td>€ 100</td><p>日本語 😀</p>€<span>Über</span>a < é");
        assert_eq!(element(&nodes[0]).text_content(), "€ 100");
        assert_eq!(element(&nodes[1]).text_content(), "日本語 😀");
        assert!(matches!(&nodes[2], DomNode::Text(t) if t == "€"));
        assert_eq!(element(&nodes[3]).text_content(), "Über");
        assert_eq!(nodes.len(), 6);
        assert!(matches!(&nodes[5], DomNode::Text(t) if t == "< é"));
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(decode_entities("a &amp;lt; b"), "a &lt; b");
        assert_eq!(decode_entities("&#39;x&#x27;"), "'x'");
        assert_eq!(decode_entities("Page&nbsp;1"), "Page\u{A0}1");
        assert_eq!(decode_entities("AT&T; R&D"), "AT&T; R&D");
    }

    #[test]
    fn raw_text_elements() {
        let nodes = parse_html("<style>p > span { color: red; }</style><script>if (a < b) {}</script><p>ok</p>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(element(&nodes[0]).text_content(), "p > span { color: red; }");
        assert_eq!(element(&nodes[1]).text_content(), "if (a < b) {}");
    }

    #[test]
    fn doctype_and_comments_skipped() {
        let nodes = parse_html("<!DOCTYPE html>\n<!-- hi --><html><head><title>T &amp; C</title></head><body><p>x</p></body></html>");
        let title = find_element(&nodes, &Tag::Title).unwrap();
        assert_eq!(title.text_content(), "T & C");
        assert!(find_element(&nodes, &Tag::Body).is_some());
    }

    #[test]
    fn attribute_values_decoded() {
        let nodes = parse_html(r#"<div style="font-family:&quot;Open Sans&quot;" data-x='1'></div>"#);
        let div = element(&nodes[0]);
        assert_eq!(div.attr("style"), Some("font-family:\"Open Sans\""));
        assert_eq!(div.attr("data-x"), Some("1"));
    }

    #[test]
    fn fill_class_replaces_content() {
        let mut nodes = parse_html(r#"<div><span class="pageNumber"></span> / <span class="totalPages"></span></div>"#);
        fill_class(&mut nodes, "pageNumber", "2");
        fill_class(&mut nodes, "totalPages", "7");
        assert_eq!(element(&nodes[0]).text_content(), "2 / 7");
    }

    #[test]
    fn table_sections() {
        let nodes = parse_html("<table><thead><tr><th>A</th></tr></thead><tbody><tr><td>1</td></tr></tbody></table>");
        let mut rows = Vec::new();
        collect_elements(&nodes, &Tag::Tr, &mut rows);
        assert_eq!(rows.len(), 2);
    }
}
