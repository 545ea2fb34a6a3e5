//! Author stylesheet parser for `<style>` elements.
//!
//! Supports the selector forms a generated report uses: `*`, `tag`, `.class`
//! and `tag.class` (compound classes allowed), comma-separated selector
//! lists, `@media print|screen|all` blocks and one `@page` rule. Anything
//! more complex is skipped.

use crate::print::Media;

use super::dom::ElementNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// `None` matches any tag.
    pub tag: Option<String>,
    pub classes: Vec<String>,
}

impl Selector {
    /// Parse one simple selector. Returns `None` for forms we do not support
    /// (combinators, ids, attribute selectors, pseudo-classes).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || text
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '>' | '+' | '~' | '#' | '[' | ':'))
        {
            return None;
        }
        let mut parts = text.split('.');
        let head = parts.next()?;
        let tag = match head {
            "" | "*" => None,
            name if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => {
                Some(name.to_ascii_lowercase())
            }
            _ => return None,
        };
        let classes: Vec<String> = parts.map(str::to_string).collect();
        if classes.iter().any(String::is_empty) {
            return None;
        }
        Some(Self { tag, classes })
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if tag != element.tag.name() {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }

    /// Class count dominates, then the tag.
    pub fn specificity(&self) -> u32 {
        self.classes.len() as u32 * 10 + u32::from(self.tag.is_some())
    }
}

/// Media a rule applies under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaScope {
    All,
    Only(Media),
}

impl MediaScope {
    fn parse(query: &str) -> Option<Self> {
        match query.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "print" | "only print" => Some(Self::Only(Media::Print)),
            "screen" | "only screen" => Some(Self::Only(Media::Screen)),
            _ => None,
        }
    }

    pub fn applies(self, media: Media) -> bool {
        match self {
            Self::All => true,
            Self::Only(m) => m == media,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<(String, String)>,
    pub media: MediaScope,
}

/// Declarations from the `@page` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRule {
    pub size: Option<String>,
    pub margin: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub page: Option<PageRule>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::default();
        let css = strip_comments(css);
        parse_block(&css, MediaScope::All, &mut sheet);
        sheet
    }

    /// Append the rules of another sheet; later rules win ties.
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
        if other.page.is_some() {
            self.page = other.page;
        }
    }

    /// Declarations that apply to `element` under `media`, ordered so that
    /// applying them in sequence yields the cascade result.
    pub fn declarations_for(&self, element: &ElementNode, media: Media) -> Vec<(&str, &str)> {
        let mut matched: Vec<(u32, usize, &Rule)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.media.applies(media))
            .filter_map(|(i, rule)| {
                rule.selectors
                    .iter()
                    .filter(|s| s.matches(element))
                    .map(Selector::specificity)
                    .max()
                    .map(|spec| (spec, i, rule))
            })
            .collect();
        matched.sort_by_key(|(spec, i, _)| (*spec, *i));
        matched
            .into_iter()
            .flat_map(|(_, _, rule)| {
                rule.declarations
                    .iter()
                    .map(|(p, v)| (p.as_str(), v.as_str()))
            })
            .collect()
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` matching the `{` just before `body`.
fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_block(css: &str, media: MediaScope, sheet: &mut Stylesheet) {
    let mut rest = css;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return;
        }
        let Some(open) = rest.find('{') else {
            return;
        };
        let prelude = rest[..open].trim();
        // Statement at-rules (`@import url(..);`) end at `;` before any block.
        if prelude.starts_with('@') {
            if let Some(semi) = prelude.find(';') {
                log::debug!("skipping at-rule `{}`", &prelude[..semi]);
                rest = &rest[semi + 1..];
                continue;
            }
        }
        let body_start = open + 1;
        let Some(close) = matching_brace(&rest[body_start..]) else {
            return;
        };
        let body = &rest[body_start..body_start + close];
        rest = &rest[body_start + close + 1..];

        if let Some(query) = prelude.strip_prefix("@media") {
            match (media, MediaScope::parse(query)) {
                (MediaScope::All, Some(scope)) => parse_block(body, scope, sheet),
                (outer, Some(MediaScope::All)) => parse_block(body, outer, sheet),
                (outer, Some(inner)) if outer == inner => parse_block(body, outer, sheet),
                _ => log::debug!("skipping @media {}", query.trim()),
            }
        } else if prelude.starts_with("@page") {
            let mut page = PageRule::default();
            for (prop, value) in parse_declarations(body) {
                match prop.as_str() {
                    "size" => page.size = Some(value),
                    "margin" => page.margin = Some(value),
                    _ => {}
                }
            }
            sheet.page = Some(page);
        } else if prelude.starts_with('@') {
            log::debug!("skipping at-rule `{prelude}`");
        } else {
            let selectors: Vec<Selector> = prelude
                .split(',')
                .filter_map(|s| {
                    let parsed = Selector::parse(s);
                    if parsed.is_none() {
                        log::debug!("unsupported selector `{}`", s.trim());
                    }
                    parsed
                })
                .collect();
            if !selectors.is_empty() {
                sheet.rules.push(Rule {
                    selectors,
                    declarations: parse_declarations(body),
                    media,
                });
            }
        }
    }
}

/// Split a declaration block into `(property, value)` pairs.
///
/// Semicolons inside parentheses or quotes do not end a declaration, so
/// `url("data:image/png;base64,..")` survives intact. Properties are
/// lowercased; `!important` is dropped.
pub fn parse_declarations(block: &str) -> Vec<(String, String)> {
    let mut decls = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in block.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, ';') if depth <= 0 => {
                push_declaration(&block[start..i], &mut decls);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_declaration(&block[start..], &mut decls);
    decls
}

fn push_declaration(decl: &str, out: &mut Vec<(String, String)>) {
    let Some((prop, value)) = decl.split_once(':') else {
        return;
    };
    let prop = prop.trim().to_ascii_lowercase();
    let value = value.trim();
    let value = value
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value);
    if !prop.is_empty() && !value.is_empty() {
        out.push((prop, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dom::{parse_html, DomNode};

    fn first_element(html: &str) -> ElementNode {
        match parse_html(html).into_iter().next() {
            Some(DomNode::Element(e)) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn selectors() {
        assert_eq!(
            Selector::parse("body.with-top-band"),
            Some(Selector {
                tag: Some("body".into()),
                classes: vec!["with-top-band".into()]
            })
        );
        assert!(Selector::parse("div > p").is_none());
        assert!(Selector::parse("a:hover").is_none());
        assert_eq!(Selector::parse("*").map(|s| s.specificity()), Some(0));
        assert_eq!(Selector::parse(".a.b").map(|s| s.specificity()), Some(20));
    }

    #[test]
    fn media_blocks_scope_rules() {
        let sheet = Stylesheet::parse(
            "/* c */ .band { color: red; }\n\
             @media print { .band { display: none; } tr { break-inside: avoid; } }\n\
             @media screen { body.x { padding-top: 72px; } }",
        );
        assert_eq!(sheet.rules.len(), 4);
        let band = first_element(r#"<div class="band"></div>"#);
        let print = sheet.declarations_for(&band, Media::Print);
        assert_eq!(print, vec![("color", "red"), ("display", "none")]);
        let screen = sheet.declarations_for(&band, Media::Screen);
        assert_eq!(screen, vec![("color", "red")]);
    }

    #[test]
    fn page_rule_and_selector_lists() {
        let sheet = Stylesheet::parse(
            "@page { size: A4 portrait; margin: 0; }\nhtml, body { margin: 0; padding: 0; }",
        );
        assert_eq!(
            sheet.page,
            Some(PageRule {
                size: Some("A4 portrait".into()),
                margin: Some("0".into())
            })
        );
        assert_eq!(sheet.rules[0].selectors.len(), 2);
    }

    #[test]
    fn specificity_orders_declarations() {
        let sheet = Stylesheet::parse(".a { color: blue; } p { color: red; }");
        let p = first_element(r#"<p class="a"></p>"#);
        assert_eq!(
            sheet.declarations_for(&p, Media::Print),
            vec![("color", "red"), ("color", "blue")]
        );
    }

    #[test]
    fn declarations_keep_data_uris() {
        let decls = parse_declarations(
            "background-image:url(\"data:image/png;base64,AA==\");color: #fff !important;",
        );
        assert_eq!(
            decls,
            vec![
                (
                    "background-image".to_string(),
                    "url(\"data:image/png;base64,AA==\")".to_string()
                ),
                ("color".to_string(), "#fff".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_at_rules_skipped() {
        let sheet = Stylesheet::parse(
            "@import url(x.css);\n@font-face { font-family: X; }\n@supports (display: grid) { p { color: red; } }\np { color: blue; }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].1, "blue");
    }
}
