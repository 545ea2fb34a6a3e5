//! Markup primitives shared by the document renderer and the pagination
//! fragment builder.
//!
//! [`escape`] is the only path by which user-supplied text reaches markup.
//! Renderers never interpolate raw strings into HTML; they go through
//! [`escape`] directly or through [`Classes`] / [`attr`], which call it.

use std::fmt::Write as _;

/// HTML-escape `&`, `<`, `>`, `"` and `'`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// ` name="value"` with the value escaped, or nothing when `value` is `None`.
pub fn attr(name: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!(" {name}=\"{}\"", escape(v)),
        None => String::new(),
    }
}

/// Class list for one element: a fixed structural base followed by the
/// component's override tokens for the matching slot. Overrides are appended,
/// never substituted, so base tokens always survive.
#[derive(Debug, Clone, Default)]
pub struct Classes {
    tokens: Vec<String>,
}

impl Classes {
    pub fn base(base: &str) -> Self {
        let mut c = Self::default();
        c.push(base);
        c
    }

    /// Append whitespace-separated tokens. Duplicates are kept; ordering is
    /// the caller's.
    pub fn push(&mut self, tokens: &str) -> &mut Self {
        self.tokens
            .extend(tokens.split_whitespace().map(str::to_string));
        self
    }

    pub fn with(mut self, tokens: &str) -> Self {
        self.push(tokens);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// ` class="..."`, or nothing for an empty list.
    pub fn attr(&self) -> String {
        if self.tokens.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape(&self.tokens.join(" ")))
        }
    }
}

/// Inline `style` declarations. Values are escaped on output.
#[derive(Debug, Clone, Default)]
pub struct InlineStyle {
    decls: Vec<(&'static str, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, prop: &'static str, value: impl Into<String>) -> Self {
        self.decls.push((prop, value.into()));
        self
    }

    pub fn set_if(self, cond: bool, prop: &'static str, value: impl Into<String>) -> Self {
        if cond {
            self.set(prop, value)
        } else {
            self
        }
    }

    /// ` style="..."`, or nothing when no declarations were set.
    pub fn attr(&self) -> String {
        if self.decls.is_empty() {
            return String::new();
        }
        let mut css = String::new();
        for (prop, value) in &self.decls {
            let _ = write!(css, "{prop}:{value};");
        }
        format!(" style=\"{}\"", escape(&css))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn script_is_inert() {
        let out = escape("<script>alert(1)</script>");
        assert!(!out.contains("<script"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn overrides_append_to_base() {
        let c = Classes::base("text-lg font-bold").with("text-red-500  italic");
        assert_eq!(c.attr(), r#" class="text-lg font-bold text-red-500 italic""#);
    }

    #[test]
    fn override_cannot_break_out_of_attribute() {
        let c = Classes::base("p-2").with(r#"x" onclick="evil()"#);
        let attr = c.attr();
        assert!(!attr.contains(r#"" onclick"#));
        assert!(attr.contains("&quot;"));
    }

    #[test]
    fn inline_style_escaped() {
        let s = InlineStyle::new()
            .set("color", "#111")
            .set_if(false, "width", "10px")
            .set("font-family", r#""Open Sans", sans-serif"#);
        assert_eq!(
            s.attr(),
            r#" style="color:#111;font-family:&quot;Open Sans&quot;, sans-serif;""#
        );
        assert_eq!(InlineStyle::new().attr(), "");
    }

    #[test]
    fn attr_helper() {
        assert_eq!(attr("id", Some("a<b")), r#" id="a&lt;b""#);
        assert_eq!(attr("id", None), "");
    }
}
