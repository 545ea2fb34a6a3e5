//! Running header and footer fragments.
//!
//! The print engine evaluates these once per physical page, in an isolated
//! context that sees none of the document's stylesheet. Every style they need
//! is therefore inline. Elements carrying the classes [`PAGE_NUMBER_CLASS`]
//! and [`TOTAL_PAGES_CLASS`] are filled in by the engine with the current page
//! and the page count.

use crate::markup::{attr, escape, InlineStyle};
use crate::schema::{Report, PAGES_PLACEHOLDER, PAGE_PLACEHOLDER};

/// Markup used when a band is not shown.
pub const EMPTY_FRAGMENT: &str = "<span></span>";

pub const PAGE_NUMBER_CLASS: &str = "pageNumber";
pub const TOTAL_PAGES_CLASS: &str = "totalPages";

const HEADER_FONT_SIZE: &str = "12px";
const FOOTER_FONT_SIZE: &str = "10px";

/// A piece of the footer template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterSegment<'a> {
    Text(&'a str),
    PageNumber,
    TotalPages,
}

/// Split a footer template around its page placeholders.
pub fn footer_segments(template: &str) -> Vec<FooterSegment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;
    loop {
        let next = [
            (rest.find(PAGE_PLACEHOLDER), PAGE_PLACEHOLDER, FooterSegment::PageNumber),
            (rest.find(PAGES_PLACEHOLDER), PAGES_PLACEHOLDER, FooterSegment::TotalPages),
        ]
        .into_iter()
        .filter_map(|(pos, token, seg)| pos.map(|p| (p, token, seg)))
        .min_by_key(|(p, _, _)| *p);

        match next {
            Some((pos, token, seg)) => {
                if pos > 0 {
                    segments.push(FooterSegment::Text(&rest[..pos]));
                }
                segments.push(seg);
                rest = &rest[pos + token.len()..];
            }
            None => {
                if !rest.is_empty() {
                    segments.push(FooterSegment::Text(rest));
                }
                return segments;
            }
        }
    }
}

/// Footer text with counters as engine markers.
///
/// Whitespace becomes `&nbsp;` and every literal word is wrapped in its own
/// `white-space:pre` span, so "Page 3 of 9" cannot collapse to "Page3of9"
/// when the engine drops spaces next to the injected numbers.
pub fn footer_text_markup(template: &str) -> String {
    let mut out = String::new();
    for segment in footer_segments(template) {
        match segment {
            FooterSegment::PageNumber => {
                out.push_str(&format!("<span class=\"{PAGE_NUMBER_CLASS}\"></span>"))
            }
            FooterSegment::TotalPages => {
                out.push_str(&format!("<span class=\"{TOTAL_PAGES_CLASS}\"></span>"))
            }
            FooterSegment::Text(text) => push_protected_text(&mut out, text),
        }
    }
    out
}

fn push_protected_text(out: &mut String, text: &str) {
    let mut word = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            flush_word(out, &mut word);
            out.push_str("&nbsp;");
        } else {
            word.push(c);
        }
    }
    flush_word(out, &mut word);
}

fn flush_word(out: &mut String, word: &mut String) {
    if !word.is_empty() {
        out.push_str("<span style=\"white-space:pre;\">");
        out.push_str(&escape(word));
        out.push_str("</span>");
        word.clear();
    }
}

/// Header fragment: logo, then the header image or the report name.
///
/// Empty when the header is hidden, and when it repeats only on the first
/// page (the document body already carries it inline).
pub fn header_fragment(report: &Report) -> String {
    let header = &report.configs.header;
    if !header.is_running() {
        return EMPTY_FRAGMENT.to_string();
    }
    let margin = &report.configs.page.margin;
    let mut out = format!(
        "<div{}>",
        InlineStyle::new()
            .set("width", "100%")
            .set("box-sizing", "border-box")
            .set("display", "flex")
            .set("align-items", "center")
            .set("justify-content", header.align.justify())
            .set("gap", "12px")
            .set("padding", format!("8px {margin} 6px {margin}"))
            .set("border-bottom", format!("1px solid {}", report.colors.border))
            .set("font-family", &report.configs.font.family)
            .set("font-size", HEADER_FONT_SIZE)
            .set("color", &report.colors.text)
            .set("-webkit-print-color-adjust", "exact")
            .attr()
    );
    if let Some(logo) = &report.assets.logo {
        out.push_str(&band_image(logo, "32px"));
    }
    match &report.assets.header_image {
        Some(image) => out.push_str(&band_image(image, "32px")),
        None => out.push_str(&format!(
            "<span{}>{}</span>",
            InlineStyle::new()
                .set("font-weight", "600")
                .set("font-size", "14px")
                .set("color", &report.colors.primary)
                .attr(),
            escape(&report.report_name),
        )),
    }
    out.push_str("</div>");
    out
}

/// Footer fragment: optional footer image, then the footer text with live
/// page counters.
pub fn footer_fragment(report: &Report) -> String {
    let footer = &report.configs.footer;
    if !footer.show {
        return EMPTY_FRAGMENT.to_string();
    }
    let margin = &report.configs.page.margin;
    let mut out = format!(
        "<div{}>",
        InlineStyle::new()
            .set("width", "100%")
            .set("box-sizing", "border-box")
            .set("display", "flex")
            .set("align-items", "center")
            .set("justify-content", footer.align.justify())
            .set("gap", "8px")
            .set("padding", format!("6px {margin} 8px {margin}"))
            .set("border-top", format!("1px solid {}", report.colors.border))
            .set("font-family", &report.configs.font.family)
            .set("font-size", FOOTER_FONT_SIZE)
            .set("color", &report.colors.muted)
            .set("-webkit-print-color-adjust", "exact")
            .attr()
    );
    if let Some(image) = &report.assets.footer_image {
        out.push_str(&band_image(image, "20px"));
    }
    out.push_str(&format!(
        "<span style=\"white-space:nowrap;\">{}</span></div>",
        footer_text_markup(&footer.text)
    ));
    out
}

fn band_image(src: &str, height: &str) -> String {
    format!(
        "<img{}{}{}>",
        attr("src", Some(src)),
        attr("alt", Some("")),
        InlineStyle::new()
            .set("height", height)
            .set("width", "auto")
            .attr(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::{json, Value};

    fn report(extra: Value) -> Report {
        let mut doc = json!({ "components": [{ "type": "para", "props": { "text": "x" } }] });
        if let (Some(obj), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        validate(&doc).unwrap()
    }

    #[test]
    fn default_footer_markers_and_protected_words() {
        let markup = footer_text_markup("Page {{page}} of {{pages}}");
        assert_eq!(
            markup,
            "<span style=\"white-space:pre;\">Page</span>&nbsp;\
             <span class=\"pageNumber\"></span>&nbsp;\
             <span style=\"white-space:pre;\">of</span>&nbsp;\
             <span class=\"totalPages\"></span>"
        );
        assert_eq!(markup.matches("class=\"pageNumber\"").count(), 1);
        assert_eq!(markup.matches("class=\"totalPages\"").count(), 1);
    }

    #[test]
    fn segments_in_order() {
        assert_eq!(
            footer_segments("{{pages}}/{{page}}"),
            vec![
                FooterSegment::TotalPages,
                FooterSegment::Text("/"),
                FooterSegment::PageNumber
            ]
        );
        assert!(footer_segments("").is_empty());
        assert_eq!(footer_segments("{{page"), vec![FooterSegment::Text("{{page")]);
    }

    #[test]
    fn footer_text_is_escaped() {
        let markup = footer_text_markup("<b>Confidential</b> & co");
        assert!(markup.contains("&lt;b&gt;Confidential&lt;/b&gt;"));
        assert!(markup.contains("&amp;"));
        assert!(!markup.contains("<b>"));
    }

    #[test]
    fn hidden_bands_are_placeholders() {
        let r = report(json!({ "configs": { "header": { "show": false }, "footer": { "show": false } } }));
        assert_eq!(header_fragment(&r), EMPTY_FRAGMENT);
        assert_eq!(footer_fragment(&r), EMPTY_FRAGMENT);
    }

    #[test]
    fn first_page_header_is_not_running() {
        let r = report(json!({ "configs": { "header": { "repeat": "first" } } }));
        assert_eq!(header_fragment(&r), EMPTY_FRAGMENT);
    }

    #[test]
    fn header_falls_back_to_report_name() {
        let r = report(json!({ "reportName": "Q1 <Audit>" }));
        let html = header_fragment(&r);
        assert!(html.contains("Q1 &lt;Audit&gt;"));
        assert!(html.contains("justify-content:flex-start;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn header_image_replaces_name() {
        let r = report(json!({
            "reportName": "Audit",
            "configs": { "header": { "align": "right" } },
            "assets": { "logo": "data:image/png;base64,AA==", "headerImage": "data:image/png;base64,AQ==" }
        }));
        let html = header_fragment(&r);
        assert!(!html.contains("Audit"));
        assert_eq!(html.matches("<img").count(), 2);
        assert!(html.find("AA==").unwrap() < html.find("AQ==").unwrap());
        assert!(html.contains("justify-content:flex-end;"));
    }

    #[test]
    fn fragments_are_self_contained() {
        let r = report(json!({ "assets": { "footerImage": "data:image/png;base64,AA==" } }));
        let html = footer_fragment(&r);
        assert!(!html.contains("class=\"text-"));
        assert!(html.contains("font-size:10px;"));
        assert!(html.contains("font-family:Helvetica, Arial, sans-serif;"));
        assert!(html.find("<img").unwrap() < html.find("pageNumber").unwrap());
    }
}
