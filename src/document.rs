//! Whole-document assembly: head (stylesheet), body framing and the preview
//! document.
//!
//! User-controlled values never enter the `<style>` element. Fonts, colours
//! and the page margin travel as escaped inline styles on `body` and the page
//! container; the stylesheet only carries values derived from closed enums.

use chrono::NaiveDate;

use crate::components::{render_component, RenderContext};
use crate::markup::{attr, escape, Classes, InlineStyle};
use crate::pagination::{footer_segments, FooterSegment};
use crate::schema::{PageConfig, Report, RepeatMode};
use crate::settings::Settings;

/// Values substituted for `{{page}}` / `{{pages}}` in the preview footer band.
pub const PREVIEW_PAGE: &str = "1";
pub const PREVIEW_PAGES: &str = "1";

/// `@page` rule for the configured paper.
pub fn page_css(page: &PageConfig) -> String {
    format!(
        "@page {{ size: {} {}; margin: 0; }}",
        page.size.as_str(),
        page.orientation.as_str()
    )
}

fn stylesheet(page: &PageConfig) -> String {
    [
        page_css(page).as_str(),
        "html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }",
        "html, body { margin: 0; padding: 0; }",
        ".report-band { position: fixed; left: 0; right: 0; z-index: 10; background-color: #ffffff; }",
        ".report-band-top { top: 0; }",
        ".report-band-bottom { bottom: 0; }",
        "@media screen { body.with-top-band { padding-top: 72px; } body.with-bottom-band { padding-bottom: 48px; } }",
        "@media print { .report-band { display: none; } .pagebreak { break-after: page; } tr { break-inside: avoid; } }",
    ]
    .join("\n")
}

/// Document head: metadata, utility stylesheet link and the page stylesheet.
pub fn render_head(report: &Report, settings: &Settings) -> String {
    let mut out = String::from(
        "<meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
    );
    out.push_str(&format!("<title>{}</title>", escape(&report.report_name)));
    if !report.company.is_empty() {
        out.push_str(&format!(
            "<meta name=\"author\"{}>",
            attr("content", Some(&report.company))
        ));
    }
    out.push_str(&format!(
        "<link rel=\"stylesheet\"{}>",
        attr("href", Some(&settings.utility_css_href))
    ));
    out.push_str("<style>\n");
    out.push_str(&stylesheet(&report.configs.page));
    out.push_str("\n</style>");
    out
}

/// Logo, then the header image or the report name.
fn header_content(report: &Report) -> String {
    let mut out = String::new();
    if let Some(logo) = &report.assets.logo {
        out.push_str(&format!(
            "<img{}{} class=\"h-10 w-auto\" style=\"height:40px;\">",
            attr("src", Some(logo)),
            attr(
                "alt",
                Some(if report.company.is_empty() {
                    "logo"
                } else {
                    report.company.as_str()
                })
            ),
        ));
    }
    match &report.assets.header_image {
        Some(image) => out.push_str(&format!(
            "<img{} alt=\"\" class=\"h-10 w-auto\" style=\"height:40px;\">",
            attr("src", Some(image)),
        )),
        None => out.push_str(&format!(
            "<span class=\"text-lg font-semibold\"{}>{}</span>",
            InlineStyle::new().set("color", &report.colors.primary).attr(),
            escape(&report.report_name),
        )),
    }
    out
}

fn footer_preview_text(template: &str) -> String {
    footer_segments(template)
        .into_iter()
        .map(|segment| match segment {
            FooterSegment::Text(text) => escape(text),
            FooterSegment::PageNumber => PREVIEW_PAGE.to_string(),
            FooterSegment::TotalPages => PREVIEW_PAGES.to_string(),
        })
        .collect()
}

/// Document body: header framing, the components in order, footer band.
pub fn render_body(report: &Report, today: NaiveDate) -> String {
    let configs = &report.configs;
    let header_band = configs.header.is_running();
    let inline_header = configs.header.show && configs.header.repeat == RepeatMode::First;
    let footer_band = configs.footer.show;

    let mut body_classes = Classes::base("antialiased");
    if header_band {
        body_classes.push("with-top-band");
    }
    if footer_band {
        body_classes.push("with-bottom-band");
    }
    let background = report
        .assets
        .background_image
        .as_ref()
        .map(|src| format!("url(\"{src}\")"));
    let body_style = InlineStyle::new()
        .set("font-family", &configs.font.family)
        .set("font-size", configs.font.size_css())
        .set("line-height", configs.font.line_height_css())
        .set("color", &report.colors.text)
        .set("background-color", "#ffffff")
        .set_if(
            background.is_some(),
            "background-image",
            background.clone().unwrap_or_default(),
        )
        .set_if(background.is_some(), "background-size", "cover");

    let mut out = format!("<body{}{}>", body_classes.attr(), body_style.attr());

    if header_band {
        out.push_str(&format!(
            "<header{}{}>{}</header>",
            Classes::base("report-band report-band-top flex items-center gap-3 px-8 py-3 border-b")
                .with(configs.header.align.justify_class())
                .attr(),
            InlineStyle::new()
                .set("border-color", &report.colors.border)
                .attr(),
            header_content(report),
        ));
    }

    out.push_str(&format!(
        "<main class=\"report-page\"{}>",
        InlineStyle::new().set("padding", &configs.page.margin).attr()
    ));
    if inline_header {
        out.push_str(&format!(
            "<header{}{}>{}</header>",
            Classes::base("report-header flex items-center gap-3 mb-6 pb-3 border-b")
                .with(configs.header.align.justify_class())
                .attr(),
            InlineStyle::new()
                .set("border-color", &report.colors.border)
                .attr(),
            header_content(report),
        ));
    }
    let ctx = RenderContext::new(report, today);
    for component in &report.components {
        out.push_str(&render_component(component, &ctx));
    }
    out.push_str("</main>");

    if footer_band {
        out.push_str(&format!(
            "<footer{}{}>",
            Classes::base("report-band report-band-bottom flex items-center gap-3 px-8 py-2 border-t text-xs")
                .with(configs.footer.align.justify_class())
                .attr(),
            InlineStyle::new()
                .set("border-color", &report.colors.border)
                .set("color", &report.colors.muted)
                .attr(),
        ));
        if let Some(image) = &report.assets.footer_image {
            out.push_str(&format!(
                "<img{} alt=\"\" style=\"height:20px;\">",
                attr("src", Some(image))
            ));
        }
        out.push_str(&format!(
            "<span>{}</span></footer>",
            footer_preview_text(&configs.footer.text)
        ));
    }

    out.push_str("</body>");
    out
}

/// Complete preview document. Byte-identical for identical input.
pub fn render_document(report: &Report, settings: &Settings, today: NaiveDate) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head>{}</head>{}</html>\n",
        render_head(report, settings),
        render_body(report, today)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn doc(value: serde_json::Value) -> String {
        let report = validate(&value).unwrap();
        render_document(&report, &Settings::default(), today())
    }

    #[test]
    fn minimal_report_shows_escaped_name() {
        let html = doc(json!({
            "reportName": "R&D <Review>",
            "components": [{ "type": "para", "props": { "text": "hello" } }]
        }));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("R&amp;D &lt;Review&gt;"));
        assert!(html.contains("hello"));
        assert!(html.contains("report-band-top"));
    }

    #[test]
    fn first_page_header_is_inline() {
        let html = doc(json!({
            "reportName": "Inline",
            "configs": { "header": { "repeat": "first" } },
            "components": [{ "type": "para", "props": { "text": "body" } }]
        }));
        assert!(!html.contains("<header class=\"report-band"));
        assert!(html.contains("<body class=\"antialiased with-bottom-band\""));
        let header = html.find("report-header").unwrap();
        let para = html.find("body</p>").unwrap();
        assert!(header < para);
    }

    #[test]
    fn hidden_header_and_footer() {
        let html = doc(json!({
            "reportName": "Nothing",
            "configs": { "header": { "show": false }, "footer": { "show": false } },
            "components": [{ "type": "divider" }]
        }));
        assert!(!html.contains("<header"));
        assert!(!html.contains("<footer"));
        assert!(!html.contains(">Nothing</span>"));
    }

    #[test]
    fn preview_footer_substitutes_counters() {
        let html = doc(json!({
            "configs": { "footer": { "text": "Page {{page}} of {{pages}} <x>" } },
            "components": [{ "type": "divider" }]
        }));
        assert!(html.contains("<span>Page 1 of 1 &lt;x&gt;</span>"));
    }

    #[test]
    fn stylesheet_reflects_page_geometry() {
        let html = doc(json!({
            "configs": { "page": { "size": "Letter", "orientation": "landscape" } },
            "components": [{ "type": "divider" }]
        }));
        assert!(html.contains("@page { size: Letter landscape; margin: 0; }"));
        assert!(html.contains("@media print { .report-band { display: none; }"));
    }

    #[test]
    fn user_values_stay_out_of_style_element() {
        let html = doc(json!({
            "configs": { "font": { "family": "</style><script>x</script>" }, "page": { "margin": "1in" } },
            "components": [{ "type": "divider" }]
        }));
        assert!(!html.contains("<script>"));
        assert!(html.contains("padding:1in;"));
    }

    #[test]
    fn components_in_input_order() {
        let html = doc(json!({
            "components": [
                { "type": "subheader", "props": { "text": "first" } },
                { "type": "para", "props": { "text": "second" } },
                { "type": "footerText", "props": { "text": "third" } }
            ]
        }));
        let a = html.find("first").unwrap();
        let b = html.find("second").unwrap();
        let c = html.find("third").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn background_image_is_inline_style() {
        let html = doc(json!({
            "assets": { "backgroundImage": "data:image/png;base64,AA==" },
            "components": [{ "type": "divider" }]
        }));
        assert!(html.contains("background-image:url(&quot;data:image/png;base64,AA==&quot;);"));
    }

    #[test]
    fn output_is_deterministic() {
        let value = json!({ "components": [{ "type": "date" }, { "type": "table", "props": { "rows": [["a"], ["b"]] } }] });
        assert_eq!(doc(value.clone()), doc(value));
    }
}
