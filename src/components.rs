//! Component renderer – maps one validated [`Component`] to an HTML fragment.
//!
//! Rendering is pure: the same component, configuration, palette and date
//! always produce the same bytes. Structural classes come first on every
//! element, followed by the component's override tokens for that slot
//! ([`Classes`]). Colours from the palette travel as inline styles so the
//! output does not depend on a themed stylesheet.

use chrono::NaiveDate;

use crate::markup::{attr, escape, Classes, InlineStyle};
use crate::schema::*;

/// Output format for dates (`05 Mar 2024`).
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Background applied to alternate table rows when striping is on.
pub const STRIPE_BACKGROUND: &str = "#f9fafb";
/// Background of table header cells.
pub const HEADER_CELL_BACKGROUND: &str = "#f3f4f6";

/// Everything a component may consult besides its own props.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub configs: &'a Configs,
    pub colors: &'a Palette,
    /// Date shown by `date` components without an explicit value.
    pub today: NaiveDate,
}

impl<'a> RenderContext<'a> {
    pub fn new(report: &'a Report, today: NaiveDate) -> Self {
        Self {
            configs: &report.configs,
            colors: &report.colors,
            today,
        }
    }
}

/// Render one component.
pub fn render_component(component: &Component, ctx: &RenderContext<'_>) -> String {
    let id = attr("id", component.id.as_deref());
    let kind = component.kind.type_name();
    let c = component;
    match &component.kind {
        ComponentKind::Header { title, subtitle } => {
            let mut out = format!(
                "<section{id} data-component=\"{kind}\"{}{}>",
                Classes::base("mb-6 pb-3 border-b").with(c.slot("wrapper")).attr(),
                InlineStyle::new()
                    .set("border-color", &ctx.colors.border)
                    .attr(),
            );
            out.push_str(&format!(
                "<h1{}{}>{}</h1>",
                Classes::base("text-2xl font-bold").with(c.slot("title")).attr(),
                InlineStyle::new().set("color", &ctx.colors.primary).attr(),
                escape(title),
            ));
            if let Some(subtitle) = subtitle {
                out.push_str(&format!(
                    "<p{}{}>{}</p>",
                    Classes::base("text-sm mt-1").with(c.slot("subtitle")).attr(),
                    InlineStyle::new().set("color", &ctx.colors.muted).attr(),
                    escape(subtitle),
                ));
            }
            out.push_str("</section>");
            out
        }
        ComponentKind::Subheader { text } => format!(
            "<h2{id} data-component=\"{kind}\"{}{}>{}</h2>",
            Classes::base("text-lg font-semibold mt-4 mb-2")
                .with(c.slot("text"))
                .attr(),
            InlineStyle::new().set("color", &ctx.colors.primary).attr(),
            escape(text),
        ),
        ComponentKind::Date { value, label } => {
            let align = ctx.configs.date.align.text_class();
            let mut out = format!(
                "<div{id} data-component=\"{kind}\"{}{}>",
                Classes::base("mb-4 text-sm")
                    .with(align)
                    .with(c.slot("wrapper"))
                    .attr(),
                InlineStyle::new().set("color", &ctx.colors.muted).attr(),
            );
            if let Some(label) = label {
                out.push_str(&format!(
                    "<span{}>{}</span> ",
                    Classes::base("font-semibold").with(c.slot("label")).attr(),
                    escape(label),
                ));
            }
            out.push_str(&format!(
                "<span{}>{}</span></div>",
                Classes::base("").with(c.slot("value")).attr(),
                escape(&date_text(value.as_deref(), ctx.today)),
            ));
            out
        }
        ComponentKind::Para { text } => format!(
            "<p{id} data-component=\"{kind}\"{}>{}</p>",
            Classes::base("mb-3 leading-relaxed")
                .with(c.slot("text"))
                .attr(),
            multiline(text),
        ),
        ComponentKind::Divider => format!(
            "<hr{id} data-component=\"{kind}\"{}{}>",
            Classes::base("my-4 border-t").with(c.slot("wrapper")).attr(),
            InlineStyle::new()
                .set("border-top", format!("1px solid {}", ctx.colors.border))
                .attr(),
        ),
        ComponentKind::Spacer { size } => format!(
            "<div{id} data-component=\"{kind}\"{}{} aria-hidden=\"true\"></div>",
            Classes::base("").with(c.slot("wrapper")).attr(),
            InlineStyle::new()
                .set("height", format!("{}px", size.height_px()))
                .attr(),
        ),
        ComponentKind::Pagebreak => format!(
            "<div{id} data-component=\"{kind}\"{}{}></div>",
            Classes::base("pagebreak").with(c.slot("wrapper")).attr(),
            InlineStyle::new()
                .set("break-after", "page")
                .set("page-break-after", "always")
                .attr(),
        ),
        ComponentKind::Signature { lines, label } => render_signature(c, *lines, label, ctx),
        ComponentKind::FooterText { text } => format!(
            "<p{id} data-component=\"{kind}\"{}{}>{}</p>",
            Classes::base("mt-6 text-xs")
                .with(ctx.configs.footer.align.text_class())
                .with(c.slot("text"))
                .attr(),
            InlineStyle::new().set("color", &ctx.colors.muted).attr(),
            multiline(text),
        ),
        ComponentKind::Table(props) => render_table(c, props, ctx),
        ComponentKind::Image(props) => render_image(c, props, ctx),
    }
}

/// Text shown for a date component.
///
/// A missing or blank value means today. Otherwise the leading ten characters
/// are read as `YYYY-MM-DD`; anything unparseable is returned verbatim.
pub fn date_text(value: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return today.format(DATE_FORMAT).to_string();
    };
    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Escape text and turn newlines into line breaks.
fn multiline(text: &str) -> String {
    escape(text).replace('\n', "<br>")
}

fn render_signature(
    c: &Component,
    lines: u8,
    label: &Option<String>,
    ctx: &RenderContext<'_>,
) -> String {
    let caption = label.as_deref().unwrap_or("Signature");
    let mut out = format!(
        "<div{} data-component=\"signature\"{}>",
        attr("id", c.id.as_deref()),
        Classes::base("mt-10 flex gap-8").with(c.slot("wrapper")).attr(),
    );
    for _ in 0..lines {
        out.push_str(&format!(
            "<div{}><div{}{}></div><p{}{}>{}</p></div>",
            Classes::base("flex-1 pt-10").with(c.slot("line")).attr(),
            Classes::base("border-t").attr(),
            InlineStyle::new()
                .set("border-top", format!("1px solid {}", ctx.colors.text))
                .attr(),
            Classes::base("text-xs mt-1").with(c.slot("label")).attr(),
            InlineStyle::new().set("color", &ctx.colors.muted).attr(),
            escape(caption),
        ));
    }
    out.push_str("</div>");
    out
}

fn render_table(c: &Component, props: &TableProps, ctx: &RenderContext<'_>) -> String {
    let table_cfg = &ctx.configs.table;
    let cell_padding = if table_cfg.compact { "px-2 py-1" } else { "px-3 py-2" };
    let border = if table_cfg.border.trim() == "none" {
        None
    } else {
        Some(format!("1px {} {}", table_cfg.border.trim(), ctx.colors.border))
    };

    let mut out = format!(
        "<div{} data-component=\"table\"{}>",
        attr("id", c.id.as_deref()),
        Classes::base("mb-6").with(c.slot("wrapper")).attr(),
    );
    if let Some(title) = &props.title {
        out.push_str(&format!(
            "<h3{}{}>{}</h3>",
            Classes::base("text-base font-semibold mb-2")
                .with(c.slot("title"))
                .attr(),
            InlineStyle::new().set("color", &ctx.colors.primary).attr(),
            escape(title),
        ));
    }
    out.push_str(&format!(
        "<table{}>",
        Classes::base("w-full text-sm border-collapse")
            .with(c.slot("table"))
            .attr()
    ));

    if !props.headers.is_empty() {
        out.push_str("<thead><tr>");
        for h in &props.headers {
            out.push_str(&format!(
                "<th{}{}>{}</th>",
                Classes::base("text-left font-semibold")
                    .with(cell_padding)
                    .with(c.slot("th"))
                    .attr(),
                InlineStyle::new()
                    .set("background-color", HEADER_CELL_BACKGROUND)
                    .set_if(border.is_some(), "border", border.clone().unwrap_or_default())
                    .attr(),
                escape(h),
            ));
        }
        out.push_str("</tr></thead>");
    }

    out.push_str("<tbody>");
    for (i, row) in props.rows.iter().enumerate() {
        let striped = table_cfg.striped && i % 2 == 1;
        out.push_str(&format!(
            "<tr{}{}>",
            Classes::base(if striped { "striped" } else { "" })
                .with(c.slot("tr"))
                .attr(),
            InlineStyle::new()
                .set_if(striped, "background-color", STRIPE_BACKGROUND)
                .attr(),
        ));
        for cell in row {
            out.push_str(&format!(
                "<td{}{}>{}</td>",
                Classes::base(cell_padding).with(c.slot("td")).attr(),
                InlineStyle::new()
                    .set_if(border.is_some(), "border", border.clone().unwrap_or_default())
                    .attr(),
                escape(&cell.display()),
            ));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");

    if let Some(notes) = &props.notes {
        out.push_str(&format!(
            "<p{}{}>{}</p>",
            Classes::base("text-xs mt-2").with(c.slot("notes")).attr(),
            InlineStyle::new().set("color", &ctx.colors.muted).attr(),
            multiline(notes),
        ));
    }
    out.push_str("</div>");
    out
}

fn render_image(c: &Component, props: &ImageProps, ctx: &RenderContext<'_>) -> String {
    let mut out = format!(
        "<figure{} data-component=\"image\"{}>",
        attr("id", c.id.as_deref()),
        Classes::base("mb-4").with(c.slot("wrapper")).attr(),
    );
    match &props.url {
        Some(url) => out.push_str(&format!(
            "<img{}{}{}{}>",
            attr("src", Some(url)),
            attr("alt", Some(props.alt.as_deref().unwrap_or(""))),
            Classes::base("max-w-full").with(c.slot("image")).attr(),
            InlineStyle::new()
                .set_if(props.width.is_some(), "width", px(props.width))
                .set_if(props.height.is_some(), "height", px(props.height))
                .attr(),
        )),
        None => {
            if let Some(alt) = &props.alt {
                out.push_str(&format!(
                    "<p{}{}>{}</p>",
                    Classes::base("text-xs italic").with(c.slot("image")).attr(),
                    InlineStyle::new().set("color", &ctx.colors.muted).attr(),
                    escape(alt),
                ));
            }
        }
    }
    if let Some(caption) = &props.caption {
        out.push_str(&format!(
            "<figcaption{}{}>{}</figcaption>",
            Classes::base("text-xs mt-1").with(c.slot("caption")).attr(),
            InlineStyle::new().set("color", &ctx.colors.muted).attr(),
            escape(caption),
        ));
    }
    out.push_str("</figure>");
    out
}

fn px(v: Option<f64>) -> String {
    v.map(|n| format!("{n}px")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn render_one(component: Value) -> String {
        render_with(json!({}), component)
    }

    fn render_with(configs: Value, component: Value) -> String {
        let report = validate(&json!({ "configs": configs, "components": [component] })).unwrap();
        let ctx = RenderContext::new(&report, today());
        render_component(&report.components[0], &ctx)
    }

    #[test]
    fn paragraph_text_is_escaped() {
        let html = render_one(json!({ "type": "para", "props": { "text": "<script>alert('x')</script>" } }));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn override_tokens_follow_base() {
        let html = render_one(json!({
            "type": "header",
            "props": { "title": "T" },
            "style": { "title": "text-4xl italic" }
        }));
        assert!(html.contains(r#"<h1 class="text-2xl font-bold text-4xl italic""#), "{html}");
    }

    #[test]
    fn striped_rows_alternate() {
        let html = render_one(json!({
            "type": "table",
            "props": { "headers": ["k", "v", "n"], "rows": [["a", 1, null], ["b", 2, null]] }
        }));
        assert_eq!(html.matches(STRIPE_BACKGROUND).count(), 1);
        let a = html.find(">a<").unwrap();
        let b = html.find(">b<").unwrap();
        let stripe = html.find(STRIPE_BACKGROUND).unwrap();
        assert!(a < stripe && stripe < b, "second row should be the striped one");
        assert!(!html.contains("null"));
        assert_eq!(html.matches("<td").count(), 6);
        assert!(html.contains("<td class=\"px-3 py-2\"") && html.contains("></td>"));
    }

    #[test]
    fn striping_disabled() {
        let html = render_with(
            json!({ "table": { "striped": false, "compact": true, "border": "none" } }),
            json!({ "type": "table", "props": { "rows": [["a"], ["b"], ["c"]] } }),
        );
        assert!(!html.contains(STRIPE_BACKGROUND));
        assert!(html.contains("px-2 py-1"));
        assert!(!html.contains("border:"));
    }

    #[test]
    fn table_without_headers_has_no_thead() {
        let html = render_one(json!({ "type": "table", "props": { "rows": [["x"]] } }));
        assert!(!html.contains("<thead>"));
        let html = render_one(json!({ "type": "table", "props": { "headers": ["H"], "title": "T & C", "notes": "n" } }));
        assert!(html.contains("<thead>"));
        assert!(html.contains("T &amp; C"));
    }

    #[test]
    fn date_defaults_to_today() {
        assert_eq!(date_text(None, today()), "05 Mar 2024");
        assert_eq!(date_text(Some("  "), today()), "05 Mar 2024");
    }

    #[test]
    fn date_reads_leading_ten_chars() {
        assert_eq!(date_text(Some("2023-12-01T10:00:00Z"), today()), "01 Dec 2023");
        assert_eq!(date_text(Some("2023-12-01"), today()), "01 Dec 2023");
    }

    #[test]
    fn unparseable_date_shown_verbatim_and_escaped() {
        assert_eq!(date_text(Some("next <b>week</b>"), today()), "next <b>week</b>");
        let html = render_one(json!({ "type": "date", "props": { "value": "next <b>week</b>", "label": "Due" } }));
        assert!(html.contains("next &lt;b&gt;week&lt;/b&gt;"));
        assert!(html.contains("text-right"));
        assert!(html.contains(">Due</span>"));
    }

    #[test]
    fn spacer_heights() {
        let md = render_one(json!({ "type": "spacer" }));
        assert!(md.contains("height:16px;"));
        let xl = render_one(json!({ "type": "spacer", "props": { "size": "xl" } }));
        assert!(xl.contains("height:64px;"));
    }

    #[test]
    fn signature_line_count() {
        let html = render_one(json!({ "type": "signature", "props": { "lines": 3, "label": "Approved by" } }));
        assert_eq!(html.matches("Approved by").count(), 3);
        assert_eq!(html.matches("flex-1 pt-10").count(), 3);
    }

    #[test]
    fn image_without_url_degrades_to_alt_text() {
        let report = validate(&json!({
            "components": [{ "type": "image", "props": { "url": "https://x/y.png", "alt": "Chart", "caption": "Fig 1" } }]
        }))
        .unwrap();
        let mut component = report.components[0].clone();
        if let ComponentKind::Image(p) = &mut component.kind {
            p.url = None;
        }
        let ctx = RenderContext::new(&report, today());
        let html = render_component(&component, &ctx);
        assert!(!html.contains("<img"));
        assert!(html.contains("Chart"));
        assert!(html.contains("<figcaption"));
    }

    #[test]
    fn image_dimensions_inline() {
        let html = render_one(json!({ "type": "image", "props": { "url": "data:image/png;base64,AA==", "width": 120, "height": 40.5 } }));
        assert!(html.contains("width:120px;height:40.5px;"), "{html}");
    }

    #[test]
    fn component_id_is_attribute() {
        let html = render_one(json!({ "type": "pagebreak", "id": "x\"y" }));
        assert!(html.starts_with("<div id=\"x&quot;y\" data-component=\"pagebreak\""));
        assert!(html.contains("page-break-after:always"));
    }
}
