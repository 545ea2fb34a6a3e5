//! Pagination – splits the laid-out document flow into pages and stamps the
//! header and footer bands on each one.
//!
//! Handles:
//! - page geometry from the print options, with `@page` margins winning
//! - forced breaks (`break-before` / `break-after`)
//! - containers taller than the remaining space, split between children
//! - text blocks split between lines
//! - table headers repeated on continuation pages
//! - per-page header/footer fragments with live page counters

use taffy::TaffyError;

use crate::pagination::{PAGE_NUMBER_CLASS, TOTAL_PAGES_CLASS};
use crate::print::{Media, PrintOptions};

use super::css::Stylesheet;
use super::dom::{fill_class, parse_html, DomNode, Tag};
use super::layout::{compute_layout, BoxContent, ImageSizes, PositionedBox};
use super::plan::{
    BorderStyle, DocumentPlan, ImageContent, LayoutBox, PageBackground, PagePlan, PlacedLine,
    PlacedSegment, TextContent,
};
use super::style::{build_styled_tree, parse_edges, Edges, StyleContext, TextAlign, PX_PER_IN};
use super::text::Line;

/// Class of the element a band fragment fills with the document title.
pub const TITLE_CLASS: &str = "title";

/// Rounding slack when comparing against the page bottom.
const EPSILON: f32 = 0.5;

/// Physical page and content region, in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margins: Edges,
}

impl PageGeometry {
    /// Paper size and margins from the options; an `@page` margin in the
    /// document overrides the option margins.
    pub fn resolve(options: &PrintOptions, sheet: &Stylesheet) -> Self {
        let (w_pt, h_pt) = options.page_size_pt();
        let pt = PX_PER_IN / 72.0;
        let option_margins = Edges {
            top: options.margins.top * pt,
            right: options.margins.right * pt,
            bottom: options.margins.bottom * pt,
            left: options.margins.left * pt,
        };
        let margins = sheet
            .page
            .as_ref()
            .and_then(|page| page.margin.as_deref())
            .and_then(|m| parse_edges(m, 16.0))
            .unwrap_or(option_margins);
        Self {
            page_width: w_pt * pt,
            page_height: h_pt * pt,
            margins,
        }
    }

    pub fn content_width(&self) -> f32 {
        (self.page_width - self.margins.horizontal()).max(1.0)
    }
}

/// A header or footer template, parsed once and instantiated per page.
struct Band {
    nodes: Vec<DomNode>,
    height: f32,
}

impl Band {
    fn parse(template: &str, width: f32, title: &str, images: &mut ImageSizes) -> Result<Option<Self>, TaffyError> {
        if template.trim().is_empty() {
            return Ok(None);
        }
        let mut band = Self {
            nodes: parse_html(template),
            height: 0.0,
        };
        // Counters measured at their widest plausible value.
        band.height = band.layout(999, 999, title, width, images)?.height;
        Ok(Some(band))
    }

    /// Fragments are styled in isolation: no document stylesheet applies.
    fn layout(
        &self,
        page: usize,
        total: usize,
        title: &str,
        width: f32,
        images: &mut ImageSizes,
    ) -> Result<PositionedBox, TaffyError> {
        let mut nodes = self.nodes.clone();
        fill_class(&mut nodes, PAGE_NUMBER_CLASS, &page.to_string());
        fill_class(&mut nodes, TOTAL_PAGES_CLASS, &total.to_string());
        fill_class(&mut nodes, TITLE_CLASS, title);
        let sheet = Stylesheet::default();
        let ctx = StyleContext {
            sheet: &sheet,
            media: Media::Print,
            viewport_width: width,
        };
        let styled = build_styled_tree(&nodes, None, &ctx);
        compute_layout(&styled, width, images)
    }
}

/// Flow-content boxes from the document root: `<html>` and `<body>` are
/// always entered, their backgrounds belong to the page.
fn flow_root(root: &PositionedBox) -> (&[PositionedBox], Option<&PositionedBox>) {
    let mut boxes = root.children.as_slice();
    let mut body = None;
    while let Some(b) = boxes
        .iter()
        .find(|b| matches!(b.tag, Some(Tag::Html) | Some(Tag::Body)))
    {
        if b.tag == Some(Tag::Body) {
            body = Some(b);
        }
        boxes = b.children.as_slice();
    }
    (boxes, body)
}

fn page_background(body: Option<&PositionedBox>, print_background: bool) -> PageBackground {
    match body {
        Some(b) if print_background => PageBackground {
            color: Some(b.style.background_color).filter(|c| !c.is_transparent()),
            image: b.style.background_image.clone(),
        },
        _ => PageBackground::default(),
    }
}

/// Lay out `document`, split it into pages and stamp the bands.
pub fn paginate(
    document: &[DomNode],
    sheet: &Stylesheet,
    media: Media,
    options: &PrintOptions,
    title: &str,
    images: &mut ImageSizes,
) -> Result<DocumentPlan, TaffyError> {
    let geometry = PageGeometry::resolve(options, sheet);

    let (header, footer) = if options.display_header_footer {
        (
            Band::parse(&options.header_template, geometry.page_width, title, images)?,
            Band::parse(&options.footer_template, geometry.page_width, title, images)?,
        )
    } else {
        (None, None)
    };
    let header_height = header.as_ref().map_or(0.0, |b| b.height);
    let footer_height = footer.as_ref().map_or(0.0, |b| b.height);

    // Bands sit in the page margins, growing them when they do not fit.
    let region_top = geometry.margins.top.max(header_height);
    let region_bottom = geometry.page_height - geometry.margins.bottom.max(footer_height);

    let ctx = StyleContext {
        sheet,
        media,
        viewport_width: geometry.page_width,
    };
    let styled = build_styled_tree(document, None, &ctx);
    let root = compute_layout(&styled, geometry.content_width(), images)?;
    let (flow, body) = flow_root(&root);

    let mut paginator = Paginator::new(
        geometry.margins.left,
        region_top,
        (region_bottom - region_top).max(1.0),
        options.print_background,
    );
    for b in flow {
        paginator.place(b);
    }
    let pages = paginator.finish();
    let total = pages.len();
    log::debug!("paginated into {total} page(s)");

    let background = page_background(body, options.print_background);
    let mut plans = Vec::with_capacity(total);
    for (i, mut boxes) in pages.into_iter().enumerate() {
        let number = i + 1;
        if let Some(band) = &header {
            let laid = band.layout(number, total, title, geometry.page_width, images)?;
            boxes.extend(
                laid.children
                    .iter()
                    .map(|b| to_layout_box(b, 0.0, 0.0, options.print_background)),
            );
        }
        if let Some(band) = &footer {
            let laid = band.layout(number, total, title, geometry.page_width, images)?;
            let top = geometry.page_height - laid.height;
            boxes.extend(
                laid.children
                    .iter()
                    .map(|b| to_layout_box(b, 0.0, top, options.print_background)),
            );
        }
        plans.push(PagePlan {
            number,
            background: background.clone(),
            boxes,
        });
    }

    Ok(DocumentPlan {
        title: title.to_string(),
        page_width: geometry.page_width,
        page_height: geometry.page_height,
        pages: plans,
    })
}

// ---------------------------------------------------------------------------
// Flow splitting
// ---------------------------------------------------------------------------

struct Paginator {
    content_x: f32,
    region_top: f32,
    region_height: f32,
    print_background: bool,
    pages: Vec<Vec<LayoutBox>>,
    current: Vec<LayoutBox>,
    /// A flow box (not just a repeated header) is on the current page.
    has_content: bool,
    /// Flow y that maps to the top of the content region.
    page_start: f32,
    /// Table headers to repeat at the top of continuation pages.
    repeat: Vec<PositionedBox>,
}

fn has_forced_break_inside(b: &PositionedBox) -> bool {
    b.children
        .iter()
        .any(|c| c.style.break_before || c.style.break_after || has_forced_break_inside(c))
}

fn is_container(b: &PositionedBox) -> bool {
    matches!(b.content, BoxContent::None) && !b.children.is_empty()
}

impl Paginator {
    fn new(content_x: f32, region_top: f32, region_height: f32, print_background: bool) -> Self {
        Self {
            content_x,
            region_top,
            region_height,
            print_background,
            pages: Vec::new(),
            current: Vec::new(),
            has_content: false,
            page_start: 0.0,
            repeat: Vec::new(),
        }
    }

    fn region_end(&self) -> f32 {
        self.page_start + self.region_height + EPSILON
    }

    fn overflows(&self, b: &PositionedBox) -> bool {
        b.bottom() > self.region_end()
    }

    fn place(&mut self, b: &PositionedBox) {
        if b.style.break_before && self.has_content {
            self.new_page(b.y);
        }

        let overflows = self.overflows(b);
        if is_container(b)
            && (has_forced_break_inside(b) || (overflows && !b.style.break_inside_avoid))
        {
            self.place_children(b);
        } else if overflows {
            match &b.content {
                BoxContent::Text { lines, line_height } if !b.style.break_inside_avoid => {
                    self.split_text(b, lines, *line_height)
                }
                _ => {
                    if self.has_content {
                        self.new_page(b.y);
                    }
                    self.push(b);
                }
            }
        } else {
            self.push(b);
        }

        if b.style.break_after {
            self.new_page(b.bottom());
        }
    }

    /// Decorations of a split container are not drawn; its children are
    /// placed one by one.
    fn place_children(&mut self, b: &PositionedBox) {
        let mut repeating = false;
        for child in &b.children {
            self.place(child);
            if b.tag == Some(Tag::Table) && child.tag == Some(Tag::Thead) && !repeating {
                self.repeat.push(child.clone());
                repeating = true;
            }
        }
        if repeating {
            self.repeat.pop();
        }
    }

    fn split_text(&mut self, b: &PositionedBox, lines: &[Line], line_height: f32) {
        let mut start = 0;
        for i in 0..lines.len() {
            let top = b.y + i as f32 * line_height;
            if top + line_height > self.region_end() && (i > start || self.has_content) {
                if i > start {
                    self.push_lines(b, lines, start, i, line_height);
                }
                self.new_page(top);
                start = i;
            }
        }
        self.push_lines(b, lines, start, lines.len(), line_height);
    }

    fn push_lines(&mut self, b: &PositionedBox, lines: &[Line], from: usize, to: usize, line_height: f32) {
        let part = PositionedBox {
            y: b.y + from as f32 * line_height,
            height: (to - from) as f32 * line_height,
            content: BoxContent::Text {
                lines: lines[from..to].to_vec(),
                line_height,
            },
            ..b.clone()
        };
        self.push(&part);
    }

    fn push(&mut self, b: &PositionedBox) {
        let dy = self.region_top - self.page_start;
        self.current
            .push(to_layout_box(b, self.content_x, dy, self.print_background));
        self.has_content = true;
    }

    /// Close the current page if it holds flow content; the next page's
    /// region starts at flow position `y`, below any repeated headers.
    fn new_page(&mut self, y: f32) {
        if self.has_content {
            self.pages.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
        self.has_content = false;

        let mut offset = 0.0;
        for header in &self.repeat {
            let dy = self.region_top + offset - header.y;
            self.current
                .push(to_layout_box(header, self.content_x, dy, self.print_background));
            offset += header.height;
        }
        self.page_start = y - offset;
    }

    fn finish(mut self) -> Vec<Vec<LayoutBox>> {
        if self.has_content {
            self.pages.push(self.current);
        }
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages
    }
}

// ---------------------------------------------------------------------------
// Conversion to page boxes
// ---------------------------------------------------------------------------

/// Convert a positioned box and its subtree, shifted by `(dx, dy)`.
fn to_layout_box(b: &PositionedBox, dx: f32, dy: f32, print_background: bool) -> LayoutBox {
    let mut lb = LayoutBox::new(b.x + dx, b.y + dy, b.width, b.height);

    if print_background && !b.style.background_color.is_transparent() {
        lb.background_color = Some(b.style.background_color);
    }
    if !b.style.border.is_zero() && !b.style.border_color.is_transparent() {
        lb.border = Some(BorderStyle {
            widths: b.style.border,
            color: b.style.border_color,
        });
    }

    match &b.content {
        BoxContent::Text { lines, line_height } => {
            lb.text = Some(TextContent {
                lines: place_lines(lines, *line_height, b.width, b.style.text_align),
            });
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: b.width,
                height: b.height,
            });
        }
        BoxContent::None => {}
    }

    lb.children = b
        .children
        .iter()
        .map(|c| to_layout_box(c, dx, dy, print_background))
        .collect();
    lb
}

/// Align lines within `width` and put each baseline at the centre of its
/// line box, offset by the tallest face on the line.
fn place_lines(lines: &[Line], line_height: f32, width: f32, align: TextAlign) -> Vec<PlacedLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let shift = match align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (width - line.width) / 2.0,
                TextAlign::Right => width - line.width,
            }
            .max(0.0);
            let (size, ascent) = line
                .segments
                .iter()
                .map(|s| (s.style.font.size, s.style.font.ascent()))
                .fold((0.0f32, 0.0f32), |(a, b), (s, asc)| (a.max(s), b.max(asc)));
            PlacedLine {
                baseline: i as f32 * line_height + (line_height - size) / 2.0 + ascent,
                segments: line
                    .segments
                    .iter()
                    .map(|s| PlacedSegment {
                        text: s.text.clone(),
                        x: shift + s.x,
                        width: s.width,
                        style: s.style,
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dom::collect_elements;
    use crate::engine::style::Color;
    use crate::print::{Margins, PaperFormat};

    fn options() -> PrintOptions {
        PrintOptions::default()
    }

    fn plan(html: &str, options: &PrintOptions) -> DocumentPlan {
        let dom = parse_html(html);
        let mut sheet = Stylesheet::default();
        let mut styles = Vec::new();
        collect_elements(&dom, &Tag::Style, &mut styles);
        for style in styles {
            sheet.extend(Stylesheet::parse(&style.text_content()));
        }
        paginate(&dom, &sheet, Media::Print, options, "Doc", &mut ImageSizes::default())
            .expect("paginate")
    }

    fn all_boxes(b: &LayoutBox, out: &mut Vec<LayoutBox>) {
        out.push(b.clone());
        for c in &b.children {
            all_boxes(c, out);
        }
    }

    #[test]
    fn geometry_from_options() {
        let landscape = PrintOptions {
            format: PaperFormat::Letter,
            landscape: true,
            margins: Margins {
                top: 72.0,
                ..Margins::ZERO
            },
            ..options()
        };
        let g = PageGeometry::resolve(&landscape, &Stylesheet::default());
        assert_eq!((g.page_width, g.page_height), (1056.0, 816.0));
        assert_eq!(g.margins.top, 96.0);

        let sheet = Stylesheet::parse("@page { size: A4; margin: 0; }");
        let g = PageGeometry::resolve(&landscape, &sheet);
        assert!(g.margins.is_zero());
    }

    #[test]
    fn single_page() {
        let doc = plan("<p>Short text</p>", &options());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].text_lines(), vec!["Short text"]);
    }

    #[test]
    fn empty_document_has_one_page() {
        let doc = plan("<html><body></body></html>", &options());
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages[0].boxes.is_empty());
    }

    #[test]
    fn multiple_pages() {
        let mut html = String::from("<html><body><main>");
        for i in 0..80 {
            html.push_str(&format!("<p>Paragraph {i} with some text</p>"));
        }
        html.push_str("</main></body></html>");
        let doc = plan(&html, &options());
        assert!(doc.page_count() > 1, "got {}", doc.page_count());

        let lines: Vec<String> = doc.pages.iter().flat_map(PagePlan::text_lines).collect();
        assert_eq!(lines.len(), 80);
        assert_eq!(lines[79], "Paragraph 79 with some text");
        for page in &doc.pages {
            for b in &page.boxes {
                assert!(b.y >= 0.0 && b.y + b.height <= doc.page_height + EPSILON);
            }
        }
    }

    #[test]
    fn forced_breaks() {
        let doc = plan(
            r#"<main><p>a</p><div class="pagebreak" style="break-after:page"></div><p>b</p><div style="break-after:page"></div></main>"#,
            &options(),
        );
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].text_lines(), vec!["a"]);
        assert_eq!(doc.pages[1].text_lines(), vec!["b"]);
        // The continuation starts at the top of the page.
        assert_eq!(doc.pages[1].boxes[0].y, 0.0);
    }

    #[test]
    fn long_paragraph_splits_between_lines() {
        let words = "lorem ipsum dolor sit amet ".repeat(400);
        let doc = plan(&format!("<p>{words}</p>"), &options());
        assert!(doc.page_count() >= 2);
        let text = doc
            .pages
            .iter()
            .flat_map(PagePlan::text_lines)
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(text, words.trim_end());
    }

    #[test]
    fn table_header_repeats_on_continuation_pages() {
        let mut html = String::from(
            "<style>tr { break-inside: avoid; }</style><table class=\"w-full\"><thead><tr><th>Item</th><th>Qty</th></tr></thead><tbody>",
        );
        for i in 0..120 {
            html.push_str(&format!("<tr><td>row {i}</td><td>{i}</td></tr>"));
        }
        html.push_str("</tbody></table>");
        let doc = plan(&html, &options());
        assert!(doc.page_count() >= 2);
        for page in &doc.pages {
            let lines = page.text_lines();
            assert_eq!(lines[0], "Item", "page {}", page.number);
        }
        let rows: usize = doc
            .pages
            .iter()
            .flat_map(PagePlan::text_lines)
            .filter(|l| l.starts_with("row "))
            .count();
        assert_eq!(rows, 120);
    }

    #[test]
    fn bands_carry_page_counters() {
        let mut html = String::from("<main>");
        for i in 0..2 {
            html.push_str(&format!("<p>page {i}</p><div style=\"break-after:page\"></div>"));
        }
        html.push_str("</main>");
        let opts = PrintOptions {
            display_header_footer: true,
            header_template: r#"<div style="padding:8px"><span class="title"></span></div>"#.into(),
            footer_template: r#"<div style="display:flex;justify-content:center;padding:6px"><span>Page&nbsp;<span class="pageNumber"></span>&nbsp;of&nbsp;<span class="totalPages"></span></span></div>"#.into(),
            ..options()
        };
        let doc = plan(&html, &opts);
        assert_eq!(doc.page_count(), 2);
        for page in &doc.pages {
            let lines = page.text_lines();
            assert!(lines.contains(&"Doc".to_string()), "{lines:?}");
            let footer = format!("Page\u{A0}{}\u{A0}of\u{A0}2", page.number);
            assert!(lines.contains(&footer), "{lines:?}");
        }
        // Body content starts below the header band.
        let first = doc.pages[0]
            .boxes
            .iter()
            .find(|b| b.text_lines() == vec!["page 0".to_string()])
            .expect("body box");
        assert!(first.y >= 8.0 + 24.0);
    }

    #[test]
    fn print_media_rules_apply() {
        let doc = plan(
            r#"<style>@media print { .report-band { display: none; } }</style><div class="report-band">band</div><p class="print:hidden">screen only</p><p>kept</p>"#,
            &options(),
        );
        assert_eq!(doc.pages[0].text_lines(), vec!["kept"]);
    }

    #[test]
    fn body_background_moves_to_page() {
        let doc = plan(
            r#"<html><body style="background-color:#ff0000"><p>x</p></body></html>"#,
            &options(),
        );
        assert_eq!(doc.pages[0].background.color, Some(Color::rgb8(255, 0, 0)));
        let mut boxes = Vec::new();
        for b in &doc.pages[0].boxes {
            all_boxes(b, &mut boxes);
        }
        assert!(boxes.iter().all(|b| b.background_color.is_none()));

        let plain = plan(
            r#"<html><body style="background-color:#ff0000"><p>x</p></body></html>"#,
            &PrintOptions {
                print_background: false,
                ..options()
            },
        );
        assert_eq!(plain.pages[0].background, PageBackground::default());
    }

    #[test]
    fn centered_text_is_offset() {
        let doc = plan(r#"<p style="text-align:center;width:200px">ab</p>"#, &options());
        let mut boxes = Vec::new();
        for b in &doc.pages[0].boxes {
            all_boxes(b, &mut boxes);
        }
        let text = boxes.iter().find_map(|b| b.text.clone()).expect("text");
        let seg = &text.lines[0].segments[0];
        assert!((seg.x - (200.0 - seg.width) / 2.0).abs() < 0.01);
        assert!(text.lines[0].baseline > 0.0 && text.lines[0].baseline < 24.0);
    }
}
