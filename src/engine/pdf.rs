//! PDF renderer – takes a [`DocumentPlan`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{HashMap, HashSet};

use printpdf::*;

use crate::assets::parse_data_uri;

use super::fonts::FontFamily;
use super::plan::{DocumentPlan, LayoutBox, PageBackground, PX_TO_PT};
use super::style;
use super::text::RunStyle;

/// PDF points to millimetres.
const PT_TO_MM: f32 = 0.352778;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a plan into PDF bytes.
///
/// Images that cannot be decoded are skipped with a warning; the load phase
/// has already reported them as diagnostics.
pub fn render_pdf(plan: &DocumentPlan) -> Result<Vec<u8>, String> {
    let page_w_pt = plan.page_width * PX_TO_PT;
    let page_h_pt = plan.page_height * PX_TO_PT;
    let page_w = Mm(page_w_pt * PT_TO_MM);
    let page_h = Mm(page_h_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&plan.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page in &plan.pages {
        if let Some(src) = &page.background.image {
            all_srcs.insert(src.as_str());
        }
        for lbox in &page.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<&str, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    // Sorted so object numbering does not depend on hash order.
    let mut srcs: Vec<&str> = all_srcs.into_iter().collect();
    srcs.sort_unstable();
    for src in srcs {
        let bytes = match parse_data_uri(src) {
            Ok((_, bytes)) => bytes,
            Err(e) => {
                log::warn!("skipping image: {e}");
                continue;
            }
        };
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("skipping image: decode error: {e}");
                continue;
            }
        };
        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping image: PDF encode error: {e}");
                continue;
            }
        };
        image_resources.insert(
            src,
            ImageResource {
                xobj_id: doc.add_image(&raw),
                px_width: dyn_img.width(),
                px_height: dyn_img.height(),
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let mut ops = Vec::new();
        render_background(&mut ops, &page.background, page_w_pt, page_h_pt, &image_resources);
        for lbox in &page.boxes {
            render_box(&mut ops, lbox, page_h_pt, &image_resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn builtin_font(style: &RunStyle) -> BuiltinFont {
    let f = style.font;
    match (f.family, f.bold, f.italic) {
        (FontFamily::Helvetica, false, false) => BuiltinFont::Helvetica,
        (FontFamily::Helvetica, true, false) => BuiltinFont::HelveticaBold,
        (FontFamily::Helvetica, false, true) => BuiltinFont::HelveticaOblique,
        (FontFamily::Helvetica, true, true) => BuiltinFont::HelveticaBoldOblique,
        (FontFamily::Times, false, false) => BuiltinFont::TimesRoman,
        (FontFamily::Times, true, false) => BuiltinFont::TimesBold,
        (FontFamily::Times, false, true) => BuiltinFont::TimesItalic,
        (FontFamily::Times, true, true) => BuiltinFont::TimesBoldItalic,
        (FontFamily::Courier, false, false) => BuiltinFont::Courier,
        (FontFamily::Courier, true, false) => BuiltinFont::CourierBold,
        (FontFamily::Courier, false, true) => BuiltinFont::CourierOblique,
        (FontFamily::Courier, true, true) => BuiltinFont::CourierBoldOblique,
    }
}

/// Opaque PDF colour; translucent colours are composited over white.
fn pdf_color(c: &style::Color) -> Color {
    let mix = |v: f32| v * c.a + (1.0 - c.a);
    Color::Rgb(Rgb {
        r: mix(c.r),
        g: mix(c.g),
        b: mix(c.b),
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Fill a rectangle given in top-left page coordinates (pt).
fn fill_rect(ops: &mut Vec<Op>, x: f32, y: f32, w: f32, h: f32, page_height: f32, color: &style::Color) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let (x1, x2) = (x, x + w);
    let (y1, y2) = (page_height - y - h, page_height - y);
    ops.push(Op::SetFillColor {
        col: pdf_color(color),
    });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

/// Recursively collect all unique image sources from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn place_image(
    ops: &mut Vec<Op>,
    res: &ImageResource,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    page_height: f32,
) {
    if res.px_width == 0 || res.px_height == 0 {
        return;
    }
    // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
    ops.push(Op::UseXobject {
        id: res.xobj_id.clone(),
        transform: XObjectTransform {
            translate_x: Some(Pt(x)),
            translate_y: Some(Pt(page_height - y - h)),
            dpi: Some(72.0),
            scale_x: Some(w / res.px_width as f32),
            scale_y: Some(h / res.px_height as f32),
            rotate: None,
        },
    });
}

/// Page colour first, then the image scaled to cover the page.
fn render_background(
    ops: &mut Vec<Op>,
    background: &PageBackground,
    page_width: f32,
    page_height: f32,
    images: &HashMap<&str, ImageResource>,
) {
    if let Some(color) = &background.color {
        fill_rect(ops, 0.0, 0.0, page_width, page_height, page_height, color);
    }
    let Some(res) = background.image.as_deref().and_then(|src| images.get(src)) else {
        return;
    };
    let (iw, ih) = (res.px_width as f32, res.px_height as f32);
    if iw <= 0.0 || ih <= 0.0 {
        return;
    }
    let scale = (page_width / iw).max(page_height / ih);
    let (w, h) = (iw * scale, ih * scale);
    place_image(
        ops,
        res,
        (page_width - w) / 2.0,
        (page_height - h) / 2.0,
        w,
        h,
        page_height,
    );
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<&str, ImageResource>,
) {
    let x = lbox.x * PX_TO_PT;
    let y = lbox.y * PX_TO_PT;
    let w = lbox.width * PX_TO_PT;
    let h = lbox.height * PX_TO_PT;

    if let Some(bg) = &lbox.background_color {
        fill_rect(ops, x, y, w, h, page_height, bg);
    }

    // Borders are drawn as filled strips inside the border box.
    if let Some(border) = &lbox.border {
        let b = border.widths;
        let (top, right, bottom, left) = (
            b.top * PX_TO_PT,
            b.right * PX_TO_PT,
            b.bottom * PX_TO_PT,
            b.left * PX_TO_PT,
        );
        fill_rect(ops, x, y, w, top, page_height, &border.color);
        fill_rect(ops, x, y + h - bottom, w, bottom, page_height, &border.color);
        fill_rect(ops, x, y, left, h, page_height, &border.color);
        fill_rect(ops, x + w - right, y, right, h, page_height, &border.color);
    }

    if let Some(text) = &lbox.text {
        for line in &text.lines {
            let baseline = page_height - (lbox.y + line.baseline) * PX_TO_PT;
            for seg in &line.segments {
                if seg.text.trim().is_empty() {
                    continue;
                }
                let font = builtin_font(&seg.style);
                let size = seg.style.font.size * PX_TO_PT;
                let seg_x = (lbox.x + seg.x) * PX_TO_PT;

                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(seg_x),
                        y: Pt(baseline),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(size),
                    font,
                });
                ops.push(Op::SetFillColor {
                    col: pdf_color(&seg.style.color),
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(to_winlatin(&seg.text))],
                    font,
                });
                ops.push(Op::EndTextSection);

                if seg.style.underline {
                    let underline_y = baseline - size * 0.1;
                    ops.push(Op::SetOutlineThickness {
                        pt: Pt((size * 0.05).max(0.5)),
                    });
                    ops.push(Op::SetOutlineColor {
                        col: pdf_color(&seg.style.color),
                    });
                    ops.push(Op::DrawLine {
                        line: Line {
                            points: vec![
                                point(seg_x, underline_y),
                                point(seg_x + seg.width * PX_TO_PT, underline_y),
                            ],
                            is_closed: false,
                        },
                    });
                }
            }
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(img.src.as_str()) {
            place_image(
                ops,
                res,
                x,
                y,
                img.width * PX_TO_PT,
                img.height * PX_TO_PT,
                page_height,
            );
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}
