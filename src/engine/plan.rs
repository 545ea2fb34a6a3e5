//! Page plan – the intermediate representation between pagination and PDF
//! rendering. Encodes exactly what goes on each page, in CSS px with the
//! origin at the top-left of the physical page.

use super::style::{Color, Edges};
use super::text::RunStyle;

/// CSS px to PDF points.
pub const PX_TO_PT: f32 = 0.75;

/// A complete document ready for rendering.
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    /// Embedded in the PDF metadata.
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<PagePlan>,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// One physical page.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    /// 1-based.
    pub number: usize,
    /// Painted edge to edge before any box.
    pub background: PageBackground,
    pub boxes: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageBackground {
    pub color: Option<Color>,
    /// Data URI, scaled to cover the page.
    pub image: Option<String>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<Color>,
    pub border: Option<BorderStyle>,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    /// All text in this box and its descendants, one line per entry.
    pub fn text_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_lines(&mut out);
        out
    }

    fn collect_lines(&self, out: &mut Vec<String>) {
        if let Some(text) = &self.text {
            out.extend(text.lines.iter().map(PlacedLine::text));
        }
        for child in &self.children {
            child.collect_lines(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorderStyle {
    pub widths: Edges,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub lines: Vec<PlacedLine>,
}

/// One line of text, aligned within its box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Baseline offset from the top of the box.
    pub baseline: f32,
    pub segments: Vec<PlacedSegment>,
}

impl PlacedLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSegment {
    pub text: String,
    /// Offset from the left edge of the box.
    pub x: f32,
    pub width: f32,
    pub style: RunStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl PagePlan {
    /// All text on the page in paint order.
    pub fn text_lines(&self) -> Vec<String> {
        self.boxes.iter().flat_map(LayoutBox::text_lines).collect()
    }
}
