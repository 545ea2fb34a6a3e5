//! Layout engine – uses Taffy to compute flexbox layout from a styled DOM
//! tree, then converts the result into a tree of positioned boxes.
//!
//! Block elements become flex columns. Each run of inline content becomes
//! one leaf whose lines are wrapped up front against an estimated width.

use std::collections::HashMap;

use taffy::prelude::*;
use taffy::TaffyError;

use crate::assets::parse_data_uri;

use super::dom::Tag;
use super::style::{self, ComputedStyle, StyledNode};
use super::text::{layout_lines, InlineItem, Line, RunStyle};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in flow coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Source element; `None` for anonymous text runs and the root.
    pub tag: Option<Tag>,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shift this box and its subtree vertically.
    pub fn translate_y(&mut self, dy: f32) {
        self.y += dy;
        for child in &mut self.children {
            child.translate_y(dy);
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, BoxContent::Text { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxContent {
    None,
    Text { lines: Vec<Line>, line_height: f32 },
    Image { src: String },
}

// ---------------------------------------------------------------------------
// Image intrinsic sizes
// ---------------------------------------------------------------------------

/// Decoded image sizes keyed by source, so a logo repeated on every page is
/// decoded once.
#[derive(Debug, Default)]
pub struct ImageSizes(HashMap<String, Option<(f32, f32)>>);

impl ImageSizes {
    pub fn get(&mut self, src: &str) -> Option<(f32, f32)> {
        if let Some(size) = self.0.get(src) {
            return *size;
        }
        let size = intrinsic_size(src);
        self.0.insert(src.to_string(), size);
        size
    }
}

/// Pixel size of a base64 data-URI image, `None` when it cannot be decoded.
pub fn intrinsic_size(src: &str) -> Option<(f32, f32)> {
    let (_, bytes) = parse_data_uri(src).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (w, h) = (img.width() as f32, img.height() as f32);
    (w > 0.0 && h > 0.0).then_some((w, h))
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

type Built = Result<Option<NodeId>, TaffyError>;

/// Children of a container after inline runs are merged.
enum Group<'n> {
    Inline(Vec<&'n StyledNode>),
    Block(&'n StyledNode),
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    images: &'a mut ImageSizes,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_tags: HashMap<NodeId, Tag>,
    node_content: HashMap<NodeId, BoxContent>,
}

/// True for text and inline elements holding only inline content.
fn is_inline(node: &StyledNode) -> bool {
    match node {
        StyledNode::Text { .. } => true,
        StyledNode::Element {
            tag,
            style,
            children,
            ..
        } => {
            style.display == style::Display::Inline
                && *tag != Tag::Img
                && children.iter().all(is_inline)
        }
    }
}

/// Whether an inline run renders anything: visible text or a line break.
fn has_inline_content(node: &StyledNode) -> bool {
    match node {
        StyledNode::Text { text, .. } => text.chars().any(|c| !c.is_ascii_whitespace()),
        StyledNode::Element { tag: Tag::Br, .. } => true,
        StyledNode::Element { children, .. } => children.iter().any(has_inline_content),
    }
}

/// Inside a flex container every element is its own item; only bare text
/// is merged into anonymous runs.
fn group_children(children: &[StyledNode], flex: bool) -> Vec<Group<'_>> {
    fn flush<'n>(run: &mut Vec<&'n StyledNode>, groups: &mut Vec<Group<'n>>) {
        if run.iter().any(|n| has_inline_content(n)) {
            groups.push(Group::Inline(std::mem::take(run)));
        } else {
            run.clear();
        }
    }

    let mut groups = Vec::new();
    let mut run: Vec<&StyledNode> = Vec::new();
    for child in children {
        let inline = match child {
            StyledNode::Text { .. } => true,
            StyledNode::Element { .. } => !flex && is_inline(child),
        };
        if inline {
            run.push(child);
        } else {
            flush(&mut run, &mut groups);
            groups.push(Group::Block(child));
        }
    }
    flush(&mut run, &mut groups);
    groups
}

fn run_style(style: &ComputedStyle) -> RunStyle {
    RunStyle {
        font: style.font(),
        color: style.color,
        underline: style.underline,
    }
}

fn collect_inline(node: &StyledNode, items: &mut Vec<InlineItem>, line_height: &mut f32) {
    match node {
        StyledNode::Text { text, style } => {
            *line_height = line_height.max(style.line_height_px());
            items.push(InlineItem::Text(
                style.text_transform.apply(text),
                run_style(style),
            ));
        }
        StyledNode::Element { tag: Tag::Br, .. } => items.push(InlineItem::Break),
        StyledNode::Element { children, .. } => {
            for child in children {
                collect_inline(child, items, line_height);
            }
        }
    }
}

fn is_row(tag: &Tag, s: &ComputedStyle) -> bool {
    *tag == Tag::Tr
        || (s.display == style::Display::Flex && s.flex_direction == style::FlexDirection::Row)
}

impl<'a> LayoutBuilder<'a> {
    fn new(images: &'a mut ImageSizes) -> Self {
        Self {
            taffy: TaffyTree::new(),
            images,
            node_styles: HashMap::new(),
            node_tags: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Built {
        match styled {
            StyledNode::Text { style, .. } => {
                self.build_inline_leaf(&[styled], style, parent_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => {
                if *tag == Tag::Img {
                    return self.build_image(style, attrs, parent_width);
                }
                self.build_element_node(tag, style, children, parent_width)
            }
        }
    }

    /// One leaf holding a wrapped run of inline content. Lines are broken
    /// against `width`; the leaf is at least as wide as its widest line.
    fn build_inline_leaf(&mut self, nodes: &[&StyledNode], block: &ComputedStyle, width: f32) -> Built {
        let mut items = Vec::new();
        let mut line_height = block.line_height_px();
        for node in nodes {
            collect_inline(node, &mut items, &mut line_height);
        }
        let lines = layout_lines(&items, width.max(1.0));
        if lines.is_empty() {
            return Ok(None);
        }
        let widest = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);

        let taffy_style = Style {
            size: Size {
                width: Dimension::Auto,
                height: Dimension::Length(lines.len() as f32 * line_height),
            },
            min_size: Size {
                width: Dimension::Length(widest.ceil()),
                height: Dimension::Auto,
            },
            ..Default::default()
        };
        let node = self.taffy.new_leaf(taffy_style)?;
        // Inherited properties only: the leaf must not repaint the
        // container's background or borders.
        self.node_styles
            .insert(node, ComputedStyle::inherit(block));
        self.node_content
            .insert(node, BoxContent::Text { lines, line_height });
        Ok(Some(node))
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        parent_width: f32,
    ) -> Built {
        let mut my_width = style
            .width
            .resolve(parent_width)
            .unwrap_or(parent_width - style.margin.horizontal());
        if let Some(max) = style.max_width.resolve(parent_width) {
            my_width = my_width.min(max);
        }
        let inner_width =
            (my_width - style.padding.horizontal() - style.border.horizontal()).max(0.0);

        let row = is_row(tag, style);
        let flex = row || style.display == style::Display::Flex;
        let groups = group_children(children, flex);

        // Estimate per-child width for flex rows and table rows so that
        // text is wrapped to the right column width at build time.
        let widths = if row {
            self.row_widths(&groups, style, inner_width)
        } else {
            vec![inner_width; groups.len()]
        };

        let mut child_nodes = Vec::new();
        for (group, width) in groups.iter().zip(widths) {
            let built = match group {
                Group::Inline(nodes) => self.build_inline_leaf(nodes, style, width)?,
                Group::Block(node) => self.build_node(node, width)?,
            };
            child_nodes.extend(built);
        }

        let taffy_style = self.computed_to_taffy(style, tag);
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, style.clone());
        self.node_tags.insert(node, tag.clone());
        Ok(Some(node))
    }

    /// Width handed to each child of a row: items with a definite width
    /// resolve it themselves against the row, the rest share what is left.
    fn row_widths(&mut self, groups: &[Group<'_>], s: &ComputedStyle, inner: f32) -> Vec<f32> {
        let fixed: Vec<Option<f32>> = groups
            .iter()
            .map(|g| match g {
                Group::Block(node) => self.fixed_width(node, inner),
                Group::Inline(_) => None,
            })
            .collect();
        let gaps = s.column_gap * groups.len().saturating_sub(1) as f32;
        let used: f32 = fixed.iter().flatten().sum();
        let flexible = fixed.iter().filter(|f| f.is_none()).count().max(1);
        let share = ((inner - gaps - used) / flexible as f32).max(1.0);
        fixed
            .into_iter()
            .map(|f| if f.is_some() { inner } else { share })
            .collect()
    }

    fn fixed_width(&mut self, node: &StyledNode, inner: f32) -> Option<f32> {
        let StyledNode::Element {
            tag, style, attrs, ..
        } = node
        else {
            return None;
        };
        let width = if *tag == Tag::Img {
            let src = attrs.get("src")?;
            self.image_box(style, src, inner)?.0
        } else {
            style.width.resolve(inner)?
        };
        Some(width + style.margin.horizontal())
    }

    /// Used size of an image: explicit dimensions first, the intrinsic
    /// aspect ratio for the rest, then `max-width`.
    fn image_box(&mut self, s: &ComputedStyle, src: &str, parent_width: f32) -> Option<(f32, f32)> {
        let (px_w, px_h) = self.images.get(src)?;
        let aspect = px_w / px_h;
        let known_w = s.width.resolve(parent_width);
        let known_h = match s.height {
            style::Dimension::Px(h) => Some(h),
            _ => None,
        };
        let (mut w, mut h) = match (known_w, known_h) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, (w / aspect).max(1.0)),
            (None, Some(h)) => ((h * aspect).max(1.0), h),
            (None, None) => (px_w, px_h),
        };
        if let Some(max) = s.max_width.resolve(parent_width) {
            if w > max && max > 0.0 {
                if known_h.is_none() {
                    h *= max / w;
                }
                w = max;
            }
        }
        Some((w, h))
    }

    fn build_image(
        &mut self,
        s: &ComputedStyle,
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Built {
        let Some(src) = attrs.get("src") else {
            return Ok(None);
        };
        let Some((w, h)) = self.image_box(s, src, parent_width) else {
            log::debug!("skipping image that could not be decoded");
            return Ok(None);
        };
        let taffy_style = Style {
            size: Size {
                width: Dimension::Length(w),
                height: Dimension::Length(h),
            },
            flex_shrink: 0.0,
            margin: margin(s),
            ..Default::default()
        };
        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, s.clone());
        self.node_tags.insert(node, Tag::Img);
        self.node_content
            .insert(node, BoxContent::Image { src: src.clone() });
        Ok(Some(node))
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style::default();

        // -----------------------------------------------------------------
        // HTML table model: always flex regardless of computed display.
        // -----------------------------------------------------------------
        match tag {
            Tag::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = dim_to_taffy(s.width);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding(s);
                ts.border = border(s);
                ts.margin = margin(s);
                return ts;
            }
            Tag::Thead | Tag::Tbody => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = taffy::Dimension::Percent(1.0);
                return ts;
            }
            Tag::Tr => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = taffy::Dimension::Percent(1.0);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.margin = margin(s);
                return ts;
            }
            Tag::Td | Tag::Th => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.flex_grow = 1.0;
                ts.flex_shrink = 1.0;
                ts.flex_basis = taffy::Dimension::Length(0.0); // equal columns
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding(s);
                ts.border = border(s);
                return ts;
            }
            _ => {}
        }

        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            // Blocks, and inline elements blockified by their content,
            // stack vertically.
            style::Display::Block | style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        // Allow flex items to compress below their natural content size.
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                dim_to_taffy(s.min_width)
            },
            height: taffy::Dimension::Auto,
        };
        ts.max_size = Size {
            width: dim_to_taffy(s.max_width),
            height: taffy::Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        ts.flex_basis = dim_to_taffy(s.flex_basis);

        ts.margin = margin(s);
        ts.padding = padding(s);
        ts.border = border(s);
        ts.gap = Size {
            width: LengthPercentage::Length(s.column_gap),
            height: LengthPercentage::Length(s.row_gap),
        };
        ts
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, TaffyError> {
        let layout = self.taffy.layout(node)?;
        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        let (width, height) = (layout.size.width, layout.size.height);

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width,
            height,
            tag: self.node_tags.get(&node).cloned(),
            style: self.node_styles.get(&node).cloned().unwrap_or_default(),
            content: self
                .node_content
                .get(&node)
                .cloned()
                .unwrap_or(BoxContent::None),
            children,
        })
    }
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

fn margin(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(s.margin.top),
        right: LengthPercentageAuto::Length(s.margin.right),
        bottom: LengthPercentageAuto::Length(s.margin.bottom),
        left: LengthPercentageAuto::Length(s.margin.left),
    }
}

fn padding(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.padding.top),
        right: LengthPercentage::Length(s.padding.right),
        bottom: LengthPercentage::Length(s.padding.bottom),
        left: LengthPercentage::Length(s.padding.left),
    }
}

fn border(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.border.top),
        right: LengthPercentage::Length(s.border.right),
        bottom: LengthPercentage::Length(s.border.bottom),
        left: LengthPercentage::Length(s.border.left),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out `styled_nodes` in a column `width` px wide. Returns an anonymous
/// root box at the origin whose children are the laid-out nodes.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    width: f32,
    images: &mut ImageSizes,
) -> Result<PositionedBox, TaffyError> {
    let mut builder = LayoutBuilder::new(images);
    let root_style = ComputedStyle::default();

    let mut child_ids = Vec::new();
    for group in group_children(styled_nodes, false) {
        let built = match group {
            Group::Inline(nodes) => builder.build_inline_leaf(&nodes, &root_style, width)?,
            Group::Block(node) => builder.build_node(node, width)?,
        };
        child_ids.extend(built);
    }

    let root = builder.taffy.new_with_children(
        Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            size: Size {
                width: taffy::Dimension::Length(width),
                height: taffy::Dimension::Auto,
            },
            ..Default::default()
        },
        &child_ids,
    )?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    builder.extract(root, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::css::Stylesheet;
    use crate::engine::dom::parse_html;
    use crate::engine::style::{build_styled_tree, StyleContext};
    use crate::print::Media;

    /// 2×1 red PNG.
    const WIDE_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAABCAIAAAB7QOjdAAAADUlEQVR4nGP4z8AARAAI/gH/xp559wAAAABJRU5ErkJggg==";

    fn layout(html: &str, width: f32) -> PositionedBox {
        let sheet = Stylesheet::default();
        let ctx = StyleContext {
            sheet: &sheet,
            media: Media::Print,
            viewport_width: width,
        };
        let styled = build_styled_tree(&parse_html(html), None, &ctx);
        compute_layout(&styled, width, &mut ImageSizes::default()).expect("layout")
    }

    fn text_of(b: &PositionedBox) -> Vec<String> {
        let mut out = Vec::new();
        if let BoxContent::Text { lines, .. } = &b.content {
            out.extend(lines.iter().map(Line::text));
        }
        for child in &b.children {
            out.extend(text_of(child));
        }
        out
    }

    #[test]
    fn layout_simple_paragraph() {
        let root = layout(r#"<p class="text-sm">Hello world</p>"#, 400.0);
        let p = &root.children[0];
        assert_eq!(p.width, 400.0);
        assert_eq!(p.height, 20.0);
        let leaf = &p.children[0];
        assert!(leaf.is_text());
        assert_eq!(text_of(leaf), vec!["Hello world"]);
    }

    #[test]
    fn paragraph_height_tracks_wrapped_lines() {
        let root = layout("<p>one two three four five six seven eight</p>", 80.0);
        let p = &root.children[0];
        let lines = text_of(p).len();
        assert!(lines > 1);
        assert_eq!(p.height, lines as f32 * 24.0);
    }

    #[test]
    fn inline_runs_share_a_leaf() {
        let root = layout(
            r#"<div><span class="font-semibold">Date:</span> <span>05 Mar 2024</span></div>"#,
            400.0,
        );
        assert_eq!(text_of(&root), vec!["Date: 05 Mar 2024"]);
        assert_eq!(root.children[0].children.len(), 1);
    }

    #[test]
    fn blocks_stack_with_margins() {
        let root = layout(
            r#"<div class="mb-4"><p>a</p></div><div class="p-2"><p>b</p></div>"#,
            300.0,
        );
        let (first, second) = (&root.children[0], &root.children[1]);
        assert_eq!(first.y, 0.0);
        assert_eq!(second.y, first.height + 16.0);
        assert_eq!(second.height, 24.0 + 16.0);
        assert_eq!(second.children[0].x, 8.0);
    }

    #[test]
    fn layout_flex_row() {
        let root = layout(
            r#"<div class="flex gap-8"><div class="flex-1">A</div><div class="flex-1">B</div></div>"#,
            232.0,
        );
        let row = &root.children[0];
        assert_eq!(row.children.len(), 2);
        assert_eq!(row.children[0].width, 100.0);
        assert_eq!(row.children[1].x, 132.0);
    }

    #[test]
    fn table_cells_share_the_row() {
        let root = layout(
            "<table class=\"w-full\"><tbody>\n<tr><td>a</td><td>b</td><td>c</td></tr>\n</tbody></table>",
            300.0,
        );
        let table = &root.children[0];
        let row = &table.children[0].children[0];
        assert_eq!(row.children.len(), 3);
        for cell in &row.children {
            assert!((cell.width - 100.0).abs() < 0.01);
        }
    }

    #[test]
    fn line_breaks_add_lines() {
        let root = layout("<p>one<br>two<br>three</p>", 400.0);
        assert_eq!(text_of(&root), vec!["one", "two", "three"]);
        assert_eq!(root.children[0].height, 72.0);
    }

    #[test]
    fn image_uses_intrinsic_aspect() {
        let html = format!(r#"<div class="flex"><img src="{WIDE_PNG}" style="height:10px;width:auto"></div>"#);
        let root = layout(&html, 300.0);
        let img = &root.children[0].children[0];
        assert_eq!((img.width, img.height), (20.0, 10.0));
        assert!(matches!(img.content, BoxContent::Image { .. }));
    }

    #[test]
    fn image_clamped_to_max_width() {
        let html = format!(r#"<img src="{WIDE_PNG}" style="width:400px">"#);
        let root = layout(&html, 100.0);
        let img = &root.children[0];
        assert_eq!((img.width, img.height), (100.0, 50.0));
    }

    #[test]
    fn undecodable_image_is_dropped() {
        let root = layout(r#"<p>a</p><img src="data:image/png;base64,AA=="><p>b</p>"#, 300.0);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn empty_block_has_no_height() {
        let root = layout(r#"<div class="pagebreak"></div><div style="height:32px"></div>"#, 300.0);
        assert_eq!(root.children[0].height, 0.0);
        assert_eq!(root.children[1].height, 32.0);
    }

    #[test]
    fn text_leaf_does_not_inherit_decorations() {
        let root = layout(r#"<div class="border bg-gray-50">x</div>"#, 300.0);
        let leaf = &root.children[0].children[0];
        assert!(leaf.style.border.is_zero());
        assert!(leaf.style.background_color.is_transparent());
    }
}
