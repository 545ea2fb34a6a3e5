//! Style resolver – maps tag defaults, Tailwind-like utility classes, author
//! stylesheet rules and inline styles to a flat [`ComputedStyle`] consumed by
//! the layout engine.
//!
//! Cascade order, lowest first: tag defaults, utility classes, matching
//! stylesheet rules for the active media (by specificity, then source order),
//! the `style` attribute. All lengths are CSS px.

use std::collections::HashMap;

use crate::print::Media;

use super::css::{parse_declarations, Stylesheet};
use super::dom::{DomNode, ElementNode, Tag};
use super::fonts::{FontFamily, FontSpec};

/// CSS px per inch.
pub const PX_PER_IN: f32 = 96.0;
/// Root font size for `rem`.
pub const ROOT_FONT_SIZE: f32 = 16.0;

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub row_gap: f32,
    pub column_gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Box model
    pub margin: Edges,
    pub padding: Edges,
    pub border: Edges,
    pub border_color: Color,

    // Typography (inherited)
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub font_family: FontFamily,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: LineHeight,
    pub text_transform: TextTransform,

    pub underline: bool,

    // Background
    pub background_color: Color,
    /// `url(..)` target of `background-image`.
    pub background_image: Option<String>,

    // Fragmentation
    pub break_before: bool,
    pub break_after: bool,
    pub break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            row_gap: 0.0,
            column_gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_color: Color::default_border(),
            font_size: ROOT_FONT_SIZE,
            bold: false,
            italic: false,
            font_family: FontFamily::Helvetica,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: LineHeight::Factor(1.5),
            text_transform: TextTransform::None,
            underline: false,
            background_color: Color::TRANSPARENT,
            background_image: None,
            break_before: false,
            break_after: false,
            break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    /// A fresh style for a child element: inherited properties copied, the
    /// rest at their initial values.
    pub fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            bold: parent.bold,
            italic: parent.italic,
            font_family: parent.font_family,
            color: parent.color,
            text_align: parent.text_align,
            line_height: parent.line_height,
            text_transform: parent.text_transform,
            ..Self::default()
        }
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family,
            bold: self.bold,
            italic: self.italic,
            size: self.font_size,
        }
    }

    pub fn line_height_px(&self) -> f32 {
        match self.line_height {
            LineHeight::Factor(f) => f * self.font_size,
            LineHeight::Px(px) => px,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
}

impl TextTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    /// Multiple of the element's own font size; inherited as a factor.
    Factor(f32),
    Px(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    /// 0..=100
    Percent(f32),
}

impl Dimension {
    /// Resolve against the containing block's width.
    pub fn resolve(self, basis: f32) -> Option<f32> {
        match self {
            Dimension::Auto => None,
            Dimension::Px(v) => Some(v),
            Dimension::Percent(p) => Some(basis * p / 100.0),
        }
    }
}

/// Per-side lengths in px.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn set(&mut self, side: Side, v: f32) {
        match side {
            Side::Top => self.top = v,
            Side::Right => self.right = v,
            Side::Bottom => self.bottom = v,
            Side::Left => self.left = v,
        }
    }

    fn set_sides(&mut self, sides: &[Side], v: f32) {
        for side in sides {
            self.set(*side, v);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

const ALL_SIDES: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Tailwind preflight border colour (`gray-200`).
    pub fn default_border() -> Self {
        Self::rgb8(0xe5, 0xe7, 0xeb)
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let (r, g, b, a) = match hex.len() {
            3 => (digit(0)?, digit(1)?, digit(2)?, 255),
            4 => (digit(0)?, digit(1)?, digit(2)?, digit(3)?),
            6 => (pair(0)?, pair(2)?, pair(4)?, 255),
            8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
            _ => return None,
        };
        Some(Self {
            a: a as f32 / 255.0,
            ..Self::rgb8(r, g, b)
        })
    }

    /// Hex, `rgb()` / `rgba()` or a colour keyword.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args
                .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |p: &str| -> Option<f32> {
                match p.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok().map(|v| v / 100.0),
                    None => p.parse::<f32>().ok().map(|v| v / 255.0),
                }
            };
            let alpha = match parts.get(3) {
                Some(a) => match a.strip_suffix('%') {
                    Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                    None => a.parse::<f32>().ok()?,
                },
                None => 1.0,
            };
            return Some(Self {
                r: channel(parts[0])?.clamp(0.0, 1.0),
                g: channel(parts[1])?.clamp(0.0, 1.0),
                b: channel(parts[2])?.clamp(0.0, 1.0),
                a: alpha.clamp(0.0, 1.0),
            });
        }
        named_color(&lower)
    }
}

fn named_color(name: &str) -> Option<Color> {
    Some(match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::rgb8(255, 0, 0),
        "green" => Color::rgb8(0, 128, 0),
        "blue" => Color::rgb8(0, 0, 255),
        "gray" | "grey" => Color::rgb8(128, 128, 128),
        "silver" => Color::rgb8(192, 192, 192),
        "navy" => Color::rgb8(0, 0, 128),
        "maroon" => Color::rgb8(128, 0, 0),
        "orange" => Color::rgb8(255, 165, 0),
        "yellow" => Color::rgb8(255, 255, 0),
        "purple" => Color::rgb8(128, 0, 128),
        "teal" => Color::rgb8(0, 128, 128),
        _ => return None,
    })
}

/// Tailwind 2 palette subset, shades 50..900.
fn palette_color(name: &str) -> Option<Color> {
    const SHADES: [&str; 10] = ["50", "100", "200", "300", "400", "500", "600", "700", "800", "900"];
    const FAMILIES: [(&str, [u32; 10]); 6] = [
        (
            "gray",
            [
                0xf9fafb, 0xf3f4f6, 0xe5e7eb, 0xd1d5db, 0x9ca3af, 0x6b7280, 0x4b5563, 0x374151,
                0x1f2937, 0x111827,
            ],
        ),
        (
            "red",
            [
                0xfef2f2, 0xfee2e2, 0xfecaca, 0xfca5a5, 0xf87171, 0xef4444, 0xdc2626, 0xb91c1c,
                0x991b1b, 0x7f1d1d,
            ],
        ),
        (
            "yellow",
            [
                0xfffbeb, 0xfef3c7, 0xfde68a, 0xfcd34d, 0xfbbf24, 0xf59e0b, 0xd97706, 0xb45309,
                0x92400e, 0x78350f,
            ],
        ),
        (
            "green",
            [
                0xecfdf5, 0xd1fae5, 0xa7f3d0, 0x6ee7b7, 0x34d399, 0x10b981, 0x059669, 0x047857,
                0x065f46, 0x064e3b,
            ],
        ),
        (
            "blue",
            [
                0xeff6ff, 0xdbeafe, 0xbfdbfe, 0x93c5fd, 0x60a5fa, 0x3b82f6, 0x2563eb, 0x1d4ed8,
                0x1e40af, 0x1e3a8a,
            ],
        ),
        (
            "indigo",
            [
                0xeef2ff, 0xe0e7ff, 0xc7d2fe, 0xa5b4fc, 0x818cf8, 0x6366f1, 0x4f46e5, 0x4338ca,
                0x3730a3, 0x312e81,
            ],
        ),
    ];
    match name {
        "white" => return Some(Color::WHITE),
        "black" => return Some(Color::BLACK),
        "transparent" => return Some(Color::TRANSPARENT),
        _ => {}
    }
    let (family, shade) = name.rsplit_once('-')?;
    let (_, values) = FAMILIES.iter().find(|(f, _)| *f == family)?;
    let idx = SHADES.iter().position(|s| *s == shade)?;
    let v = values[idx];
    Some(Color::rgb8((v >> 16) as u8, (v >> 8) as u8, v as u8))
}

// ---------------------------------------------------------------------------
// Lengths
// ---------------------------------------------------------------------------

/// Parse a CSS length to px. Unitless values other than `0` are rejected.
pub fn parse_length(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (num, unit) = value.split_at(split);
    let n: f32 = num.parse().ok()?;
    let px = match unit.to_ascii_lowercase().as_str() {
        "px" => n,
        "pt" => n * PX_PER_IN / 72.0,
        "pc" => n * PX_PER_IN / 6.0,
        "in" => n * PX_PER_IN,
        "cm" => n * PX_PER_IN / 2.54,
        "mm" => n * PX_PER_IN / 25.4,
        "em" => n * font_size,
        "rem" => n * ROOT_FONT_SIZE,
        _ => return None,
    };
    Some(px)
}

fn parse_dimension(value: &str, font_size: f32) -> Option<Dimension> {
    let value = value.trim();
    if value == "auto" || value == "none" {
        return Some(Dimension::Auto);
    }
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse().ok().map(Dimension::Percent);
    }
    parse_length(value, font_size).map(Dimension::Px)
}

/// Split a value on whitespace outside parentheses.
fn value_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// `url(..)` target, unquoted.
fn parse_url(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?.trim();
    let inner = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    Some(inner.to_string())
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// What the cascade needs besides the element itself.
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    pub sheet: &'a Stylesheet,
    pub media: Media,
    /// Viewport width in px, for responsive class prefixes.
    pub viewport_width: f32,
}

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    ctx: &StyleContext<'_>,
) -> ComputedStyle {
    let mut style = parent.map(ComputedStyle::inherit).unwrap_or_default();
    apply_tag_defaults(&mut style, &element.tag);

    for class in element.classes() {
        if let Some(class) = active_class(class, ctx) {
            apply_utility_class(&mut style, class);
        }
    }

    for (prop, value) in ctx.sheet.declarations_for(element, ctx.media) {
        apply_css_property(&mut style, prop, value);
    }

    if let Some(inline) = element.attr("style") {
        for (prop, value) in parse_declarations(inline) {
            apply_css_property(&mut style, &prop, &value);
        }
    }
    style
}

/// Strip a variant prefix if it is active; `None` when it is not.
fn active_class<'c>(class: &'c str, ctx: &StyleContext<'_>) -> Option<&'c str> {
    let Some((variant, base)) = class.split_once(':') else {
        return Some(class);
    };
    let active = match variant {
        "print" => ctx.media == Media::Print,
        "screen" => ctx.media == Media::Screen,
        "sm" => ctx.viewport_width >= 640.0,
        "md" => ctx.viewport_width >= 768.0,
        "lg" => ctx.viewport_width >= 1024.0,
        "xl" => ctx.viewport_width >= 1280.0,
        "2xl" => ctx.viewport_width >= 1536.0,
        // hover:, focus:, dark: and friends never match in print.
        _ => false,
    };
    active.then_some(base)
}

/// Default styles based on tag semantics, after a Tailwind-style preflight
/// reset (no default margins, headings inherit size and weight).
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    match tag {
        Tag::Span | Tag::Br => s.display = Display::Inline,
        Tag::Th => {
            s.bold = true;
        }
        Tag::Hr => {
            s.border.top = 1.0;
        }
        Tag::Img => {
            s.max_width = Dimension::Percent(100.0);
        }
        t if t.is_metadata() => s.display = Display::None,
        _ => {}
    }
}

/// Apply a single Tailwind utility class.
fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display
        "flex" | "inline-flex" => s.display = Display::Flex,
        "block" | "inline-block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "hidden" => s.display = Display::None,

        // Flex
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-nowrap" => s.flex_wrap = FlexWrap::NoWrap,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
            s.flex_basis = Dimension::Percent(0.0);
        }
        "flex-auto" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
            s.flex_basis = Dimension::Auto;
        }
        "flex-none" => {
            s.flex_grow = 0.0;
            s.flex_shrink = 0.0;
        }
        "flex-grow" | "grow" => s.flex_grow = 1.0,
        "flex-grow-0" | "grow-0" => s.flex_grow = 0.0,
        "flex-shrink" | "shrink" => s.flex_shrink = 1.0,
        "flex-shrink-0" | "shrink-0" => s.flex_shrink = 0.0,

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "justify-around" => s.justify_content = JustifyContent::SpaceAround,
        "justify-evenly" => s.justify_content = JustifyContent::SpaceEvenly,

        "items-start" | "items-baseline" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        // Typography
        "font-thin" | "font-extralight" | "font-light" | "font-normal" | "font-medium" => {
            s.bold = false
        }
        "font-semibold" | "font-bold" | "font-extrabold" | "font-black" => s.bold = true,
        "font-sans" => s.font_family = FontFamily::Helvetica,
        "font-serif" => s.font_family = FontFamily::Times,
        "font-mono" => s.font_family = FontFamily::Courier,
        "italic" => s.italic = true,
        "not-italic" => s.italic = false,
        "underline" => s.underline = true,
        "no-underline" => s.underline = false,
        "uppercase" => s.text_transform = TextTransform::Uppercase,
        "lowercase" => s.text_transform = TextTransform::Lowercase,
        "normal-case" => s.text_transform = TextTransform::None,
        "text-left" | "text-justify" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        // Sizing
        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-px" => s.width = Dimension::Px(1.0),
        "h-full" => s.height = Dimension::Percent(100.0),
        "h-auto" => s.height = Dimension::Auto,
        "h-px" => s.height = Dimension::Px(1.0),
        "min-w-0" => s.min_width = Dimension::Px(0.0),
        "max-w-full" => s.max_width = Dimension::Percent(100.0),
        "max-w-none" => s.max_width = Dimension::Auto,

        // Borders
        "border" => s.border = Edges::all(1.0),
        "border-solid" | "border-dashed" | "border-dotted" | "border-double" => {}
        "border-none" => s.border = Edges::ZERO,

        // Fragmentation
        "break-before-page" => s.break_before = true,
        "break-after-page" => s.break_after = true,
        "break-inside-avoid" | "break-inside-avoid-page" => s.break_inside_avoid = true,

        _ => {
            // Dynamic patterns
            let _ = try_text_size(s, class)
                || try_leading(s, class)
                || try_spacing(s, class)
                || try_gap(s, class)
                || try_size(s, class)
                || try_border_width(s, class)
                || try_color(s, class);
        }
    }
}

/// `text-xs` .. `text-5xl` set both size and line height.
fn try_text_size(s: &mut ComputedStyle, class: &str) -> bool {
    let (size, leading) = match class {
        "text-xs" => (12.0, 16.0),
        "text-sm" => (14.0, 20.0),
        "text-base" => (16.0, 24.0),
        "text-lg" => (18.0, 28.0),
        "text-xl" => (20.0, 28.0),
        "text-2xl" => (24.0, 32.0),
        "text-3xl" => (30.0, 36.0),
        "text-4xl" => (36.0, 40.0),
        "text-5xl" => {
            s.font_size = 48.0;
            s.line_height = LineHeight::Factor(1.0);
            return true;
        }
        _ => return false,
    };
    s.font_size = size;
    s.line_height = LineHeight::Px(leading);
    true
}

fn try_leading(s: &mut ComputedStyle, class: &str) -> bool {
    let Some(rest) = class.strip_prefix("leading-") else {
        return false;
    };
    s.line_height = match rest {
        "none" => LineHeight::Factor(1.0),
        "tight" => LineHeight::Factor(1.25),
        "snug" => LineHeight::Factor(1.375),
        "normal" => LineHeight::Factor(1.5),
        "relaxed" => LineHeight::Factor(1.625),
        "loose" => LineHeight::Factor(2.0),
        n => match spacing_value(n) {
            Some(px) => LineHeight::Px(px),
            None => return false,
        },
    };
    true
}

/// Spacing scale: `N` is N × 4px, `px` is 1px.
fn spacing_value(token: &str) -> Option<f32> {
    if token == "px" {
        return Some(1.0);
    }
    token.parse::<f32>().ok().filter(|v| *v >= 0.0).map(|v| v * 4.0)
}

fn try_spacing(s: &mut ComputedStyle, class: &str) -> bool {
    let Some((prefix, value)) = class.split_once('-') else {
        return false;
    };
    let Some(px) = spacing_value(value) else {
        return false;
    };
    let sides: &[Side] = match prefix.get(1..) {
        Some("") => &ALL_SIDES,
        Some("x") => &[Side::Left, Side::Right],
        Some("y") => &[Side::Top, Side::Bottom],
        Some("t") => &[Side::Top],
        Some("r") => &[Side::Right],
        Some("b") => &[Side::Bottom],
        Some("l") => &[Side::Left],
        _ => return false,
    };
    match prefix.as_bytes().first() {
        Some(b'p') => s.padding.set_sides(sides, px),
        Some(b'm') => s.margin.set_sides(sides, px),
        _ => return false,
    }
    true
}

fn try_gap(s: &mut ComputedStyle, class: &str) -> bool {
    if let Some(v) = class.strip_prefix("gap-x-").and_then(spacing_value) {
        s.column_gap = v;
    } else if let Some(v) = class.strip_prefix("gap-y-").and_then(spacing_value) {
        s.row_gap = v;
    } else if let Some(v) = class.strip_prefix("gap-").and_then(spacing_value) {
        s.row_gap = v;
        s.column_gap = v;
    } else {
        return false;
    }
    true
}

fn fraction(token: &str) -> Option<f32> {
    let (n, d) = token.split_once('/')?;
    let n: f32 = n.parse().ok()?;
    let d: f32 = d.parse().ok()?;
    (d > 0.0).then(|| n / d * 100.0)
}

fn max_width_token(token: &str) -> Option<f32> {
    Some(match token {
        "xs" => 320.0,
        "sm" => 384.0,
        "md" => 448.0,
        "lg" => 512.0,
        "xl" => 576.0,
        "2xl" => 672.0,
        "3xl" => 768.0,
        "4xl" => 896.0,
        "5xl" => 1024.0,
        "6xl" => 1152.0,
        "7xl" => 1280.0,
        _ => return None,
    })
}

fn try_size(s: &mut ComputedStyle, class: &str) -> bool {
    if let Some(rest) = class.strip_prefix("w-") {
        if let Some(pct) = fraction(rest) {
            s.width = Dimension::Percent(pct);
        } else if let Some(px) = spacing_value(rest) {
            s.width = Dimension::Px(px);
        } else {
            return false;
        }
    } else if let Some(rest) = class.strip_prefix("h-") {
        match spacing_value(rest) {
            Some(px) => s.height = Dimension::Px(px),
            None => return false,
        }
    } else if let Some(px) = class.strip_prefix("max-w-").and_then(max_width_token) {
        s.max_width = Dimension::Px(px);
    } else {
        return false;
    }
    true
}

fn try_border_width(s: &mut ComputedStyle, class: &str) -> bool {
    let Some(rest) = class.strip_prefix("border-") else {
        return false;
    };
    let (side, width) = match rest.split_once('-') {
        Some((side, w)) if matches!(side, "t" | "r" | "b" | "l") => (Some(side), w),
        _ if matches!(rest, "t" | "r" | "b" | "l") => (Some(rest), "1"),
        _ => (None, rest),
    };
    let width = if width == "1" {
        1.0
    } else {
        match width.parse::<f32>() {
            Ok(w) if matches!(width, "0" | "2" | "4" | "8") => w,
            _ => return false,
        }
    };
    match side {
        Some("t") => s.border.top = width,
        Some("r") => s.border.right = width,
        Some("b") => s.border.bottom = width,
        Some("l") => s.border.left = width,
        _ => s.border = Edges::all(width),
    }
    true
}

fn try_color(s: &mut ComputedStyle, class: &str) -> bool {
    if let Some(c) = class.strip_prefix("text-").and_then(palette_color) {
        s.color = c;
    } else if let Some(c) = class.strip_prefix("bg-").and_then(palette_color) {
        s.background_color = c;
    } else if let Some(c) = class.strip_prefix("border-").and_then(palette_color) {
        s.border_color = c;
    } else {
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// CSS properties
// ---------------------------------------------------------------------------

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let fs = s.font_size;
    match prop {
        "display" => {
            s.display = match val {
                "flex" | "inline-flex" => Display::Flex,
                "block" | "inline-block" | "list-item" | "table" | "table-row"
                | "table-cell" | "table-row-group" | "table-header-group" => Display::Block,
                "inline" => Display::Inline,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" | "row-reverse" => FlexDirection::Row,
                "column" | "column-reverse" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = if val == "wrap" {
                FlexWrap::Wrap
            } else {
                FlexWrap::NoWrap
            }
        }
        "flex" => apply_flex_shorthand(s, val),
        "flex-grow" => {
            if let Ok(v) = val.parse() {
                s.flex_grow = v;
            }
        }
        "flex-shrink" => {
            if let Ok(v) = val.parse() {
                s.flex_shrink = v;
            }
        }
        "flex-basis" => {
            if let Some(d) = parse_dimension(val, fs) {
                s.flex_basis = d;
            }
        }
        "justify-content" => {
            s.justify_content = match val {
                "flex-start" | "start" | "left" | "normal" => JustifyContent::Start,
                "flex-end" | "end" | "right" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => s.justify_content,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" | "baseline" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                "stretch" | "normal" => AlignItems::Stretch,
                _ => s.align_items,
            }
        }
        "gap" => {
            let tokens = value_tokens(val);
            let row = tokens.first().and_then(|t| parse_length(t, fs));
            let col = tokens.get(1).and_then(|t| parse_length(t, fs)).or(row);
            if let (Some(r), Some(c)) = (row, col) {
                s.row_gap = r;
                s.column_gap = c;
            }
        }
        "row-gap" => {
            if let Some(px) = parse_length(val, fs) {
                s.row_gap = px;
            }
        }
        "column-gap" => {
            if let Some(px) = parse_length(val, fs) {
                s.column_gap = px;
            }
        }
        "font-family" => s.font_family = FontFamily::from_css(val),
        "font-size" => {
            let size = match val.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f32>().ok().map(|p| fs * p / 100.0),
                None => parse_length(val, fs),
            };
            if let Some(px) = size {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.bold = match val {
                "bold" | "bolder" => true,
                "normal" | "lighter" => false,
                n => n.parse::<u16>().map(|w| w >= 600).unwrap_or(s.bold),
            }
        }
        "font-style" => s.italic = matches!(val, "italic" | "oblique"),
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "background" => {
            for token in value_tokens(val) {
                if let Some(url) = parse_url(token) {
                    s.background_image = Some(url);
                } else if let Some(c) = Color::parse(token) {
                    s.background_color = c;
                }
            }
        }
        "background-image" => s.background_image = parse_url(val),
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-decoration" | "text-decoration-line" => s.underline = val.contains("underline"),
        "text-transform" => {
            s.text_transform = match val {
                "uppercase" => TextTransform::Uppercase,
                "lowercase" => TextTransform::Lowercase,
                _ => TextTransform::None,
            }
        }
        "width" => {
            if let Some(d) = parse_dimension(val, fs) {
                s.width = d;
            }
        }
        "height" => {
            if let Some(d) = parse_dimension(val, fs) {
                s.height = d;
            }
        }
        "min-width" => {
            if let Some(d) = parse_dimension(val, fs) {
                s.min_width = d;
            }
        }
        "max-width" => {
            if let Some(d) = parse_dimension(val, fs) {
                s.max_width = d;
            }
        }
        "margin" => apply_box_shorthand(&mut s.margin, val, fs),
        "padding" => apply_box_shorthand(&mut s.padding, val, fs),
        "border-width" => apply_box_shorthand(&mut s.border, val, fs),
        "border" => apply_border_shorthand(s, &ALL_SIDES, val),
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "border-style" => {
            if matches!(val, "none" | "hidden") {
                s.border = Edges::ZERO;
            }
        }
        "line-height" => {
            if val == "normal" {
                s.line_height = LineHeight::Factor(1.2);
            } else if let Some(pct) = val.strip_suffix('%') {
                if let Ok(p) = pct.trim().parse::<f32>() {
                    s.line_height = LineHeight::Px(fs * p / 100.0);
                }
            } else if let Ok(v) = val.parse::<f32>() {
                s.line_height = LineHeight::Factor(v);
            } else if let Some(px) = parse_length(val, fs) {
                s.line_height = LineHeight::Px(px);
            }
        }
        "break-before" | "page-break-before" => {
            s.break_before = matches!(val, "page" | "always" | "left" | "right")
        }
        "break-after" | "page-break-after" => {
            s.break_after = matches!(val, "page" | "always" | "left" | "right")
        }
        "break-inside" | "page-break-inside" => {
            s.break_inside_avoid = matches!(val, "avoid" | "avoid-page")
        }
        _ => apply_side_property(s, prop, val),
    }
}

/// `margin-top`, `padding-left`, `border-bottom`, `border-right-width`, ...
fn apply_side_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let fs = s.font_size;
    let (group, rest) = match prop.split_once('-') {
        Some(pair) => pair,
        None => return,
    };
    let (side_name, suffix) = rest.split_once('-').unwrap_or((rest, ""));
    let side = match side_name {
        "top" => Side::Top,
        "right" => Side::Right,
        "bottom" => Side::Bottom,
        "left" => Side::Left,
        _ => return,
    };
    match (group, suffix) {
        ("margin", "") => {
            if let Some(px) = parse_length(val, fs) {
                s.margin.set(side, px);
            }
        }
        ("padding", "") => {
            if let Some(px) = parse_length(val, fs) {
                s.padding.set(side, px);
            }
        }
        ("border", "") => apply_border_shorthand(s, &[side], val),
        ("border", "width") => {
            if let Some(px) = border_width_token(val, fs) {
                s.border.set(side, px);
            }
        }
        ("border", "color") => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        ("border", "style") => {
            if matches!(val, "none" | "hidden") {
                s.border.set(side, 0.0);
            }
        }
        _ => {}
    }
}

fn apply_box_shorthand(edges: &mut Edges, val: &str, font_size: f32) {
    if let Some(parsed) = parse_edges(val, font_size) {
        *edges = parsed;
    }
}

/// One to four lengths in `margin` / `padding` shorthand order.
pub fn parse_edges(val: &str, font_size: f32) -> Option<Edges> {
    let parts: Vec<f32> = value_tokens(val)
        .into_iter()
        .filter_map(|p| border_width_token(p, font_size))
        .collect();
    let (top, right, bottom, left) = match parts.as_slice() {
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return None,
    };
    Some(Edges {
        top,
        right,
        bottom,
        left,
    })
}

fn border_width_token(token: &str, font_size: f32) -> Option<f32> {
    match token {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        // `auto` margins are not supported; treat as zero.
        "auto" => Some(0.0),
        t => parse_length(t, font_size),
    }
}

/// `border` / `border-<side>`: width, style and colour in any order.
fn apply_border_shorthand(s: &mut ComputedStyle, sides: &[Side], val: &str) {
    let mut width: Option<f32> = None;
    let mut visible = true;
    let mut styled = false;
    for token in value_tokens(val) {
        match token {
            "none" | "hidden" => visible = false,
            "solid" | "dashed" | "dotted" | "double" | "groove" | "ridge" | "inset" | "outset" => {
                styled = true
            }
            t => {
                if let Some(px) = border_width_token(t, s.font_size) {
                    width = Some(px);
                } else if let Some(c) = Color::parse(t) {
                    s.border_color = c;
                }
            }
        }
    }
    let width = match (visible, styled) {
        (false, _) | (true, false) => 0.0,
        (true, true) => width.unwrap_or(3.0),
    };
    s.border.set_sides(sides, width);
}

fn apply_flex_shorthand(s: &mut ComputedStyle, val: &str) {
    let tokens = value_tokens(val);
    match tokens.as_slice() {
        ["none"] => {
            s.flex_grow = 0.0;
            s.flex_shrink = 0.0;
            s.flex_basis = Dimension::Auto;
        }
        ["auto"] => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
            s.flex_basis = Dimension::Auto;
        }
        [grow] => {
            if let Ok(g) = grow.parse() {
                s.flex_grow = g;
                s.flex_shrink = 1.0;
                s.flex_basis = Dimension::Percent(0.0);
            }
        }
        [grow, shrink] => {
            if let (Ok(g), Ok(sh)) = (grow.parse(), shrink.parse()) {
                s.flex_grow = g;
                s.flex_shrink = sh;
                s.flex_basis = Dimension::Percent(0.0);
            }
        }
        [grow, shrink, basis, ..] => {
            if let (Ok(g), Ok(sh)) = (grow.parse(), shrink.parse()) {
                s.flex_grow = g;
                s.flex_shrink = sh;
                s.flex_basis = parse_dimension(basis, s.font_size).unwrap_or(Dimension::Auto);
            }
        }
        [] => {}
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build a styled tree from a DOM tree, resolving styles top-down. Elements
/// that compute to `display: none` are dropped with their subtree.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    ctx: &StyleContext<'_>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style, ctx);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style), ctx);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                // Text renders inline with the parent's inherited properties
                // only; box-model properties stay on the parent.
                let style = parent_style.map(ComputedStyle::inherit).unwrap_or_default();
                let style = ComputedStyle {
                    underline: parent_style.is_some_and(|p| p.underline),
                    display: Display::Inline,
                    ..style
                };
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
        }
    }
    result
}
