//! Report document model.
//!
//! Every value here has already passed through [`crate::validate`]: optional
//! settings are resolved to concrete defaults, so renderers never null-check
//! configuration. The model is built fresh per request and never mutated
//! after validation, except by the asset hydrator which swaps remote image
//! references for inline ones.

use std::collections::BTreeMap;

use serde::Serialize;

/// Root document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub company: String,
    pub report_name: String,
    pub colors: Palette,
    pub assets: Assets,
    pub configs: Configs,
    /// Never empty.
    pub components: Vec<Component>,
}

/// Fixed five-slot colour palette. Values are CSS colour strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: String,
    pub accent: String,
    pub text: String,
    pub muted: String,
    pub border: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: "#1f2937".to_string(),
            accent: "#2563eb".to_string(),
            text: "#111827".to_string(),
            muted: "#6b7280".to_string(),
            border: "#d1d5db".to_string(),
        }
    }
}

/// Report-level image references: remote URLs before hydration, `data:` URIs
/// after. `None` means absent or unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    pub logo: Option<String>,
    pub header_image: Option<String>,
    pub footer_image: Option<String>,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Configs {
    pub page: PageConfig,
    pub font: FontConfig,
    pub header: HeaderConfig,
    pub footer: FooterConfig,
    pub date: DateConfig,
    pub table: TableConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    pub const VARIANTS: &'static [&'static str] = &["A4", "Letter"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A4" => Some(Self::A4),
            "Letter" => Some(Self::Letter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub const VARIANTS: &'static [&'static str] = &["portrait", "landscape"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageConfig {
    pub size: PageSize,
    pub orientation: Orientation,
    /// CSS length used as the content padding of the rendered page.
    pub margin: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: "12mm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    pub family: String,
    /// Size token (`xs`..`xl`) or a raw CSS length.
    pub size: String,
    /// Line-height token (`tight`..`loose`) or a raw CSS value.
    pub line_height: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Helvetica, Arial, sans-serif".to_string(),
            size: "sm".to_string(),
            line_height: "normal".to_string(),
        }
    }
}

impl FontConfig {
    /// CSS `font-size` for the size token.
    pub fn size_css(&self) -> &str {
        match self.size.as_str() {
            "xs" => "12px",
            "sm" => "14px",
            "base" => "16px",
            "lg" => "18px",
            "xl" => "20px",
            other => other,
        }
    }

    /// CSS `line-height` for the line-height token.
    pub fn line_height_css(&self) -> &str {
        match self.line_height.as_str() {
            "tight" => "1.25",
            "snug" => "1.375",
            "normal" => "1.5",
            "relaxed" => "1.625",
            "loose" => "2",
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub const VARIANTS: &'static [&'static str] = &["left", "center", "right"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Utility class for block text alignment.
    pub fn text_class(self) -> &'static str {
        match self {
            Self::Left => "text-left",
            Self::Center => "text-center",
            Self::Right => "text-right",
        }
    }

    /// CSS `justify-content` value for a flex row.
    pub fn justify(self) -> &'static str {
        match self {
            Self::Left => "flex-start",
            Self::Center => "center",
            Self::Right => "flex-end",
        }
    }

    /// Utility class equivalent of [`Align::justify`].
    pub fn justify_class(self) -> &'static str {
        match self {
            Self::Left => "justify-start",
            Self::Center => "justify-center",
            Self::Right => "justify-end",
        }
    }
}

/// Whether the running header is a fixed band on every page or rendered once
/// in-flow at the top of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    All,
    First,
}

impl RepeatMode {
    pub const VARIANTS: &'static [&'static str] = &["all", "first"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "first" => Some(Self::First),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderConfig {
    pub show: bool,
    pub align: Align,
    pub repeat: RepeatMode,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            show: true,
            align: Align::Left,
            repeat: RepeatMode::All,
        }
    }
}

impl HeaderConfig {
    /// The header is drawn by the print engine on every page.
    pub fn is_running(&self) -> bool {
        self.show && self.repeat == RepeatMode::All
    }
}

/// Literal placeholder for the current page number in footer text.
pub const PAGE_PLACEHOLDER: &str = "{{page}}";
/// Literal placeholder for the total page count in footer text.
pub const PAGES_PLACEHOLDER: &str = "{{pages}}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FooterConfig {
    pub show: bool,
    pub text: String,
    pub align: Align,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            show: true,
            text: format!("Page {PAGE_PLACEHOLDER} of {PAGES_PLACEHOLDER}"),
            align: Align::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateConfig {
    pub align: Align,
    /// Accepted and carried, but not consulted when formatting dates.
    pub format: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            align: Align::Right,
            format: "DD MMM YYYY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableConfig {
    /// CSS border-style token for cell borders (`none` disables them).
    pub border: String,
    pub striped: bool,
    pub compact: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            border: "solid".to_string(),
            striped: true,
            compact: false,
        }
    }
}

/// Component-local styling overrides: semantic slot name → utility tokens.
pub type StyleOverrides = BTreeMap<String, String>;

/// One content unit of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub id: Option<String>,
    pub style: StyleOverrides,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            id: None,
            style: StyleOverrides::new(),
            kind,
        }
    }

    /// Override tokens for `slot`, or the empty string.
    pub fn slot(&self, slot: &str) -> &str {
        self.style.get(slot).map(String::as_str).unwrap_or("")
    }
}

/// Closed set of component variants. Adding one means adding a variant here,
/// a props validator and a renderer arm; the compiler enforces the latter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "props", rename_all = "camelCase")]
pub enum ComponentKind {
    Header {
        title: String,
        subtitle: Option<String>,
    },
    Subheader {
        text: String,
    },
    Date {
        value: Option<String>,
        label: Option<String>,
    },
    Para {
        text: String,
    },
    Divider,
    Spacer {
        size: SpacerSize,
    },
    Pagebreak,
    Signature {
        lines: u8,
        label: Option<String>,
    },
    FooterText {
        text: String,
    },
    Table(TableProps),
    Image(ImageProps),
}

impl ComponentKind {
    pub const TYPES: &'static [&'static str] = &[
        "header",
        "subheader",
        "date",
        "para",
        "divider",
        "spacer",
        "pagebreak",
        "signature",
        "footerText",
        "table",
        "image",
    ];

    /// Discriminator as it appears in input documents.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Header { .. } => "header",
            Self::Subheader { .. } => "subheader",
            Self::Date { .. } => "date",
            Self::Para { .. } => "para",
            Self::Divider => "divider",
            Self::Spacer { .. } => "spacer",
            Self::Pagebreak => "pagebreak",
            Self::Signature { .. } => "signature",
            Self::FooterText { .. } => "footerText",
            Self::Table(_) => "table",
            Self::Image(_) => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacerSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl SpacerSize {
    pub const VARIANTS: &'static [&'static str] = &["xs", "sm", "md", "lg", "xl"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "xs" => Some(Self::Xs),
            "sm" => Some(Self::Sm),
            "md" => Some(Self::Md),
            "lg" => Some(Self::Lg),
            "xl" => Some(Self::Xl),
            _ => None,
        }
    }

    /// Vertical space in CSS pixels. Strictly increasing from `Xs` to `Xl`.
    pub fn height_px(self) -> u32 {
        match self {
            Self::Xs => 4,
            Self::Sm => 8,
            Self::Md => 16,
            Self::Lg => 32,
            Self::Xl => 64,
        }
    }
}

pub const MAX_SIGNATURE_LINES: u8 = 5;

/// A table cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(serde_json::Number),
    Empty,
}

impl Cell {
    /// Display text; `Empty` renders as nothing.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableProps {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub title: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProps {
    pub url: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}
