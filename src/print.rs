//! Print-engine collaborator interface.
//!
//! An engine is launched once per export and yields a session. The session
//! loads the assembled document, switches to print media and produces PDF
//! bytes. Sessions are held through [`SessionGuard`], which closes them on
//! every exit path.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{ExportError, RenderFailure};
use crate::schema::{Orientation, PageConfig, PageSize};

/// A4 in PDF points.
pub const A4_PT: (f32, f32) = (595.28, 841.89);
/// US Letter in PDF points.
pub const LETTER_PT: (f32, f32) = (612.0, 792.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperFormat {
    #[default]
    A4,
    Letter,
}

impl PaperFormat {
    /// Portrait width and height in points.
    pub fn size_pt(self) -> (f32, f32) {
        match self {
            Self::A4 => A4_PT,
            Self::Letter => LETTER_PT,
        }
    }
}

impl From<PageSize> for PaperFormat {
    fn from(size: PageSize) -> Self {
        match size {
            PageSize::A4 => Self::A4,
            PageSize::Letter => Self::Letter,
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };
}

/// Everything the engine needs to paginate a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub format: PaperFormat,
    pub landscape: bool,
    pub margins: Margins,
    pub print_background: bool,
    /// Evaluate `header_template` / `footer_template` on every page.
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            landscape: false,
            margins: Margins::ZERO,
            print_background: true,
            display_header_footer: false,
            header_template: String::new(),
            footer_template: String::new(),
        }
    }
}

impl PrintOptions {
    /// Geometry for a report page configuration, with flush margins.
    pub fn for_page(page: &PageConfig) -> Self {
        Self {
            format: page.size.into(),
            landscape: page.orientation == Orientation::Landscape,
            ..Self::default()
        }
    }

    pub fn is_letter(&self) -> bool {
        self.format == PaperFormat::Letter
    }

    /// Physical page width and height in points, after orientation.
    pub fn page_size_pt(&self) -> (f32, f32) {
        let (w, h) = self.format.size_pt();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }
}

/// Media type the document's styles are evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Media {
    #[default]
    Screen,
    Print,
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Media::Screen => "screen",
            Media::Print => "print",
        })
    }
}

/// Load state to wait for before `load` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    Load,
    #[default]
    NetworkIdle,
}

/// Launches print sessions. One session serves one export.
pub trait PrintEngine: Send + Sync {
    fn launch(&self) -> Result<Box<dyn PrintSession>, ExportError>;
}

pub trait PrintSession {
    /// Load a complete document. Page-level problems that do not prevent
    /// printing are returned as diagnostics.
    fn load(&mut self, html: &str, wait: WaitUntil) -> Result<Vec<RenderFailure>, ExportError>;

    fn emulate_media(&mut self, media: Media) -> Result<(), ExportError>;

    fn print(&mut self, options: &PrintOptions) -> Result<Vec<u8>, ExportError>;

    /// Release the session. Called exactly once.
    fn close(&mut self);
}

/// Owns a launched session and closes it when dropped.
pub struct SessionGuard {
    session: Box<dyn PrintSession>,
    released: bool,
}

impl SessionGuard {
    pub fn launch(engine: &dyn PrintEngine) -> Result<Self, ExportError> {
        Ok(Self {
            session: engine.launch()?,
            released: false,
        })
    }

    /// Close the session now instead of at drop.
    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.released {
            self.released = true;
            self.session.close();
        }
    }
}

impl Deref for SessionGuard {
    type Target = dyn PrintSession;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close_once();
    }
}
