//! Built-in print engine.
//!
//! Parses the assembled document, resolves styles for the emulated media,
//! lays the body out with Taffy, paginates it under the header and footer
//! fragments and writes the result with printpdf. No scripts run and nothing
//! is fetched: images must already be inlined as data URIs.

use std::time::{Duration, Instant};

use crate::error::{ExportError, RenderFailure};
use crate::print::{Media, PrintEngine, PrintOptions, PrintSession, WaitUntil};

pub mod css;
pub mod dom;
pub mod fonts;
pub mod layout;
pub mod paginate;
pub mod pdf;
pub mod plan;
pub mod style;
pub mod text;

use css::Stylesheet;
use dom::{collect_elements, find_element, parse_html, DomNode, Tag};
use layout::{intrinsic_size, ImageSizes};
use plan::DocumentPlan;

/// Launches [`ForgeSession`]s.
#[derive(Debug, Clone, Default)]
pub struct ForgeEngine {
    timeout: Option<Duration>,
    max_pages: Option<usize>,
}

impl ForgeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`ExportError::Timeout`] when load plus print exceed `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Refuse to print documents longer than `pages`.
    pub fn with_page_limit(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }
}

impl PrintEngine for ForgeEngine {
    fn launch(&self) -> Result<Box<dyn PrintSession>, ExportError> {
        log::debug!("launching built-in print engine");
        Ok(Box::new(ForgeSession::new(self.timeout, self.max_pages)))
    }
}

struct Loaded {
    dom: Vec<DomNode>,
    sheet: Stylesheet,
    title: String,
    started: Instant,
}

/// One document's worth of engine state.
pub struct ForgeSession {
    loaded: Option<Loaded>,
    media: Media,
    timeout: Option<Duration>,
    max_pages: Option<usize>,
    images: ImageSizes,
    closed: bool,
}

impl ForgeSession {
    pub fn new(timeout: Option<Duration>, max_pages: Option<usize>) -> Self {
        Self {
            loaded: None,
            media: Media::Screen,
            timeout,
            max_pages,
            images: ImageSizes::default(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), ExportError> {
        if self.closed {
            return Err(ExportError::Load("session is closed".into()));
        }
        Ok(())
    }

    /// Paginate the loaded document without writing PDF bytes.
    pub fn plan(&mut self, options: &PrintOptions) -> Result<DocumentPlan, ExportError> {
        self.ensure_open()?;
        let loaded = self
            .loaded
            .as_ref()
            .ok_or_else(|| ExportError::Generate("no document loaded".into()))?;

        let plan = paginate::paginate(
            &loaded.dom,
            &loaded.sheet,
            self.media,
            options,
            &loaded.title,
            &mut self.images,
        )
        .map_err(|e| ExportError::Generate(format!("layout failed: {e}")))?;

        if let Some(limit) = self.max_pages {
            if plan.page_count() > limit {
                return Err(ExportError::Generate(format!(
                    "document has {} pages, limit is {limit}",
                    plan.page_count()
                )));
            }
        }
        if let Some(timeout) = self.timeout {
            let elapsed = loaded.started.elapsed();
            if elapsed > timeout {
                return Err(ExportError::Timeout(format!(
                    "layout took {elapsed:?}, limit is {timeout:?}"
                )));
            }
        }
        Ok(plan)
    }
}

/// Problems a browser would report while loading: anything that needs the
/// network or a script runtime.
fn load_diagnostics(dom: &[DomNode]) -> Vec<RenderFailure> {
    let mut failures = Vec::new();

    let mut scripts = Vec::new();
    collect_elements(dom, &Tag::Script, &mut scripts);
    if !scripts.is_empty() {
        failures.push(RenderFailure::new(format!(
            "{} script element(s) not executed",
            scripts.len()
        )));
    }

    let mut links = Vec::new();
    collect_elements(dom, &Tag::Link, &mut links);
    for link in links {
        log::debug!(
            "external stylesheet not loaded: {}",
            link.attr("href").unwrap_or_default()
        );
    }

    let mut images = Vec::new();
    collect_elements(dom, &Tag::Img, &mut images);
    for img in images {
        let src = img.attr("src").unwrap_or_default();
        if !crate::assets::is_inline(src) {
            let shown: String = src.chars().take(80).collect();
            failures.push(RenderFailure::new(format!("image not inlined: {shown}")));
        } else if intrinsic_size(src).is_none() {
            failures.push(RenderFailure::new("image could not be decoded"));
        }
    }
    failures
}

impl PrintSession for ForgeSession {
    fn load(&mut self, html: &str, wait: WaitUntil) -> Result<Vec<RenderFailure>, ExportError> {
        self.ensure_open()?;
        if html.trim().is_empty() {
            return Err(ExportError::Load("empty document".into()));
        }
        let started = Instant::now();
        let dom = parse_html(html);

        let mut sheet = Stylesheet::default();
        let mut styles = Vec::new();
        collect_elements(&dom, &Tag::Style, &mut styles);
        for style in styles {
            sheet.extend(Stylesheet::parse(&style.text_content()));
        }
        let title = find_element(&dom, &Tag::Title)
            .map(|t| t.text_content().trim().to_string())
            .unwrap_or_default();

        let failures = load_diagnostics(&dom);
        log::debug!(
            "loaded document ({} bytes, {} rule(s), wait {wait:?})",
            html.len(),
            sheet.rules.len()
        );
        self.loaded = Some(Loaded {
            dom,
            sheet,
            title,
            started,
        });
        Ok(failures)
    }

    fn emulate_media(&mut self, media: Media) -> Result<(), ExportError> {
        self.ensure_open()?;
        log::debug!("emulating {media} media");
        self.media = media;
        Ok(())
    }

    fn print(&mut self, options: &PrintOptions) -> Result<Vec<u8>, ExportError> {
        let plan = self.plan(options)?;
        let bytes = pdf::render_pdf(&plan).map_err(ExportError::Generate)?;
        log::info!(
            "printed {} page(s), {} bytes",
            plan.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn close(&mut self) {
        if !self.closed {
            log::debug!("closing print session");
        }
        self.closed = true;
        self.loaded = None;
    }
}
