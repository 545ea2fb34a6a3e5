//! Export orchestrator: validate, hydrate, render, print.
//!
//! Validation failures return before anything expensive runs. Every path
//! that launches a print session releases it before returning.

use std::time::Instant;

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

use crate::assets::{hydrate, AssetFetcher};
use crate::document::render_document;
use crate::error::{ExportError, ForgeError, RenderFailure};
use crate::pagination::{footer_fragment, header_fragment};
use crate::print::{Media, PrintEngine, PrintOptions, SessionGuard, WaitUntil};
use crate::schema::Report;
use crate::settings::Settings;
use crate::validate::validate_str;

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    /// Filesystem-safe, ends in `.pdf`.
    pub filename: String,
    /// Load-phase problems the engine reported. Informational only.
    pub diagnostics: Vec<RenderFailure>,
}

impl ExportOutput {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Validate and render the preview document. No assets are fetched.
pub fn preview_html(json: &str, settings: &Settings, today: NaiveDate) -> Result<String, ForgeError> {
    let report = validate_str(json)?;
    Ok(render_document(&report, settings, today))
}

/// Print geometry for `report`: configured paper, flush margins and the
/// running header and footer fragments.
pub fn print_options(report: &Report) -> PrintOptions {
    PrintOptions {
        display_header_footer: true,
        header_template: header_fragment(report),
        footer_template: footer_fragment(report),
        ..PrintOptions::for_page(&report.configs.page)
    }
}

/// Run the full export sequence for one JSON document.
pub fn export_pdf(
    json: &str,
    settings: &Settings,
    fetcher: &dyn AssetFetcher,
    engine: &dyn PrintEngine,
    today: NaiveDate,
) -> Result<ExportOutput, ForgeError> {
    let started = Instant::now();
    let report = validate_str(json)?;
    log::info!("exporting {:?}", report.report_name);

    let report = hydrate(report, fetcher);
    log::debug!("hydrated assets in {:?}", started.elapsed());

    let html = render_document(&report, settings, today);
    let options = print_options(&report);
    log::debug!(
        "rendered {} bytes of markup in {:?}",
        html.len(),
        started.elapsed()
    );

    let (bytes, diagnostics) = print_document(engine, &html, &options)?;
    let filename = safe_filename(&report.report_name, &settings.default_filename);
    log::info!(
        "exported {filename} ({} bytes) in {:?}",
        bytes.len(),
        started.elapsed()
    );
    Ok(ExportOutput {
        bytes,
        filename,
        diagnostics,
    })
}

fn print_document(
    engine: &dyn PrintEngine,
    html: &str,
    options: &PrintOptions,
) -> Result<(Vec<u8>, Vec<RenderFailure>), ExportError> {
    let mut session = SessionGuard::launch(engine)?;
    let diagnostics = session.load(html, WaitUntil::NetworkIdle)?;
    for failure in &diagnostics {
        log::warn!("{failure}");
    }
    session.emulate_media(Media::Print)?;
    let bytes = session.print(options)?;
    session.release();

    if bytes.is_empty() {
        return Err(ExportError::Generate("engine returned no output".into()));
    }
    Ok((bytes, diagnostics))
}

/// Download filename for a report name: ASCII letters, digits, `.`, `_`
/// and `-` only, with `.pdf` appended.
pub fn safe_filename(name: &str, fallback: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.nfkd().filter(char::is_ascii) {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        let is_sep = matches!(c, '-' | '_');
        if is_sep && stem.ends_with(['-', '_']) {
            continue;
        }
        stem.push(c);
    }
    let stem = stem.trim_matches(|c| matches!(c, '-' | '_' | '.'));
    let stem = if stem.is_empty() { fallback } else { stem };
    format!("{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FetchedAsset, OfflineFetcher};
    use crate::error::AssetError;
    use crate::print::{PaperFormat, PrintSession};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Calls {
        launches: usize,
        closes: usize,
        html: String,
        waits: Vec<WaitUntil>,
        media: Vec<Media>,
        options: Vec<PrintOptions>,
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Fail {
        Nothing,
        Launch,
        Load,
        Print,
    }

    struct RecordingEngine {
        calls: Arc<Mutex<Calls>>,
        fail: Fail,
    }

    impl RecordingEngine {
        fn new(fail: Fail) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Calls::default())),
                fail,
            }
        }

        fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
            self.calls.lock().unwrap()
        }
    }

    struct RecordingSession {
        calls: Arc<Mutex<Calls>>,
        fail: Fail,
    }

    impl PrintEngine for RecordingEngine {
        fn launch(&self) -> Result<Box<dyn PrintSession>, ExportError> {
            if self.fail == Fail::Launch {
                return Err(ExportError::Launch("no browser".into()));
            }
            self.calls.lock().unwrap().launches += 1;
            Ok(Box::new(RecordingSession {
                calls: Arc::clone(&self.calls),
                fail: self.fail,
            }))
        }
    }

    impl PrintSession for RecordingSession {
        fn load(&mut self, html: &str, wait: WaitUntil) -> Result<Vec<RenderFailure>, ExportError> {
            if self.fail == Fail::Load {
                return Err(ExportError::Load("net::ERR_FAILED".into()));
            }
            let mut calls = self.calls.lock().unwrap();
            calls.html = html.to_string();
            calls.waits.push(wait);
            Ok(vec![RenderFailure::new("console error")])
        }

        fn emulate_media(&mut self, media: Media) -> Result<(), ExportError> {
            self.calls.lock().unwrap().media.push(media);
            Ok(())
        }

        fn print(&mut self, options: &PrintOptions) -> Result<Vec<u8>, ExportError> {
            if self.fail == Fail::Print {
                return Err(ExportError::Timeout("30s".into()));
            }
            self.calls.lock().unwrap().options.push(options.clone());
            Ok(b"%PDF-1.7 recorded".to_vec())
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().closes += 1;
        }
    }

    struct Unreachable;

    impl AssetFetcher for Unreachable {
        fn fetch(&self, _: &str) -> Result<FetchedAsset, AssetError> {
            Err(AssetError::Transport("connection refused".into()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    const MINIMAL: &str =
        r#"{"reportName":"Q1 Review","components":[{"type":"para","props":{"text":"hi"}}]}"#;

    #[test]
    fn exports_with_print_media_after_idle_load() {
        let engine = RecordingEngine::new(Fail::Nothing);
        let out = export_pdf(MINIMAL, &Settings::offline(), &OfflineFetcher, &engine, today()).unwrap();
        assert_eq!(out.bytes, b"%PDF-1.7 recorded");
        assert_eq!(out.filename, "Q1-Review.pdf");
        assert_eq!(
            out.content_disposition(),
            "attachment; filename=\"Q1-Review.pdf\""
        );
        assert_eq!(out.diagnostics, vec![RenderFailure::new("console error")]);

        let calls = engine.calls();
        assert_eq!((calls.launches, calls.closes), (1, 1));
        assert_eq!(calls.waits, vec![WaitUntil::NetworkIdle]);
        assert_eq!(calls.media, vec![Media::Print]);
        assert!(calls.html.contains("Q1 Review"));
        let options = &calls.options[0];
        assert!(options.display_header_footer);
        assert!(options.print_background);
        assert!(options.footer_template.contains("pageNumber"));
    }

    #[test]
    fn landscape_letter_geometry() {
        let engine = RecordingEngine::new(Fail::Nothing);
        let json = r#"{"configs":{"page":{"size":"Letter","orientation":"landscape"}},
            "components":[{"type":"divider"}]}"#;
        export_pdf(json, &Settings::offline(), &OfflineFetcher, &engine, today()).unwrap();
        let calls = engine.calls();
        let options = &calls.options[0];
        assert!(options.landscape);
        assert!(options.is_letter());
        assert_eq!(options.format, PaperFormat::Letter);
        assert_eq!(options.page_size_pt(), (792.0, 612.0));
    }

    #[test]
    fn validation_failure_never_launches() {
        let engine = RecordingEngine::new(Fail::Nothing);
        let err = export_pdf(
            r#"{"components":[]}"#,
            &Settings::offline(),
            &OfflineFetcher,
            &engine,
            today(),
        )
        .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 422);
        match err {
            ForgeError::Validation(v) => assert!(v.has_path("components")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(engine.calls().launches, 0);
    }

    #[test]
    fn engine_failures_release_the_session() {
        for fail in [Fail::Load, Fail::Print] {
            let engine = RecordingEngine::new(fail);
            let err = export_pdf(MINIMAL, &Settings::offline(), &OfflineFetcher, &engine, today())
                .unwrap_err();
            assert_eq!(err.status_code(), 500);
            let calls = engine.calls();
            assert_eq!((calls.launches, calls.closes), (1, 1));
        }
    }

    #[test]
    fn launch_failure_is_an_export_error() {
        let engine = RecordingEngine::new(Fail::Launch);
        let err =
            export_pdf(MINIMAL, &Settings::offline(), &OfflineFetcher, &engine, today()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Export(ExportError::Launch(ref detail)) if detail == "no browser"
        ));
    }

    #[test]
    fn unreachable_logo_is_omitted() {
        let engine = RecordingEngine::new(Fail::Nothing);
        let json = r#"{"reportName":"Branded","assets":{"logo":"https://cdn.example/logo.png"},
            "components":[{"type":"para","props":{"text":"x"}}]}"#;
        export_pdf(json, &Settings::default(), &Unreachable, &engine, today()).unwrap();
        let calls = engine.calls();
        assert!(!calls.html.contains("cdn.example"));
        assert!(!calls.options[0].header_template.contains("<img"));
        assert!(calls.options[0].header_template.contains("Branded"));
    }

    #[test]
    fn preview_skips_hydration_and_engine() {
        let html = preview_html(MINIMAL, &Settings::default(), today()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Q1 Review"));
        let err = preview_html("{", &Settings::default(), today()).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn filenames() {
        assert_eq!(safe_filename("Q1 Report: Ünïcode", "report"), "Q1-Report-Unicode.pdf");
        assert_eq!(safe_filename("Café  Menu", "report"), "Cafe-Menu.pdf");
        assert_eq!(safe_filename("../etc/passwd", "report"), "etc-passwd.pdf");
        assert_eq!(safe_filename("a__b--c", "report"), "a_b-c.pdf");
        assert_eq!(safe_filename("日本語", "report"), "report.pdf");
        assert_eq!(safe_filename("", "fallback"), "fallback.pdf");
        assert_eq!(safe_filename("v1.2 final", "report"), "v1.2-final.pdf");
    }
}
