//! # report-forge – declarative reports to HTML preview and paginated PDF
//!
//! A report is a JSON document: a name, a palette, optional image assets,
//! page/font/header/footer configuration and an ordered list of typed
//! components. The pipeline stages are:
//!
//! 1. **Validate** – untyped JSON → fully defaulted [`schema::Report`] ([`validate`])
//! 2. **Hydrate** – inline remote images as `data:` URIs ([`assets`])
//! 3. **Render** – components and page framing → HTML ([`components`], [`document`])
//! 4. **Paginate** – running header/footer fragments ([`pagination`])
//! 5. **Print** – a [`print::PrintEngine`] turns the document into PDF bytes;
//!    [`engine::ForgeEngine`] is the built-in one ([`export`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod assets;
pub mod components;
pub mod document;
pub mod engine;
pub mod error;
pub mod export;
pub mod ffi;
pub mod markup;
pub mod pagination;
pub mod print;
pub mod samples;
pub mod schema;
pub mod settings;
pub mod validate;

// Re-exports for convenience
pub use engine::ForgeEngine;
pub use error::{ExportError, ForgeError, ValidationError};
pub use export::{export_pdf, preview_html, ExportOutput};
pub use schema::Report;
pub use settings::Settings;
