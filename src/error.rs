//! Error taxonomy for the render/export pipeline.
//!
//! Only [`ValidationError`] and [`ExportError`] ever reach a caller (wrapped in
//! [`ForgeError`]). [`AssetError`] is absorbed by the hydrator and
//! [`RenderFailure`] is a diagnostic collected while the print engine loads
//! content.

use std::fmt;

use thiserror::Error;

/// One violated field in an input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// JSON path of the offending value, e.g. `components[2].props.lines`.
    pub path: String,
    /// Human-readable description of the expected shape.
    pub expected: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.expected)
    }
}

/// Malformed or incomplete input. Carries every violation found, not just the
/// first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid report ({}): {}", issue_count(.issues), join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// True when some issue is reported at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

fn issue_count(issues: &[Issue]) -> String {
    match issues.len() {
        1 => "1 issue".to_string(),
        n => format!("{n} issues"),
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(Issue::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a single image reference could not be inlined.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("origin answered with status {0}")]
    Status(u16),
    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("unsupported reference: {0}")]
    Unsupported(String),
}

/// A page-level problem reported while the print engine loaded content.
/// Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render diagnostic: {message}")]
pub struct RenderFailure {
    pub message: String,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The print engine could not produce output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("failed to launch print engine: {0}")]
    Launch(String),
    #[error("failed to load content: {0}")]
    Load(String),
    #[error("print engine timed out: {0}")]
    Timeout(String),
    #[error("failed to generate PDF: {0}")]
    Generate(String),
}

/// Outcome of a preview or export request that did not succeed.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ForgeError {
    /// Validation failures are the caller's fault; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForgeError::Validation(_))
    }

    /// HTTP-style status an outer service layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ForgeError::Validation(_) => 422,
            ForgeError::Export(_) => 500,
        }
    }
}
