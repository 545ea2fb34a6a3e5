//! Runtime settings for preview and export. These are properties of the
//! running service, not of any one document.

use std::time::Duration;

/// Tailwind 2 utility stylesheet referenced by the preview document.
pub const DEFAULT_UTILITY_CSS: &str =
    "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Stylesheet `<link>` emitted into the document head.
    pub utility_css_href: String,
    /// Per-request timeout for remote image fetches.
    pub fetch_timeout: Duration,
    /// Images larger than this are treated as unavailable.
    pub max_asset_bytes: u64,
    pub user_agent: String,
    /// When false, remote references are never fetched and degrade as
    /// unavailable.
    pub remote_assets: bool,
    /// Download filename stem used when the report name sanitises to nothing.
    pub default_filename: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            utility_css_href: DEFAULT_UTILITY_CSS.to_string(),
            fetch_timeout: Duration::from_secs(10),
            max_asset_bytes: 10 * 1024 * 1024,
            user_agent: concat!("report-forge/", env!("CARGO_PKG_VERSION")).to_string(),
            remote_assets: true,
            default_filename: "report".to_string(),
        }
    }
}

impl Settings {
    /// Settings for contexts without network access.
    pub fn offline() -> Self {
        Self {
            remote_assets: false,
            ..Self::default()
        }
    }
}
