//! Asset hydration – replaces remote image references with inline `data:`
//! URIs so neither the preview nor the print engine needs the network.
//!
//! Every distinct remote reference in a report is fetched concurrently and
//! the results are joined before the report is handed back. A reference that
//! cannot be fetched is cleared (the renderers then omit the image or fall
//! back to text) and logged; it is never an error for the caller.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use rayon::prelude::*;

use crate::error::AssetError;
use crate::schema::{ComponentKind, Report};
use crate::settings::Settings;

/// Content type recorded when the origin does not declare one.
pub const DEFAULT_IMAGE_TYPE: &str = "image/png";

/// Bytes of one fetched resource plus the content type the origin declared.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Retrieves an image by URL. Implementations must be callable from several
/// threads at once.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError>;
}

/// Plain HTTP(S) GET. Non-2xx answers and transport failures are errors.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.fetch_timeout)
            .user_agent(&settings.user_agent)
            .build();
        Self {
            agent,
            max_bytes: settings.max_asset_bytes,
        }
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
        let lower = url.to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return Err(AssetError::Unsupported(url.to_string()));
        }

        let resp = self
            .agent
            .get(url)
            .set("Accept", "image/*")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => AssetError::Status(code),
                ureq::Error::Transport(t) => AssetError::Transport(t.to_string()),
            })?;
        if !(200..300).contains(&resp.status()) {
            return Err(AssetError::Status(resp.status()));
        }

        let content_type = resp.header("Content-Type").map(str::to_string);
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| AssetError::Transport(e.to_string()))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(AssetError::TooLarge {
                limit: self.max_bytes,
            });
        }

        Ok(FetchedAsset {
            bytes,
            content_type,
        })
    }
}

/// Fetcher used when remote assets are disabled: every reference is
/// unavailable.
pub struct OfflineFetcher;

impl AssetFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
        Err(AssetError::Unsupported(format!(
            "remote assets disabled ({url})"
        )))
    }
}

/// The fetcher `settings` asks for.
pub fn fetcher_for(settings: &Settings) -> Box<dyn AssetFetcher> {
    if settings.remote_assets {
        Box::new(HttpFetcher::new(settings))
    } else {
        Box::new(OfflineFetcher)
    }
}

/// True for references that are already self-contained.
pub fn is_inline(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Encode bytes as a base64 `data:` URI.
pub fn to_data_uri(asset: &FetchedAsset) -> String {
    let mime = asset
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_IMAGE_TYPE);
    format!("data:{mime};base64,{}", BASE64_STD.encode(&asset.bytes))
}

/// Decode a `data:<mime>;base64,<data>` URI into its MIME type and bytes.
pub fn parse_data_uri(src: &str) -> Result<(String, Vec<u8>), String> {
    if !is_inline(src) {
        let preview = src.get(..80).unwrap_or(src);
        return Err(format!("not a data URI: {preview:?}"));
    }
    let rest = &src["data:".len()..];
    let comma = rest
        .find(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    let header = &rest[..comma];
    let Some(mime) = header.strip_suffix(";base64") else {
        return Err("only base64-encoded data URIs are supported".to_string());
    };
    let bytes = BASE64_STD
        .decode(rest[comma + 1..].trim())
        .map_err(|e| format!("base64 decode error: {e}"))?;
    Ok((mime.to_string(), bytes))
}

/// Every image slot in the report: report-level assets first, then image
/// components in document order.
fn image_slots(report: &mut Report) -> Vec<&mut Option<String>> {
    let mut slots = vec![
        &mut report.assets.logo,
        &mut report.assets.header_image,
        &mut report.assets.footer_image,
        &mut report.assets.background_image,
    ];
    for component in &mut report.components {
        if let ComponentKind::Image(props) = &mut component.kind {
            slots.push(&mut props.url);
        }
    }
    slots
}

/// Inline every remote image reference in `report`.
///
/// Inline references pass through unchanged. Unavailable references are set
/// to `None`.
pub fn hydrate(mut report: Report, fetcher: &dyn AssetFetcher) -> Report {
    let remote: BTreeSet<String> = image_slots(&mut report)
        .into_iter()
        .filter_map(|slot| slot.clone())
        .filter(|r| !r.trim().is_empty() && !is_inline(r))
        .collect();

    if remote.is_empty() {
        return report;
    }
    log::debug!("hydrating {} remote image reference(s)", remote.len());

    let resolved: HashMap<String, Option<String>> = remote
        .into_par_iter()
        .map(|url| {
            let inline = match fetcher.fetch(&url) {
                Ok(asset) => Some(to_data_uri(&asset)),
                Err(e) => {
                    log::warn!("asset unavailable, omitting {url}: {e}");
                    None
                }
            };
            (url, inline)
        })
        .collect();

    for slot in image_slots(&mut report) {
        let Some(reference) = slot.as_deref() else {
            continue;
        };
        if is_inline(reference) {
            continue;
        }
        *slot = resolved.get(reference).cloned().flatten();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    struct MapFetcher {
        ok: HashMap<&'static str, FetchedAsset>,
        calls: AtomicUsize,
    }

    impl AssetFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedAsset, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ok
                .get(url)
                .cloned()
                .ok_or_else(|| AssetError::Transport("connection refused".into()))
        }
    }

    fn fetcher() -> MapFetcher {
        let mut ok = HashMap::new();
        ok.insert(
            "https://cdn.example/logo.png",
            FetchedAsset {
                bytes: vec![1, 2, 3],
                content_type: Some("image/png; charset=binary".into()),
            },
        );
        ok.insert(
            "https://cdn.example/photo",
            FetchedAsset {
                bytes: vec![4, 5],
                content_type: None,
            },
        );
        MapFetcher {
            ok,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn remote_references_become_inline() {
        let report = validate(&json!({
            "assets": { "logo": "https://cdn.example/logo.png" },
            "components": [
                { "type": "image", "props": { "url": "https://cdn.example/photo" } },
                { "type": "image", "props": { "url": "https://cdn.example/photo" } }
            ]
        }))
        .unwrap();
        let f = fetcher();
        let out = hydrate(report, &f);
        assert_eq!(out.assets.logo.as_deref(), Some("data:image/png;base64,AQID"));
        match &out.components[0].kind {
            ComponentKind::Image(p) => {
                assert_eq!(p.url.as_deref(), Some("data:image/png;base64,BAU="))
            }
            other => panic!("unexpected {other:?}"),
        }
        // Same URL twice is fetched once.
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unreachable_logo_is_dropped() {
        let report = validate(&json!({
            "reportName": "Audit",
            "assets": { "logo": "https://down.example/logo.png" },
            "components": [{ "type": "para", "props": { "text": "x" } }]
        }))
        .unwrap();
        let out = hydrate(report, &fetcher());
        assert_eq!(out.assets.logo, None);
        assert_eq!(out.report_name, "Audit");
    }

    #[test]
    fn inline_reference_is_untouched() {
        let report = validate(&json!({
            "assets": { "logo": PIXEL },
            "components": [{ "type": "para", "props": { "text": "x" } }]
        }))
        .unwrap();
        let f = fetcher();
        let out = hydrate(report.clone(), &f);
        assert_eq!(out, report);
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn offline_fetcher_drops_remote() {
        let report = validate(&json!({
            "assets": { "headerImage": "https://cdn.example/logo.png", "footerImage": PIXEL },
            "components": [{ "type": "para", "props": { "text": "x" } }]
        }))
        .unwrap();
        let out = hydrate(report, &OfflineFetcher);
        assert_eq!(out.assets.header_image, None);
        assert_eq!(out.assets.footer_image.as_deref(), Some(PIXEL));
    }

    #[test]
    fn data_uri_roundtrip_and_errors() {
        let (mime, bytes) = parse_data_uri(PIXEL).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(parse_data_uri("https://x/y.png").is_err());
        assert!(parse_data_uri("data:image/svg+xml,<svg/>").is_err());
        assert!(is_inline("DATA:image/png;base64,AA=="));
    }

    #[test]
    fn http_fetcher_rejects_other_schemes() {
        let f = HttpFetcher::new(&Settings::default());
        assert!(matches!(
            f.fetch("file:///etc/passwd"),
            Err(AssetError::Unsupported(_))
        ));
    }
}
