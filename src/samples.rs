//! Sample report documents for demos and tests.
//!
//! Every sample is self-contained: images are inline `data:` URIs so the
//! samples export without network access.

/// Names accepted by [`sample`].
pub const SAMPLE_NAMES: &[&str] = &["minimal", "quarterly", "letter-landscape"];

/// Look a sample up by name.
pub fn sample(name: &str) -> Option<&'static str> {
    match name {
        "minimal" => Some(minimal()),
        "quarterly" => Some(quarterly()),
        "letter-landscape" => Some(letter_landscape()),
        _ => None,
    }
}

/// One paragraph, every configuration defaulted.
pub fn minimal() -> &'static str {
    r#"{
  "reportName": "Minimal Report",
  "components": [
    { "type": "para", "props": { "text": "Hello from report-forge." } }
  ]
}"#
}

/// Every component type, custom palette and font, inline logo.
pub fn quarterly() -> &'static str {
    r##"{
  "company": "Acme Corp",
  "reportName": "Quarterly Review Q1",
  "colors": { "primary": "#1a365d", "accent": "#2b6cb0", "border": "#cbd5e0" },
  "assets": {
    "logo": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGNQTX4NAAIkAXSaGkHUAAAAAElFTkSuQmCC"
  },
  "configs": {
    "page": { "size": "A4", "orientation": "portrait", "margin": "15mm" },
    "font": { "family": "Helvetica, Arial, sans-serif", "size": "sm", "lineHeight": "relaxed" },
    "header": { "show": true, "align": "left", "repeat": "all" },
    "footer": { "show": true, "text": "Page {{page}} of {{pages}}", "align": "center" },
    "table": { "border": "solid", "striped": true, "compact": false }
  },
  "components": [
    {
      "type": "header",
      "props": { "title": "Quarterly Review", "subtitle": "January to March" },
      "style": { "title": "text-3xl" }
    },
    { "type": "date", "props": { "value": "2024-04-02", "label": "Issued" } },
    { "type": "subheader", "props": { "text": "Summary" } },
    {
      "type": "para",
      "props": {
        "text": "Revenue grew across every region. Operating costs stayed flat while headcount rose by four."
      }
    },
    { "type": "divider" },
    {
      "type": "table",
      "props": {
        "title": "Revenue by region",
        "headers": ["Region", "Q4", "Q1", "Notes"],
        "rows": [
          ["North", 1200, 1350, null],
          ["South", 980, 1010, "new office"],
          ["East", 1430, 1600, null],
          ["West", 760, 905, "pilot"]
        ],
        "notes": "Figures in thousands."
      }
    },
    { "type": "spacer", "props": { "size": "lg" } },
    {
      "type": "image",
      "props": {
        "url": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGNQTX4NAAIkAXSaGkHUAAAAAElFTkSuQmCC",
        "alt": "Brand swatch",
        "caption": "Brand colour",
        "width": 48,
        "height": 48
      }
    },
    { "type": "pagebreak" },
    { "type": "subheader", "props": { "text": "Sign-off" } },
    { "type": "signature", "props": { "lines": 2, "label": "Approved by" } },
    { "type": "footerText", "props": { "text": "Confidential. Internal use only." } }
  ]
}"##
}

/// Letter paper in landscape with the header on the first page only.
pub fn letter_landscape() -> &'static str {
    r#"{
  "company": "Acme Corp",
  "reportName": "Inventory Snapshot",
  "configs": {
    "page": { "size": "Letter", "orientation": "landscape" },
    "header": { "align": "center", "repeat": "first" },
    "footer": { "text": "{{page}} / {{pages}}", "align": "right" },
    "table": { "compact": true, "striped": false }
  },
  "components": [
    { "type": "header", "props": { "title": "Inventory Snapshot" } },
    {
      "type": "table",
      "props": {
        "headers": ["SKU", "Item", "On hand", "Reorder at"],
        "rows": [
          ["A-100", "Widget", 420, 100],
          ["A-200", "Gadget", 35, 50],
          ["B-310", "Sprocket", 1200, 300]
        ]
      }
    }
  ]
}"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComponentKind, Orientation, PageSize};
    use crate::validate::validate_str;

    #[test]
    fn all_samples_validate() {
        for name in SAMPLE_NAMES {
            let json = sample(name).unwrap();
            if let Err(e) = validate_str(json) {
                panic!("{name}: {e}");
            }
        }
    }

    #[test]
    fn quarterly_covers_every_component_type() {
        let report = validate_str(quarterly()).unwrap();
        for ty in ComponentKind::TYPES {
            assert!(
                report.components.iter().any(|c| c.kind.type_name() == *ty),
                "missing {ty}"
            );
        }
    }

    #[test]
    fn letter_landscape_geometry() {
        let report = validate_str(letter_landscape()).unwrap();
        assert_eq!(report.configs.page.size, PageSize::Letter);
        assert_eq!(report.configs.page.orientation, Orientation::Landscape);
        assert!(!report.configs.header.is_running());
    }

    #[test]
    fn unknown_sample() {
        assert!(sample("invoice").is_none());
    }
}
