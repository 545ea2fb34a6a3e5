//! Validation boundary: untyped JSON in, fully-defaulted [`Report`] out.
//!
//! The walker visits the whole document even after the first problem so the
//! caller gets every violated path in one round trip. Objects are closed at
//! every level: keys the schema does not name are reported, never ignored.
//! Defaults are applied here and only here.

use serde_json::{Map, Value};

use crate::error::{Issue, ValidationError};
use crate::schema::*;

/// Parse and validate a JSON document.
pub fn validate_str(json: &str) -> Result<Report, ValidationError> {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => validate(&value),
        Err(e) => Err(ValidationError {
            issues: vec![Issue::new("$", format!("well-formed JSON document ({e})"))],
        }),
    }
}

/// Validate an already-parsed document.
pub fn validate(value: &Value) -> Result<Report, ValidationError> {
    let mut issues = Vec::new();
    let report = report(value, &mut issues);
    match report {
        Some(report) if issues.is_empty() => Ok(report),
        _ => Err(ValidationError { issues }),
    }
}

fn report(value: &Value, issues: &mut Vec<Issue>) -> Option<Report> {
    let Some(mut root) = Fields::required(Some(value), "$", "", issues) else {
        return None;
    };

    let company = root.string("company", "", issues);
    let report_name = root.string("reportName", "Report", issues);
    let colors = palette(&mut root, issues);
    let assets = assets(&mut root, issues);
    let configs = configs(&mut root, issues);
    let components = components(&mut root, issues);
    root.finish(issues);

    Some(Report {
        company,
        report_name,
        colors,
        assets,
        configs,
        components: components?,
    })
}

fn palette(root: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Palette {
    let mut f = root.nested("colors", issues);
    let d = Palette::default();
    let palette = Palette {
        primary: f.string("primary", &d.primary, issues),
        accent: f.string("accent", &d.accent, issues),
        text: f.string("text", &d.text, issues),
        muted: f.string("muted", &d.muted, issues),
        border: f.string("border", &d.border, issues),
    };
    f.finish(issues);
    palette
}

fn assets(root: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Assets {
    let mut f = root.nested("assets", issues);
    // A blank reference is the same as no asset.
    let mut asset = |key| f.opt_string(key, issues).filter(|s| !s.trim().is_empty());
    let assets = Assets {
        logo: asset("logo"),
        header_image: asset("headerImage"),
        footer_image: asset("footerImage"),
        background_image: asset("backgroundImage"),
    };
    f.finish(issues);
    assets
}

fn configs(root: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Configs {
    let mut cfg = root.nested("configs", issues);

    let mut f = cfg.nested("page", issues);
    let d = PageConfig::default();
    let page = PageConfig {
        size: f.choice("size", PageSize::parse, PageSize::VARIANTS, d.size, issues),
        orientation: f.choice(
            "orientation",
            Orientation::parse,
            Orientation::VARIANTS,
            d.orientation,
            issues,
        ),
        margin: f.string("margin", &d.margin, issues),
    };
    f.finish(issues);

    let mut f = cfg.nested("font", issues);
    let d = FontConfig::default();
    let font = FontConfig {
        family: f.string("family", &d.family, issues),
        size: f.string("size", &d.size, issues),
        line_height: f.string("lineHeight", &d.line_height, issues),
    };
    f.finish(issues);

    let mut f = cfg.nested("header", issues);
    let d = HeaderConfig::default();
    let header = HeaderConfig {
        show: f.bool("show", d.show, issues),
        align: f.choice("align", Align::parse, Align::VARIANTS, d.align, issues),
        repeat: f.choice(
            "repeat",
            RepeatMode::parse,
            RepeatMode::VARIANTS,
            d.repeat,
            issues,
        ),
    };
    f.finish(issues);

    let mut f = cfg.nested("footer", issues);
    let d = FooterConfig::default();
    let footer = FooterConfig {
        show: f.bool("show", d.show, issues),
        text: f.string("text", &d.text, issues),
        align: f.choice("align", Align::parse, Align::VARIANTS, d.align, issues),
    };
    f.finish(issues);

    let mut f = cfg.nested("date", issues);
    let d = DateConfig::default();
    let date = DateConfig {
        align: f.choice("align", Align::parse, Align::VARIANTS, d.align, issues),
        format: f.string("format", &d.format, issues),
    };
    f.finish(issues);

    let mut f = cfg.nested("table", issues);
    let d = TableConfig::default();
    let table = TableConfig {
        border: f.string("border", &d.border, issues),
        striped: f.bool("striped", d.striped, issues),
        compact: f.bool("compact", d.compact, issues),
    };
    f.finish(issues);

    cfg.finish(issues);
    Configs {
        page,
        font,
        header,
        footer,
        date,
        table,
    }
}

fn components(root: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Option<Vec<Component>> {
    let path = root.child_path("components");
    let Some(items) = root.get("components").and_then(Value::as_array) else {
        issues.push(Issue::new(path, "non-empty array of components"));
        return None;
    };
    if items.is_empty() {
        issues.push(Issue::new(path, "non-empty array of components"));
        return None;
    }

    let mut out = Vec::with_capacity(items.len());
    let mut complete = true;
    for (i, item) in items.iter().enumerate() {
        match component(item, &format!("{path}[{i}]"), issues) {
            Some(c) => out.push(c),
            None => complete = false,
        }
    }
    complete.then_some(out)
}

fn component(value: &Value, path: &str, issues: &mut Vec<Issue>) -> Option<Component> {
    let mut f = Fields::required(Some(value), path, "component object", issues)?;

    let type_path = f.child_path("type");
    let kind_name = match f.get("type") {
        Some(Value::String(s)) if ComponentKind::TYPES.contains(&s.as_str()) => Some(s.as_str()),
        _ => {
            issues.push(Issue::new(
                type_path,
                format!("one of {}", ComponentKind::TYPES.join(", ")),
            ));
            None
        }
    };
    let id = f.opt_string("id", issues);
    let style = style_overrides(&mut f, issues);

    let kind = match kind_name {
        Some(name) => {
            let mut props = f.nested("props", issues);
            let kind = component_props(name, &mut props, issues);
            props.finish(issues);
            kind
        }
        None => {
            // Already reported through `type`.
            f.get("props");
            None
        }
    };
    f.finish(issues);

    Some(Component { id, style, kind: kind? })
}

fn style_overrides(f: &mut Fields<'_>, issues: &mut Vec<Issue>) -> StyleOverrides {
    let mut out = StyleOverrides::new();
    let path = f.child_path("style");
    match f.get("style") {
        None => {}
        Some(Value::Object(map)) => {
            for (slot, tokens) in map {
                match tokens {
                    Value::String(s) => {
                        out.insert(slot.clone(), s.clone());
                    }
                    Value::Null => {}
                    _ => issues.push(Issue::new(format!("{path}.{slot}"), "string of style tokens")),
                }
            }
        }
        Some(_) => issues.push(Issue::new(path, "object mapping slot names to style tokens")),
    }
    out
}

fn component_props(name: &str, p: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Option<ComponentKind> {
    let kind = match name {
        "header" => {
            let title = p.required_string("title", issues);
            let subtitle = p.opt_string("subtitle", issues);
            ComponentKind::Header {
                title: title?,
                subtitle,
            }
        }
        "subheader" => ComponentKind::Subheader {
            text: p.required_string("text", issues)?,
        },
        "date" => ComponentKind::Date {
            value: p.opt_string("value", issues),
            label: p.opt_string("label", issues),
        },
        "para" => ComponentKind::Para {
            text: p.required_string("text", issues)?,
        },
        "divider" => ComponentKind::Divider,
        "spacer" => ComponentKind::Spacer {
            size: p.choice(
                "size",
                SpacerSize::parse,
                SpacerSize::VARIANTS,
                SpacerSize::default(),
                issues,
            ),
        },
        "pagebreak" => ComponentKind::Pagebreak,
        "signature" => {
            let lines = signature_lines(p, issues);
            let label = p.opt_string("label", issues);
            ComponentKind::Signature {
                lines: lines?,
                label,
            }
        }
        "footerText" => ComponentKind::FooterText {
            text: p.required_string("text", issues)?,
        },
        "table" => ComponentKind::Table(table_props(p, issues)?),
        "image" => {
            let url = p.required_string("url", issues);
            let alt = p.opt_string("alt", issues);
            let caption = p.opt_string("caption", issues);
            let width = p.opt_positive("width", issues);
            let height = p.opt_positive("height", issues);
            ComponentKind::Image(ImageProps {
                url: Some(url?),
                alt,
                caption,
                width,
                height,
            })
        }
        _ => return None,
    };
    Some(kind)
}

fn signature_lines(p: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Option<u8> {
    let path = p.child_path("lines");
    match p.get("lines") {
        None => Some(1),
        Some(v) => match v.as_u64() {
            Some(n) if (1..=MAX_SIGNATURE_LINES as u64).contains(&n) => Some(n as u8),
            _ => {
                issues.push(Issue::new(
                    path,
                    format!("integer between 1 and {MAX_SIGNATURE_LINES}"),
                ));
                None
            }
        },
    }
}

fn table_props(p: &mut Fields<'_>, issues: &mut Vec<Issue>) -> Option<TableProps> {
    let mut ok = true;

    let headers_path = p.child_path("headers");
    let mut headers = Vec::new();
    match p.get("headers") {
        None => {}
        Some(Value::Array(items)) => {
            for (i, h) in items.iter().enumerate() {
                match h {
                    Value::String(s) => headers.push(s.clone()),
                    _ => {
                        issues.push(Issue::new(format!("{headers_path}[{i}]"), "string"));
                        ok = false;
                    }
                }
            }
        }
        Some(_) => {
            issues.push(Issue::new(headers_path, "array of strings"));
            ok = false;
        }
    }

    let rows_path = p.child_path("rows");
    let mut rows = Vec::new();
    match p.get("rows") {
        None => {}
        Some(Value::Array(items)) => {
            for (r, row) in items.iter().enumerate() {
                let Value::Array(cells) = row else {
                    issues.push(Issue::new(format!("{rows_path}[{r}]"), "array of cells"));
                    ok = false;
                    continue;
                };
                let mut out = Vec::with_capacity(cells.len());
                for (c, cell) in cells.iter().enumerate() {
                    match cell {
                        Value::String(s) => out.push(Cell::Text(s.clone())),
                        Value::Number(n) => out.push(Cell::Number(n.clone())),
                        Value::Null => out.push(Cell::Empty),
                        _ => {
                            issues.push(Issue::new(
                                format!("{rows_path}[{r}][{c}]"),
                                "string, number or null",
                            ));
                            ok = false;
                        }
                    }
                }
                rows.push(out);
            }
        }
        Some(_) => {
            issues.push(Issue::new(rows_path, "array of rows"));
            ok = false;
        }
    }

    let title = p.opt_string("title", issues);
    let notes = p.opt_string("notes", issues);
    ok.then_some(TableProps {
        headers,
        rows,
        title,
        notes,
    })
}

// ---------------------------------------------------------------------------
// Closed-object reader
// ---------------------------------------------------------------------------

/// Reads keys out of one JSON object, remembering which ones the schema asked
/// for so the rest can be reported by [`Fields::finish`]. An absent or null
/// object reads as empty, which yields every default.
struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
    path: String,
    known: Vec<&'static str>,
}

impl<'a> Fields<'a> {
    fn optional(value: Option<&'a Value>, path: String, issues: &mut Vec<Issue>) -> Self {
        let map = match value {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                issues.push(Issue::new(path.clone(), "object"));
                None
            }
        };
        Self {
            map,
            path,
            known: Vec::new(),
        }
    }

    fn required(
        value: Option<&'a Value>,
        path: &str,
        expected: &str,
        issues: &mut Vec<Issue>,
    ) -> Option<Self> {
        match value {
            Some(Value::Object(map)) => Some(Self {
                map: Some(map),
                path: path.to_string(),
                known: Vec::new(),
            }),
            _ => {
                let expected = if expected.is_empty() { "object" } else { expected };
                issues.push(Issue::new(path, expected));
                None
            }
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path == "$" {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Value for `key`; null counts as absent.
    fn get(&mut self, key: &'static str) -> Option<&'a Value> {
        self.known.push(key);
        self.map
            .and_then(|m| m.get(key))
            .filter(|v| !v.is_null())
    }

    fn nested(&mut self, key: &'static str, issues: &mut Vec<Issue>) -> Fields<'a> {
        let path = self.child_path(key);
        let value = self.get(key);
        Fields::optional(value, path, issues)
    }

    fn string(&mut self, key: &'static str, default: &str, issues: &mut Vec<Issue>) -> String {
        self.opt_string(key, issues)
            .unwrap_or_else(|| default.to_string())
    }

    fn opt_string(&mut self, key: &'static str, issues: &mut Vec<Issue>) -> Option<String> {
        let path = self.child_path(key);
        match self.get(key) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                issues.push(Issue::new(path, "string"));
                None
            }
        }
    }

    fn required_string(&mut self, key: &'static str, issues: &mut Vec<Issue>) -> Option<String> {
        let path = self.child_path(key);
        match self.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => {
                issues.push(Issue::new(path, "required string"));
                None
            }
        }
    }

    fn bool(&mut self, key: &'static str, default: bool, issues: &mut Vec<Issue>) -> bool {
        let path = self.child_path(key);
        match self.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                issues.push(Issue::new(path, "boolean"));
                default
            }
        }
    }

    fn opt_positive(&mut self, key: &'static str, issues: &mut Vec<Issue>) -> Option<f64> {
        let path = self.child_path(key);
        match self.get(key) {
            None => None,
            Some(v) => match v.as_f64() {
                Some(n) if n > 0.0 && n.is_finite() => Some(n),
                _ => {
                    issues.push(Issue::new(path, "positive number"));
                    None
                }
            },
        }
    }

    fn choice<T: Copy>(
        &mut self,
        key: &'static str,
        parse: fn(&str) -> Option<T>,
        variants: &[&str],
        default: T,
        issues: &mut Vec<Issue>,
    ) -> T {
        let path = self.child_path(key);
        match self.get(key) {
            None => default,
            Some(Value::String(s)) => parse(s).unwrap_or_else(|| {
                issues.push(Issue::new(path, format!("one of {}", variants.join(", "))));
                default
            }),
            Some(_) => {
                issues.push(Issue::new(path, format!("one of {}", variants.join(", "))));
                default
            }
        }
    }

    /// Report every key that no accessor asked for.
    fn finish(self, issues: &mut Vec<Issue>) {
        let Some(map) = self.map else { return };
        for key in map.keys() {
            if !self.known.contains(&key.as_str()) {
                let path = if self.path == "$" {
                    key.clone()
                } else {
                    format!("{}.{key}", self.path)
                };
                issues.push(Issue::new(path, "no such field"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "reportName": "Quarterly",
            "components": [{ "type": "para", "props": { "text": "hello" } }]
        })
    }

    #[test]
    fn minimal_report_gets_defaults() {
        let report = validate(&minimal()).unwrap();
        assert_eq!(report.report_name, "Quarterly");
        assert_eq!(report.company, "");
        assert_eq!(report.colors, Palette::default());
        assert_eq!(report.configs, Configs::default());
        assert_eq!(report.components.len(), 1);
        assert!(matches!(
            &report.components[0].kind,
            ComponentKind::Para { text } if text == "hello"
        ));
    }

    #[test]
    fn empty_components_rejected() {
        let err = validate(&json!({ "components": [] })).unwrap_err();
        assert!(err.has_path("components"), "{err}");
    }

    #[test]
    fn missing_components_rejected() {
        let err = validate(&json!({ "reportName": "x" })).unwrap_err();
        assert!(err.has_path("components"));
    }

    #[test]
    fn unknown_keys_rejected_at_every_level() {
        let doc = json!({
            "reportNme": "typo",
            "configs": { "page": { "sise": "A4" }, "extra": {} },
            "components": [{ "type": "para", "props": { "text": "x", "bold": true } }]
        });
        let err = validate(&doc).unwrap_err();
        assert!(err.has_path("reportNme"));
        assert!(err.has_path("configs.page.sise"));
        assert!(err.has_path("configs.extra"));
        assert!(err.has_path("components[0].props.bold"));
        assert_eq!(err.issues.len(), 4);
    }

    #[test]
    fn unknown_component_type_rejected() {
        let doc = json!({ "components": [{ "type": "chart", "props": { "series": [1, 2] } }] });
        let err = validate(&doc).unwrap_err();
        assert!(err.has_path("components[0].type"));
        assert_eq!(err.issues.len(), 1, "{err}");
    }

    #[test]
    fn blank_asset_references_are_absent() {
        let doc = json!({
            "assets": { "logo": "", "headerImage": "  ", "footerImage": "data:image/png;base64,AA==" },
            "components": [{ "type": "divider" }]
        });
        let report = validate(&doc).unwrap();
        assert_eq!(report.assets.logo, None);
        assert_eq!(report.assets.header_image, None);
        assert!(report.assets.footer_image.is_some());
    }

    #[test]
    fn table_cells_must_be_scalar() {
        let doc = json!({
            "components": [{
                "type": "table",
                "props": { "headers": ["a"], "rows": [["ok", 1, null], [true, {"x": 1}]] }
            }]
        });
        let err = validate(&doc).unwrap_err();
        assert!(err.has_path("components[0].props.rows[1][0]"));
        assert!(err.has_path("components[0].props.rows[1][1]"));
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn signature_lines_range() {
        for bad in [json!(0), json!(6), json!(2.5), json!("3")] {
            let doc = json!({ "components": [{ "type": "signature", "props": { "lines": bad } }] });
            let err = validate(&doc).unwrap_err();
            assert!(err.has_path("components[0].props.lines"));
        }
        let doc = json!({ "components": [{ "type": "signature", "props": { "lines": 5 } }] });
        let report = validate(&doc).unwrap();
        assert!(matches!(
            report.components[0].kind,
            ComponentKind::Signature { lines: 5, .. }
        ));
    }

    #[test]
    fn enum_values_checked() {
        let doc = json!({
            "configs": {
                "page": { "size": "A3", "orientation": "sideways" },
                "header": { "align": "middle", "repeat": "never" }
            },
            "components": [{ "type": "spacer", "props": { "size": "xxl" } }]
        });
        let err = validate(&doc).unwrap_err();
        for path in [
            "configs.page.size",
            "configs.page.orientation",
            "configs.header.align",
            "configs.header.repeat",
            "components[0].props.size",
        ] {
            assert!(err.has_path(path), "missing {path}: {err}");
        }
    }

    #[test]
    fn every_violation_reported() {
        let doc = json!({
            "company": 7,
            "colors": { "primary": 1 },
            "components": [
                { "type": "header", "props": {} },
                { "type": "image", "props": { "url": "x", "width": -3 } }
            ]
        });
        let err = validate(&doc).unwrap_err();
        assert!(err.has_path("company"));
        assert!(err.has_path("colors.primary"));
        assert!(err.has_path("components[0].props.title"));
        assert!(err.has_path("components[1].props.width"));
    }

    #[test]
    fn props_optional_for_variants_without_required_fields() {
        let doc = json!({
            "components": [
                { "type": "divider" },
                { "type": "spacer" },
                { "type": "pagebreak", "id": "pb1" },
                { "type": "date", "props": null }
            ]
        });
        let report = validate(&doc).unwrap();
        assert_eq!(report.components[2].id.as_deref(), Some("pb1"));
        assert!(matches!(
            report.components[1].kind,
            ComponentKind::Spacer { size: SpacerSize::Md }
        ));
    }

    #[test]
    fn style_overrides_kept() {
        let doc = json!({
            "components": [{
                "type": "para",
                "props": { "text": "x" },
                "style": { "text": "italic text-red-500" }
            }]
        });
        let report = validate(&doc).unwrap();
        assert_eq!(report.components[0].slot("text"), "italic text-red-500");
        assert_eq!(report.components[0].slot("wrapper"), "");
    }

    #[test]
    fn malformed_json_reported_at_root() {
        let err = validate_str("{ not json").unwrap_err();
        assert!(err.has_path("$"));
    }

    #[test]
    fn non_object_root_rejected() {
        let err = validate(&json!([1, 2])).unwrap_err();
        assert!(err.has_path("$"));
    }
}
