//! Text measurement against the PDF base-14 fonts.
//!
//! Output uses the built-in Helvetica / Times / Courier faces, so widths come
//! from their AFM advance tables (1/1000 em) rather than from embedded font
//! files. Times is approximated from the Helvetica table.

/// Generic family a CSS `font-family` list resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Pick the first recognisable entry of a CSS font-family list.
    pub fn from_css(list: &str) -> Self {
        for name in list.split(',') {
            let name = name
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_ascii_lowercase();
            match name.as_str() {
                "helvetica" | "arial" | "sans-serif" | "inter" | "system-ui" | "roboto"
                | "open sans" | "verdana" => return Self::Helvetica,
                "times" | "times new roman" | "georgia" | "serif" | "garamond" => {
                    return Self::Times
                }
                "courier" | "courier new" | "monospace" | "consolas" | "menlo" => {
                    return Self::Courier
                }
                _ => {}
            }
        }
        Self::Helvetica
    }
}

/// Advance widths for ASCII 32..=126, Helvetica.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance widths for ASCII 32..=126, Helvetica-Bold.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, //
];

const DEFAULT_ADVANCE: u16 = 556;
const COURIER_ADVANCE: u16 = 600;
const TIMES_SCALE: f32 = 0.92;

/// Ascent as a fraction of the font size.
const ASCENT: f32 = 0.75;

/// A concrete face at a size (CSS px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: FontFamily::Helvetica,
            bold: false,
            italic: false,
            size: 16.0,
        }
    }
}

impl FontSpec {
    fn advance(&self, c: char) -> f32 {
        if self.family == FontFamily::Courier {
            return COURIER_ADVANCE as f32;
        }
        let c = if c == '\u{00A0}' { ' ' } else { c };
        let table = if self.bold { &HELVETICA_BOLD } else { &HELVETICA };
        let units = match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => DEFAULT_ADVANCE,
        } as f32;
        if self.family == FontFamily::Times {
            units * TIMES_SCALE
        } else {
            units
        }
    }

    /// Width of `text` in px.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars().map(|c| self.advance(c)).sum::<f32>() * self.size / 1000.0
    }

    /// Distance from the top of a line box to the baseline, in px.
    pub fn ascent(&self) -> f32 {
        self.size * ASCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helvetica(size: f32) -> FontSpec {
        FontSpec {
            size,
            ..FontSpec::default()
        }
    }

    #[test]
    fn helvetica_widths() {
        // H e l l o = 722 + 556 + 222 + 222 + 556
        let w = helvetica(10.0).measure("Hello");
        assert!((w - 22.78).abs() < 0.01, "{w}");
        assert_eq!(helvetica(10.0).measure(""), 0.0);
    }

    #[test]
    fn bold_is_wider() {
        let regular = helvetica(12.0);
        let bold = FontSpec { bold: true, ..regular };
        assert!(bold.measure("Quarterly report") > regular.measure("Quarterly report"));
    }

    #[test]
    fn courier_is_monospaced() {
        let courier = FontSpec {
            family: FontFamily::Courier,
            ..helvetica(10.0)
        };
        assert_eq!(courier.measure("iiii"), courier.measure("MMMM"));
        assert!((courier.measure("ab") - 12.0).abs() < 0.001);
    }

    #[test]
    fn nbsp_measures_as_space() {
        let f = helvetica(14.0);
        assert_eq!(f.measure("a\u{A0}b"), f.measure("a b"));
    }

    #[test]
    fn family_lists() {
        assert_eq!(FontFamily::from_css("Helvetica, Arial, sans-serif"), FontFamily::Helvetica);
        assert_eq!(FontFamily::from_css("\"Unknown Font\", Georgia, serif"), FontFamily::Times);
        assert_eq!(FontFamily::from_css("monospace"), FontFamily::Courier);
        assert_eq!(FontFamily::from_css("Comic Sans"), FontFamily::Helvetica);
    }
}
