//! Inline formatting: collapses whitespace across styled runs and breaks the
//! result into lines that fit a width.
//!
//! Only ASCII whitespace collapses and only an ASCII space is a break
//! opportunity, so `&nbsp;` keeps words together. `<br>` arrives as
//! [`InlineItem::Break`].

use super::fonts::FontSpec;
use super::style::Color;

/// Visual properties of one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStyle {
    pub font: FontSpec,
    pub color: Color,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineItem {
    Text(String, RunStyle),
    Break,
}

/// A stretch of one line drawn in a single style.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    /// Offset from the start of the line, before alignment.
    pub x: f32,
    pub width: f32,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub segments: Vec<Segment>,
    pub width: f32,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn push(&mut self, text: &str, style: RunStyle) {
        let width = style.font.measure(text);
        match self.segments.last_mut() {
            Some(last) if last.style == style => {
                last.text.push_str(text);
                last.width += width;
            }
            _ => self.segments.push(Segment {
                text: text.to_string(),
                x: self.width,
                width,
                style,
            }),
        }
        self.width += width;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String, RunStyle),
    Space(RunStyle),
    Break,
}

fn is_collapsible(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Collapse whitespace and split into words, spaces and breaks. Whitespace at
/// the start of the block or of a forced line is dropped, trailing whitespace
/// never produces a token.
fn tokenize(items: &[InlineItem]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pending_space: Option<RunStyle> = None;
    let mut at_line_start = true;
    let mut word = String::new();

    fn flush(word: &mut String, style: RunStyle, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word), style));
        }
    }

    for item in items {
        match item {
            InlineItem::Break => {
                pending_space = None;
                tokens.push(Token::Break);
                at_line_start = true;
            }
            InlineItem::Text(text, style) => {
                for c in text.chars() {
                    if is_collapsible(c) {
                        flush(&mut word, *style, &mut tokens);
                        if !at_line_start && pending_space.is_none() {
                            pending_space = Some(*style);
                        }
                    } else {
                        if let Some(space) = pending_space.take() {
                            tokens.push(Token::Space(space));
                        }
                        word.push(c);
                        at_line_start = false;
                    }
                }
                flush(&mut word, *style, &mut tokens);
            }
        }
    }
    tokens
}

/// Break inline content into lines no wider than `max_width` where possible.
/// A word wider than the line is split between characters.
pub fn layout_lines(items: &[InlineItem], max_width: f32) -> Vec<Line> {
    let tokens = tokenize(items);
    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut pending_space: Option<RunStyle> = None;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                pending_space = None;
                i += 1;
            }
            Token::Space(style) => {
                pending_space = Some(*style);
                i += 1;
            }
            Token::Word(..) => {
                // Words with no space between them move as one chunk.
                let mut chunk: Vec<(&str, RunStyle)> = Vec::new();
                while let Some(Token::Word(text, style)) = tokens.get(i) {
                    chunk.push((text.as_str(), *style));
                    i += 1;
                }
                let chunk_width: f32 = chunk.iter().map(|(t, s)| s.font.measure(t)).sum();
                let space_width = pending_space.map_or(0.0, |s| s.font.measure(" "));

                if !line.is_empty() && line.width + space_width + chunk_width > max_width {
                    lines.push(std::mem::take(&mut line));
                } else if let (Some(space), false) = (pending_space, line.is_empty()) {
                    line.push(" ", space);
                }
                pending_space = None;

                if line.is_empty() && chunk_width > max_width {
                    for (text, style) in chunk {
                        let mut buf = [0u8; 4];
                        for c in text.chars() {
                            let glyph = c.encode_utf8(&mut buf);
                            let w = style.font.measure(glyph);
                            if !line.is_empty() && line.width + w > max_width {
                                lines.push(std::mem::take(&mut line));
                            }
                            line.push(glyph, style);
                        }
                    }
                } else {
                    for (text, style) in chunk {
                        line.push(text, style);
                    }
                }
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(size: f32) -> RunStyle {
        RunStyle {
            font: FontSpec {
                size,
                ..FontSpec::default()
            },
            color: Color::BLACK,
            underline: false,
        }
    }

    fn text(s: &str) -> InlineItem {
        InlineItem::Text(s.to_string(), style(10.0))
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    #[test]
    fn collapses_whitespace() {
        let lines = layout_lines(&[text("  Hello \n\t world  ")], 1000.0);
        assert_eq!(texts(&lines), vec!["Hello world"]);
    }

    #[test]
    fn wraps_at_spaces() {
        let lines = layout_lines(&[text("Hello world foo bar")], 40.0);
        assert!(lines.len() >= 2, "{:?}", texts(&lines));
        assert!(lines.iter().all(|l| l.width <= 40.0));
        assert_eq!(texts(&lines).join(" "), "Hello world foo bar");
    }

    #[test]
    fn nbsp_keeps_words_together() {
        // "ab a" fits in 22px, but "a&nbsp;b" cannot be split after "a".
        let lines = layout_lines(&[text("ab a\u{A0}b")], 22.0);
        assert_eq!(texts(&lines), vec!["ab", "a\u{A0}b"]);
    }

    #[test]
    fn breaks_force_lines() {
        let lines = layout_lines(&[text("a"), InlineItem::Break, InlineItem::Break, text(" b")], 100.0);
        assert_eq!(texts(&lines), vec!["a", "", "b"]);
    }

    #[test]
    fn trailing_break_adds_no_line() {
        let lines = layout_lines(&[text("a"), InlineItem::Break], 100.0);
        assert_eq!(texts(&lines), vec!["a"]);
    }

    #[test]
    fn runs_keep_their_styles() {
        let bold = RunStyle {
            font: FontSpec {
                bold: true,
                ..style(10.0).font
            },
            ..style(10.0)
        };
        let lines = layout_lines(
            &[
                InlineItem::Text("Due:".into(), bold),
                text(" "),
                text("05 Mar 2024"),
            ],
            1000.0,
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments.len(), 2);
        assert_eq!(lines[0].segments[0].text, "Due:");
        assert_eq!(lines[0].segments[1].text, " 05 Mar 2024");
        assert!((lines[0].segments[1].x - bold.font.measure("Due:")).abs() < 0.001);
    }

    #[test]
    fn adjacent_runs_without_space_do_not_break() {
        let lines = layout_lines(&[text("abc"), text("def"), text(" ghi")], 40.0);
        assert_eq!(texts(&lines)[0], "abcdef");
    }

    #[test]
    fn overlong_word_splits() {
        let lines = layout_lines(&[text("WWWWWWWWWW")], 20.0);
        assert!(lines.len() > 1);
        assert_eq!(texts(&lines).concat(), "WWWWWWWWWW");
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(layout_lines(&[text("  \n ")], 100.0).is_empty());
    }
}
