//! Source documents and cursor tracking
//!
//! A [`Document`] owns the text of one Aua source unit (a file, a REPL line,
//! an imported script) and knows how to slice it for diagnostics. A
//! [`Cursor`] is a position within a document; the lexer advances cursors
//! and every token and AST node carries one, so errors anywhere in the
//! pipeline can point back at the offending source.

use std::fmt;

/// How many lines of surrounding context a diagnostic shows on each side.
const CONTEXT_LINES: usize = 3;

/// A position in a source document.
///
/// Lines and columns are 0-indexed internally (1-indexed for user display).
/// `offset` is the byte offset into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Cursor {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Cursor {
            line,
            column,
            offset,
        }
    }

    /// Advance past one character, tracking line breaks.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for user display
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

/// A named source text with a precomputed line index.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    text: String,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Document {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the document (a trailing newline does not start
    /// a new countable line unless text follows it).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The text of one line, without its trailing newline.
    /// Out-of-range lines return the empty string.
    pub fn line(&self, index: usize) -> &str {
        let Some(&start) = self.line_starts.get(index) else {
            return "";
        };
        let end = self
            .line_starts
            .get(index + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.text.len());
        &self.text[start..end.max(start)]
    }

    /// Render a diagnostic message with a context window around `cursor`:
    /// up to three lines before, the offending line with a caret under the
    /// column, up to three lines after, and an optional hint.
    pub fn diagnostic(&self, message: &str, cursor: Cursor, hint: Option<&str>) -> String {
        let mut out = format!("{} at {}:\n", message, cursor);

        let first = cursor.line.saturating_sub(CONTEXT_LINES);
        for i in first..cursor.line {
            out.push_str(self.line(i));
            out.push('\n');
        }

        out.push_str(self.line(cursor.line));
        out.push('\n');
        out.push_str(&" ".repeat(cursor.column));
        out.push('^');

        let last = (cursor.line + CONTEXT_LINES + 1).min(self.line_count());
        for i in (cursor.line + 1)..last {
            out.push('\n');
            out.push_str(self.line(i));
        }

        if let Some(hint) = hint {
            out.push('\n');
            out.push_str(hint);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advance_tracks_lines() {
        let mut cursor = Cursor::default();
        for ch in "ab\ncd".chars() {
            cursor.advance(ch);
        }
        assert_eq!(cursor.line, 1);
        assert_eq!(cursor.column, 2);
        assert_eq!(cursor.offset, 5);
    }

    #[test]
    fn test_line_slicing() {
        let doc = Document::new("test", "one\ntwo\nthree");
        assert_eq!(doc.line(0), "one");
        assert_eq!(doc.line(1), "two");
        assert_eq!(doc.line(2), "three");
        assert_eq!(doc.line(9), "");
    }

    #[test]
    fn test_diagnostic_includes_caret_and_context() {
        let doc = Document::new("test", "a = 1\nb = ?\nc = 3");
        let rendered = doc.diagnostic("unexpected character '?'", Cursor::new(1, 4, 10), None);
        assert!(rendered.starts_with("unexpected character '?' at line 2, column 5:"));
        assert!(rendered.contains("a = 1"));
        assert!(rendered.contains("b = ?\n    ^"));
        assert!(rendered.contains("c = 3"));
    }

    #[test]
    fn test_diagnostic_hint_is_appended() {
        let doc = Document::new("test", "x");
        let rendered = doc.diagnostic("boom", Cursor::default(), Some("try harder"));
        assert!(rendered.ends_with("try harder"));
    }
}
