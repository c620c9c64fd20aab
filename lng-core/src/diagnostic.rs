//! Caret-annotated error reports.
//!
//! A `Diagnostic` pins an error category and a one-line detail to a span.
//! Rendering against the `Source` yields the report shown to the user:
//!
//! ```text
//! Illegal Character: '$'
//! File demo.lng, line 1
//!
//! print($)
//!       ^
//! ```

use std::fmt;

use crate::span::{Source, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error category, e.g. "Illegal Character" or "Invalid Syntax".
    pub title: &'static str,
    pub detail: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(title: &'static str, detail: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            title,
            detail: detail.into(),
            span,
        }
    }

    /// Full report: category line, file/line header, and a caret-annotated
    /// excerpt of the offending span.
    pub fn render(&self, source: &Source) -> String {
        let mut out = String::new();
        out.push_str(&format!("{self}\n"));
        out.push_str(&format!(
            "File {}, line {}\n\n",
            source.name,
            self.span.start.line + 1
        ));
        out.push_str(&excerpt_with_carets(&source.text, self.span));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.detail)
    }
}

/// Quote every source line the span touches, each followed by a caret row.
/// A zero-width span still gets one caret so the location stays visible.
fn excerpt_with_carets(text: &str, span: Span) -> String {
    let mut out = String::new();
    let line_count = (span.end.line - span.start.line) as usize + 1;
    let mut line_start = text[..span.start.offset]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    for i in 0..line_count {
        let line_end = text[line_start..]
            .find('\n')
            .map(|j| line_start + j)
            .unwrap_or(text.len());
        let line = &text[line_start..line_end];

        let col_start = if i == 0 { span.start.column as usize } else { 0 };
        let col_end = if i == line_count - 1 {
            span.end.column as usize
        } else {
            line.chars().count()
        };
        let carets = col_end.saturating_sub(col_start).max(1);

        // Tabs would desync the caret row from the quoted line.
        for ch in line.chars() {
            out.push(if ch == '\t' { ' ' } else { ch });
        }
        out.push('\n');
        out.push_str(&" ".repeat(col_start));
        out.push_str(&"^".repeat(carets));
        out.push('\n');

        line_start = (line_end + 1).min(text.len());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn span_at(offset: usize, line: u32, column: u32, len: usize) -> Span {
        let start = Position {
            offset,
            line,
            column,
        };
        let end = Position {
            offset: offset + len,
            line,
            column: column + len as u32,
        };
        Span::new(start, end)
    }

    #[test]
    fn renders_single_line_excerpt() {
        let source = Source::new("demo.lng", "print($)\n");
        let diag = Diagnostic::new("Illegal Character", "'$'", span_at(6, 0, 6, 1));
        assert_eq!(
            diag.render(&source),
            "Illegal Character: '$'\nFile demo.lng, line 1\n\nprint($)\n      ^\n"
        );
    }

    #[test]
    fn renders_one_based_line_numbers() {
        let source = Source::new("demo.lng", "print(1)\nprint(#)\n");
        let diag = Diagnostic::new("Illegal Character", "'#'", span_at(15, 1, 6, 1));
        let report = diag.render(&source);
        assert!(report.contains("File demo.lng, line 2"));
        assert!(report.contains("print(#)\n      ^\n"));
    }

    #[test]
    fn zero_width_span_keeps_one_caret() {
        let source = Source::new("demo.lng", "1 + 2");
        let diag = Diagnostic::new("Invalid Syntax", "Expected int or float", span_at(5, 0, 5, 0));
        let report = diag.render(&source);
        assert!(report.ends_with("1 + 2\n     ^\n"));
    }
}
