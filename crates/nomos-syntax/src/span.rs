//! Source positions for AST nodes and diagnostics

use std::fmt;

/// A half-open region of a source file, 1-indexed, with byte-based columns.
///
/// `end_line`/`end_col` are inclusive: a one-character token at the start of
/// a file spans `(1, 1)..(1, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub filename: String,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    /// Create a span covering a single line region
    pub fn on_line(filename: impl Into<String>, line: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            filename: filename.into(),
            start_line: line,
            start_col,
            end_line: line,
            end_col,
        }
    }

    /// Create a single-position span
    pub fn point(filename: impl Into<String>, line: usize, col: usize) -> Self {
        Self::on_line(filename, line, col, col)
    }

    /// The smallest span that covers both `self` and `other`
    pub fn merge(&self, other: &Span) -> Span {
        let (start_line, start_col) =
            if (other.start_line, other.start_col) < (self.start_line, self.start_col) {
                (other.start_line, other.start_col)
            } else {
                (self.start_line, self.start_col)
            };
        let (end_line, end_col) = if (other.end_line, other.end_col) > (self.end_line, self.end_col)
        {
            (other.end_line, other.end_col)
        } else {
            (self.end_line, self.end_col)
        };
        Span {
            filename: self.filename.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.start_line, self.start_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_outermost_bounds() {
        let a = Span::on_line("f.csl", 2, 3, 9);
        let b = Span::on_line("f.csl", 4, 1, 5);
        let merged = a.merge(&b);
        assert_eq!(merged.start_line, 2);
        assert_eq!(merged.start_col, 3);
        assert_eq!(merged.end_line, 4);
        assert_eq!(merged.end_col, 5);
    }

    #[test]
    fn display_is_file_line_col() {
        let s = Span::point("cfg/app.csl", 7, 12);
        assert_eq!(s.to_string(), "cfg/app.csl:7:12");
    }
}
