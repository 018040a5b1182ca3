//! Parse error type with location-aware snippets

use std::fmt;
use std::path::Path;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// The broad class of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed token-level input (tabs in indentation, unmatched quotes)
    Lex,
    /// Structurally invalid input
    Syntax,
    /// The source file could not be read
    Io,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Lex => write!(f, "lex"),
            ParseErrorKind::Syntax => write!(f, "syntax"),
            ParseErrorKind::Io => write!(f, "io"),
        }
    }
}

/// A parse failure at a specific source position.
///
/// `snippet` is a rendered excerpt of the offending line with a caret under
/// the failing column; it is empty for IO errors where no source text exists.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{filename}:{line}:{col}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub filename: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
    pub snippet: String,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        filename: impl Into<String>,
        line: usize,
        col: usize,
        message: impl Into<String>,
        source: &str,
    ) -> Self {
        let filename = filename.into();
        let snippet = render_snippet(source, line, col);
        Self {
            kind,
            filename,
            line,
            col,
            message: message.into(),
            snippet,
        }
    }

    /// A file-read failure; carries no snippet
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self {
            kind: ParseErrorKind::Io,
            filename: path.display().to_string(),
            line: 1,
            col: 1,
            message: err.to_string(),
            snippet: String::new(),
        }
    }
}

/// Render the offending line with a caret underlining `col`.
///
/// `col` is a 1-indexed byte column; the caret is aligned by counting
/// characters so multi-byte runes before the column do not skew it.
pub fn render_snippet(source: &str, line: usize, col: usize) -> String {
    let Some(text) = source.lines().nth(line.saturating_sub(1)) else {
        return String::new();
    };
    let text = text.trim_end_matches('\r');
    let byte_offset = col.saturating_sub(1).min(text.len());
    let char_offset = text
        .char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count();
    let gutter = format!("{line:>4} | ");
    let pad = " ".repeat(gutter.len() - 2);
    format!(
        "{gutter}{text}\n{pad}| {caret:>width$}",
        caret = "^",
        width = char_offset + 1
    )
}
