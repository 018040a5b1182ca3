//! # nomos-diag
//!
//! Shared diagnostic model for the compiler: a fixed kind taxonomy, a
//! [`Diagnostic`] carrying an optional source span and snippet, and the
//! `file:line:col: kind: message` formatter used everywhere an error or
//! warning reaches a user.

use std::fmt;

use nomos_syntax::{ParseError, ParseErrorKind, Span};

/// The fixed taxonomy of diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Io,
    Validation,
    ProviderResolution,
    ProviderRuntime,
    VersionConflict,
    Cancelled,
    Encoder,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Io => "io",
            ErrorKind::Validation => "validation",
            ErrorKind::ProviderResolution => "provider-resolution",
            ErrorKind::ProviderRuntime => "provider-runtime",
            ErrorKind::VersionConflict => "version-conflict",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Encoder => "encoder",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single located problem, fatal or not.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span: None,
            snippet: None,
        }
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            span: None,
            snippet: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        if !snippet.is_empty() {
            self.snippet = Some(snippet);
        }
        self
    }

    /// `file:line:col: kind: message` when a span is present, else
    /// `kind: message`; the snippet (if any) follows on its own lines.
    pub fn render(&self) -> String {
        let head = match &self.span {
            Some(span) => format!(
                "{}:{}:{}: {}: {}",
                span.filename, span.start_line, span.start_col, self.kind, self.message
            ),
            None => format!("{}: {}", self.kind, self.message),
        };
        match &self.snippet {
            Some(snippet) => format!("{head}\n{snippet}"),
            None => head,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for Diagnostic {}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        let kind = match err.kind {
            ParseErrorKind::Lex => ErrorKind::Lex,
            ParseErrorKind::Syntax => ErrorKind::Syntax,
            ParseErrorKind::Io => ErrorKind::Io,
        };
        let span = Span::point(err.filename.clone(), err.line, err.col);
        Diagnostic::error(kind, err.message)
            .with_span(span)
            .with_snippet(err.snippet)
    }
}

/// Errors and warnings collected over one compilation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the compilation failed; `strict` promotes warnings.
    pub fn failed(&self, strict: bool) -> bool {
        self.has_errors() || (strict && !self.warnings.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_with_span_prefixes_location() {
        let d = Diagnostic::error(ErrorKind::Validation, "duplicate alias `db`")
            .with_span(Span::point("a.csl", 4, 3));
        assert_eq!(d.render(), "a.csl:4:3: validation: duplicate alias `db`");
    }

    #[test]
    fn render_without_span_omits_location() {
        let d = Diagnostic::error(ErrorKind::Encoder, "invalid key");
        assert_eq!(d.render(), "encoder: invalid key");
    }

    #[test]
    fn parse_errors_convert_with_kind_and_snippet() {
        let err = nomos_syntax::Parser::new()
            .parse("bad.csl", "app: \"unclosed\n")
            .unwrap_err();
        let d = Diagnostic::from(err);
        assert_eq!(d.kind, ErrorKind::Lex);
        assert_eq!(d.severity, Severity::Error);
        assert!(d.span.is_some());
        assert!(d.snippet.as_deref().is_some_and(|s| s.contains("unclosed")));
    }

    #[test]
    fn strict_promotes_warnings_to_failure() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning(ErrorKind::Validation, "type conflict"));
        assert!(!diags.failed(false));
        assert!(diags.failed(true));
        assert!(!diags.has_errors());
    }
}
