//! AST produced by the `.csl` parser
//!
//! Every node carries a [`Span`] naming the file region it was parsed from.
//! Structural equality (`structural_eq`) compares nodes while ignoring spans;
//! it is what the canonical-print round-trip guarantees.

use std::fmt;

use crate::span::Span;

/// One segment of a reference path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    /// A named key, e.g. `db` in `@prod:db.host`
    Key(String),
    /// A numeric list index, written `[3]`
    Index(usize),
    /// The terminal `*`, selecting the provider's whole tree
    Wildcard,
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSeg::Key(k) => write!(f, "{k}"),
            PathSeg::Index(i) => write!(f, "[{i}]"),
            PathSeg::Wildcard => write!(f, "*"),
        }
    }
}

/// A string literal value. Outer matching quotes have already been trimmed.
#[derive(Debug, Clone)]
pub struct StringLit {
    pub value: String,
    pub span: Span,
}

/// An inline `@alias:path` reference.
#[derive(Debug, Clone)]
pub struct ReferenceExpr {
    pub alias: String,
    /// Non-empty; `Wildcard` may only appear as the final segment.
    pub path: Vec<PathSeg>,
    /// Covers the whole token including the leading `@`.
    pub span: Span,
}

impl ReferenceExpr {
    /// Render the path portion (`a.b[0].*`) without the alias
    pub fn path_display(&self) -> String {
        let mut out = String::new();
        for (i, seg) in self.path.iter().enumerate() {
            match seg {
                PathSeg::Index(_) => out.push_str(&seg.to_string()),
                _ => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&seg.to_string());
                }
            }
        }
        out
    }
}

impl fmt::Display for ReferenceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.alias, self.path_display())
    }
}

/// An ordered list of expressions.
#[derive(Debug, Clone)]
pub struct ListExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

/// An ordered mapping. Spread entries have no key and splice a referenced
/// map into the surrounding mapping at the point they appear.
#[derive(Debug, Clone)]
pub struct MapExpr {
    pub entries: Vec<MapEntry>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MapEntry {
    /// Unset when `spread` is true
    pub key: Option<String>,
    pub value: Expr,
    pub spread: bool,
    pub span: Span,
}

/// Any expression position in a `.csl` file.
#[derive(Debug, Clone)]
pub enum Expr {
    Str(StringLit),
    Reference(ReferenceExpr),
    List(ListExpr),
    Map(MapExpr),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Str(s) => &s.span,
            Expr::Reference(r) => &r.span,
            Expr::List(l) => &l.span,
            Expr::Map(m) => &m.span,
        }
    }

    /// Span-insensitive equality
    pub fn structural_eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Str(a), Expr::Str(b)) => a.value == b.value,
            (Expr::Reference(a), Expr::Reference(b)) => a.alias == b.alias && a.path == b.path,
            (Expr::List(a), Expr::List(b)) => {
                a.elements.len() == b.elements.len()
                    && a.elements
                        .iter()
                        .zip(&b.elements)
                        .all(|(x, y)| x.structural_eq(y))
            }
            (Expr::Map(a), Expr::Map(b)) => {
                a.entries.len() == b.entries.len()
                    && a.entries.iter().zip(&b.entries).all(|(x, y)| {
                        x.key == y.key && x.spread == y.spread && x.value.structural_eq(&y.value)
                    })
            }
            _ => false,
        }
    }
}

/// A `source:` declaration binding an alias to a provider.
#[derive(Debug, Clone)]
pub struct SourceDecl {
    pub alias: String,
    /// `owner/name` for a downloadable provider, or a pre-registered type name
    pub source_type: String,
    /// Semantic version string, or empty when unpinned
    pub version: String,
    /// Provider-specific configuration, in declaration order
    pub config: Vec<(String, Expr)>,
    pub span: Span,
    /// Span of the `alias` value, for duplicate-alias diagnostics
    pub alias_span: Span,
    /// Span of the `version` value when one was declared
    pub version_span: Option<Span>,
}

/// The body of a section declaration: exactly one of an inline/list value or
/// a block of map entries.
#[derive(Debug, Clone)]
pub enum SectionBody {
    Value(Expr),
    Entries(Vec<MapEntry>),
}

/// A named top-level section.
#[derive(Debug, Clone)]
pub struct SectionDecl {
    pub name: String,
    pub body: SectionBody,
    pub span: Span,
}

/// A top-level spread of an entire referenced map into the root output.
#[derive(Debug, Clone)]
pub struct SpreadStmt {
    pub reference: ReferenceExpr,
    pub span: Span,
}

/// A top-level statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Source(SourceDecl),
    Section(SectionDecl),
    Spread(SpreadStmt),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Source(s) => &s.span,
            Stmt::Section(s) => &s.span,
            Stmt::Spread(s) => &s.span,
        }
    }

    /// Span-insensitive equality
    pub fn structural_eq(&self, other: &Stmt) -> bool {
        match (self, other) {
            (Stmt::Source(a), Stmt::Source(b)) => {
                a.alias == b.alias
                    && a.source_type == b.source_type
                    && a.version == b.version
                    && a.config.len() == b.config.len()
                    && a.config
                        .iter()
                        .zip(&b.config)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.structural_eq(vb))
            }
            (Stmt::Section(a), Stmt::Section(b)) => {
                a.name == b.name
                    && match (&a.body, &b.body) {
                        (SectionBody::Value(x), SectionBody::Value(y)) => x.structural_eq(y),
                        (SectionBody::Entries(x), SectionBody::Entries(y)) => {
                            x.len() == y.len()
                                && x.iter().zip(y).all(|(m, n)| {
                                    m.key == n.key
                                        && m.spread == n.spread
                                        && m.value.structural_eq(&n.value)
                                })
                        }
                        _ => false,
                    }
            }
            (Stmt::Spread(a), Stmt::Spread(b)) => {
                a.reference.alias == b.reference.alias && a.reference.path == b.reference.path
            }
            _ => false,
        }
    }
}

/// A fully parsed `.csl` file: its statements plus a root span.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl SourceFile {
    /// Span-insensitive equality over all statements
    pub fn structural_eq(&self, other: &SourceFile) -> bool {
        self.statements.len() == other.statements.len()
            && self
                .statements
                .iter()
                .zip(&other.statements)
                .all(|(a, b)| a.structural_eq(b))
    }
}
