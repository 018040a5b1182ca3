//! # nomos-syntax
//!
//! Parser for the `.csl` configuration language: an indentation-sensitive
//! grammar of source declarations, nested sections, lists and inline
//! `@alias:path` references.
//!
//! The parser is a from-scratch recursive descent over significant lines;
//! every AST node carries a [`Span`] with 1-indexed, byte-based columns, and
//! failures surface as a typed [`ParseError`] with a caret snippet.

pub mod ast;
pub mod error;
pub mod parser;
pub mod print;
pub mod span;

pub use ast::{
    Expr, ListExpr, MapEntry, MapExpr, PathSeg, ReferenceExpr, SectionBody, SectionDecl,
    SourceDecl, SourceFile, SpreadStmt, Stmt, StringLit,
};
pub use error::{ParseError, ParseErrorKind, Result};
pub use parser::{Parser, MAX_LIST_DEPTH};
pub use span::Span;
