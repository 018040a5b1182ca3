//! Recursive-descent parser for the `.csl` grammar
//!
//! The grammar is indentation-sensitive: blocks nest by exactly two spaces,
//! tabs in indentation are invalid, and list items are introduced by `- `
//! markers at a fixed column. Comments start with `#` outside quoted strings
//! and run to end of line. A [`Parser`] holds no state across calls and can
//! be shared freely.

use std::path::Path;

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::span::Span;

/// Maximum list nesting depth; depth 20 parses, 21 is a syntax error.
pub const MAX_LIST_DEPTH: usize = 20;

const INDENT_STEP: usize = 2;

/// Stateless `.csl` parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<SourceFile> {
        let source = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, &e))?;
        self.parse(&path.display().to_string(), &source)
    }

    /// Parse `source`, attributing spans to `filename`.
    pub fn parse(&self, filename: &str, source: &str) -> Result<SourceFile> {
        let mut ctx = Ctx::new(filename, source)?;
        let statements = ctx.parse_statements()?;
        tracing::debug!(file = filename, statements = statements.len(), "parsed source file");
        Ok(SourceFile {
            statements,
            span: ctx.root_span(),
        })
    }
}

/// One significant (non-blank, comment-stripped) source line.
#[derive(Debug)]
struct Line {
    /// 1-indexed source line number
    number: usize,
    /// Count of leading spaces (bytes)
    indent: usize,
    /// Content after the indent, comment-stripped and right-trimmed
    text: String,
}

impl Line {
    /// 1-indexed byte column where `text` begins
    fn col(&self) -> usize {
        self.indent + 1
    }

    fn end_col(&self) -> usize {
        self.indent + self.text.len()
    }
}

struct Ctx<'a> {
    filename: String,
    source: &'a str,
    lines: Vec<Line>,
    pos: usize,
    last_line: usize,
    last_line_len: usize,
}

impl<'a> Ctx<'a> {
    fn new(filename: &str, source: &'a str) -> Result<Self> {
        let mut lines = Vec::new();
        let mut last_line = 1;
        let mut last_line_len = 1;
        for (idx, raw) in source.lines().enumerate() {
            let number = idx + 1;
            let raw = raw.trim_end_matches('\r');
            if !raw.is_empty() {
                last_line = number;
                last_line_len = raw.len().max(1);
            }
            let indent = leading_indent(filename, source, number, raw)?;
            let stripped = strip_comment(&raw[indent..]);
            let text = stripped.trim_end().to_string();
            if text.is_empty() {
                continue;
            }
            if indent % INDENT_STEP != 0 {
                return Err(ParseError::new(
                    ParseErrorKind::Syntax,
                    filename,
                    number,
                    indent + 1,
                    "indentation must be a multiple of two spaces",
                    source,
                ));
            }
            lines.push(Line { number, indent, text });
        }
        Ok(Self {
            filename: filename.to_string(),
            source,
            lines,
            pos: 0,
            last_line,
            last_line_len,
        })
    }

    fn root_span(&self) -> Span {
        Span {
            filename: self.filename.clone(),
            start_line: 1,
            start_col: 1,
            end_line: self.last_line,
            end_col: self.last_line_len,
        }
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn err(&self, kind: ParseErrorKind, line: usize, col: usize, msg: impl Into<String>) -> ParseError {
        ParseError::new(kind, &self.filename, line, col, msg, self.source)
    }

    fn syntax(&self, line: usize, col: usize, msg: impl Into<String>) -> ParseError {
        self.err(ParseErrorKind::Syntax, line, col, msg)
    }

    fn line_span(&self, line: &Line) -> Span {
        Span::on_line(&self.filename, line.number, line.col(), line.end_col())
    }

    // ---- top level ------------------------------------------------------

    fn parse_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent != 0 {
                return Err(self.syntax(line.number, 1, "unexpected indentation at top level"));
            }
            let text = line.text.clone();
            if text == "source:" {
                statements.push(Stmt::Source(self.parse_source()?));
            } else if text.starts_with('@') {
                let (line_no, col) = (line.number, line.col());
                let reference = self.parse_reference(&text, line_no, col)?;
                let span = reference.span.clone();
                self.advance();
                statements.push(Stmt::Spread(SpreadStmt { reference, span }));
            } else if text == "reference:" || text.starts_with("reference:") {
                return Err(self.syntax(
                    line.number,
                    1,
                    "`reference:` blocks are no longer supported; use an inline `@alias:path` value instead",
                ));
            } else if text == "import:" || text.starts_with("import:") {
                return Err(self.syntax(
                    line.number,
                    1,
                    "`import:` is no longer supported; use an inline `@alias:path` value instead",
                ));
            } else {
                statements.push(Stmt::Section(self.parse_section()?));
            }
        }
        Ok(statements)
    }

    // ---- source declarations -------------------------------------------

    fn parse_source(&mut self) -> Result<SourceDecl> {
        let header = self.peek().expect("caller checked");
        let header_span = self.line_span(header);
        let header_line = header.number;
        self.advance();

        if !self.block_follows(0) {
            return Err(self.syntax(
                header_line,
                1,
                "`source:` requires an indented block with an `alias` field",
            ));
        }
        let entries = self.parse_map_block(INDENT_STEP, false)?;

        let mut alias = None;
        let mut source_type = String::new();
        let mut version = String::new();
        let mut alias_span = None;
        let mut version_span = None;
        let mut config = Vec::new();
        let mut end_span = header_span.clone();

        for entry in entries {
            end_span = end_span.merge(&entry.span);
            let key = entry.key.expect("spreads rejected in source blocks");
            match (key.as_str(), &entry.value) {
                ("alias", Expr::Str(s)) => {
                    alias = Some(s.value.clone());
                    alias_span = Some(s.span.clone());
                }
                ("type", Expr::Str(s)) => source_type = s.value.clone(),
                ("version", Expr::Str(s)) => {
                    version = s.value.clone();
                    version_span = Some(s.span.clone());
                }
                ("alias" | "type" | "version", other) => {
                    let span = other.span().clone();
                    return Err(self.syntax(
                        span.start_line,
                        span.start_col,
                        format!("source `{key}` must be a string"),
                    ));
                }
                _ => config.push((key, entry.value)),
            }
        }

        let Some(alias) = alias else {
            return Err(self.syntax(header_line, 1, "source declaration is missing an `alias` field"));
        };
        if alias.is_empty() {
            let s = alias_span.as_ref().expect("set with alias");
            return Err(self.syntax(s.start_line, s.start_col, "source alias must not be empty"));
        }

        Ok(SourceDecl {
            alias,
            source_type,
            version,
            config,
            span: header_span.merge(&end_span),
            alias_span: alias_span.expect("set with alias"),
            version_span,
        })
    }

    // ---- sections ------------------------------------------------------

    fn parse_section(&mut self) -> Result<SectionDecl> {
        let line = self.peek().expect("caller checked");
        let (line_no, line_col) = (line.number, line.col());
        let header_span = self.line_span(line);
        let text = line.text.clone();
        let (name, rest, rest_col) = self.parse_key(&text, line_no, line_col)?;
        self.advance();

        if !rest.is_empty() {
            let value = self.parse_inline_value(&rest, line_no, rest_col)?;
            let span = header_span.merge(value.span());
            return Ok(SectionDecl {
                name,
                body: SectionBody::Value(value),
                span,
            });
        }

        match self.block_kind(0)? {
            BlockKind::List => {
                let list = self.parse_list(INDENT_STEP, 1)?;
                let span = header_span.merge(&list.span);
                Ok(SectionDecl {
                    name,
                    body: SectionBody::Value(Expr::List(list)),
                    span,
                })
            }
            BlockKind::Map => {
                let entries = self.parse_map_block(INDENT_STEP, true)?;
                let span = entries
                    .iter()
                    .fold(header_span.clone(), |acc, e| acc.merge(&e.span));
                Ok(SectionDecl {
                    name,
                    body: SectionBody::Entries(entries),
                    span,
                })
            }
            BlockKind::None => Err(self.syntax(
                line_no,
                line_col,
                format!("expected a value or an indented block after `{name}:`"),
            )),
        }
    }

    // ---- blocks --------------------------------------------------------

    /// Does an indented block follow at `parent_indent + 2`?
    fn block_follows(&self, parent_indent: usize) -> bool {
        matches!(self.peek(), Some(l) if l.indent > parent_indent)
    }

    /// Classify the block following a `key:` line at `parent_indent`.
    fn block_kind(&self, parent_indent: usize) -> Result<BlockKind> {
        match self.peek() {
            Some(l) if l.indent > parent_indent => {
                if l.indent != parent_indent + INDENT_STEP {
                    return Err(self.syntax(
                        l.number,
                        1,
                        format!(
                            "expected indentation of {} spaces, found {}",
                            parent_indent + INDENT_STEP,
                            l.indent
                        ),
                    ));
                }
                if is_list_item(&l.text) {
                    Ok(BlockKind::List)
                } else {
                    Ok(BlockKind::Map)
                }
            }
            _ => Ok(BlockKind::None),
        }
    }

    /// Parse map entries at exactly `indent`.
    fn parse_map_block(&mut self, indent: usize, allow_spread: bool) -> Result<Vec<MapEntry>> {
        let mut entries = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.syntax(
                    line.number,
                    1,
                    format!("expected indentation of {} spaces, found {}", indent, line.indent),
                ));
            }
            let (line_no, col) = (line.number, line.col());
            let text = line.text.clone();

            if is_list_item(&text) {
                return Err(self.syntax(
                    line_no,
                    col,
                    "list items must follow a `key:` line introducing the list",
                ));
            }

            if text.starts_with('@') {
                let reference = self.parse_reference(&text, line_no, col)?;
                if !allow_spread {
                    return Err(self.syntax(
                        line_no,
                        col,
                        "spread references are not allowed in a source declaration",
                    ));
                }
                let span = reference.span.clone();
                self.advance();
                entries.push(MapEntry {
                    key: None,
                    value: Expr::Reference(reference),
                    spread: true,
                    span,
                });
                continue;
            }

            let entry_span = self.line_span(line);
            let (key, rest, rest_col) = self.parse_key(&text, line_no, col)?;
            self.advance();

            let value = if !rest.is_empty() {
                self.parse_inline_value(&rest, line_no, rest_col)?
            } else {
                match self.block_kind(indent)? {
                    BlockKind::List => Expr::List(self.parse_list(indent + INDENT_STEP, 1)?),
                    BlockKind::Map => {
                        let inner = self.parse_map_block(indent + INDENT_STEP, allow_spread)?;
                        let span = inner
                            .iter()
                            .fold(entry_span.clone(), |acc, e| acc.merge(&e.span));
                        Expr::Map(MapExpr { entries: inner, span })
                    }
                    BlockKind::None => {
                        return Err(self.syntax(
                            line_no,
                            col,
                            format!("expected a value or an indented block after `{key}:`"),
                        ));
                    }
                }
            };

            let span = entry_span.merge(value.span());
            entries.push(MapEntry {
                key: Some(key),
                value,
                spread: false,
                span,
            });
        }
        Ok(entries)
    }

    // ---- lists ---------------------------------------------------------

    /// Parse list items whose `-` markers sit at byte column `col + 1`
    /// (i.e. `indent == col`).
    fn parse_list(&mut self, indent: usize, depth: usize) -> Result<ListExpr> {
        let first = self.peek().expect("caller classified a list block");
        if depth > MAX_LIST_DEPTH {
            return Err(self.syntax(
                first.number,
                first.col(),
                format!("list nesting exceeds the maximum depth of {MAX_LIST_DEPTH}"),
            ));
        }
        let mut span = self.line_span(first);
        let mut elements = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.syntax(
                    line.number,
                    1,
                    format!("expected indentation of {} spaces, found {}", indent, line.indent),
                ));
            }
            if !is_list_item(&line.text) {
                break;
            }
            let (line_no, col) = (line.number, line.col());
            let item_span = self.line_span(line);
            let rest = list_item_rest(&line.text);
            let rest_col = col + (line.text.len() - rest.len());
            let rest = rest.to_string();
            self.advance();

            let value = self.parse_list_item(&rest, line_no, rest_col, indent, depth)?;
            span = span.merge(&item_span).merge(value.span());
            elements.push(value);
        }

        Ok(ListExpr { elements, span })
    }

    /// Parse the value of one list item whose dash sits at `dash_indent` and
    /// whose content (possibly empty) is `rest` starting at `rest_col`.
    fn parse_list_item(
        &mut self,
        rest: &str,
        line_no: usize,
        rest_col: usize,
        dash_indent: usize,
        depth: usize,
    ) -> Result<Expr> {
        if rest.is_empty() {
            // `-` alone: the item's value is the indented block below
            return match self.block_kind(dash_indent)? {
                BlockKind::List => Ok(Expr::List(self.parse_list(dash_indent + INDENT_STEP, depth + 1)?)),
                BlockKind::Map => {
                    let entries = self.parse_map_block(dash_indent + INDENT_STEP, true)?;
                    let span = entries.iter().skip(1).fold(
                        entries
                            .first()
                            .map(|e| e.span.clone())
                            .unwrap_or_else(|| Span::point(&self.filename, line_no, rest_col)),
                        |acc, e| acc.merge(&e.span),
                    );
                    Ok(Expr::Map(MapExpr { entries, span }))
                }
                BlockKind::None => Err(self.syntax(line_no, dash_indent + 1, "empty list item")),
            };
        }

        if is_list_item(rest) {
            // inline nested list: `- - x`
            if depth + 1 > MAX_LIST_DEPTH {
                return Err(self.syntax(
                    line_no,
                    rest_col,
                    format!("list nesting exceeds the maximum depth of {MAX_LIST_DEPTH}"),
                ));
            }
            let inner_rest = list_item_rest(rest);
            let inner_col = rest_col + (rest.len() - inner_rest.len());
            let inner_rest = inner_rest.to_string();
            let first =
                self.parse_list_item(&inner_rest, line_no, inner_col, rest_col - 1, depth + 1)?;
            let mut span = first.span().clone();
            let mut elements = vec![first];
            // further items of the nested list continue below the inline dash
            while let Some(line) = self.peek() {
                if line.indent != rest_col - 1 || !is_list_item(&line.text) {
                    break;
                }
                let (n, c) = (line.number, line.col());
                let item_rest = list_item_rest(&line.text);
                let item_col = c + (line.text.len() - item_rest.len());
                let item_rest = item_rest.to_string();
                self.advance();
                let item = self.parse_list_item(&item_rest, n, item_col, rest_col - 1, depth + 1)?;
                span = span.merge(item.span());
                elements.push(item);
            }
            return Ok(Expr::List(ListExpr { elements, span }));
        }

        if rest.starts_with('@') {
            return Ok(Expr::Reference(self.parse_reference(rest, line_no, rest_col)?));
        }

        if let Some((key, value_text, value_col)) = self.try_parse_key(rest, rest_col) {
            // map item: first entry inline after the dash, continuation
            // entries on the following lines at the dash column + 2
            let entry_span = Span::on_line(&self.filename, line_no, rest_col, rest_col + rest.len() - 1);
            let value = if !value_text.is_empty() {
                self.parse_inline_value(&value_text, line_no, value_col)?
            } else {
                match self.block_kind(dash_indent + INDENT_STEP)? {
                    BlockKind::List => {
                        Expr::List(self.parse_list(dash_indent + 2 * INDENT_STEP, depth + 1)?)
                    }
                    BlockKind::Map => {
                        let inner = self.parse_map_block(dash_indent + 2 * INDENT_STEP, true)?;
                        let span = inner
                            .iter()
                            .fold(entry_span.clone(), |acc, e| acc.merge(&e.span));
                        Expr::Map(MapExpr { entries: inner, span })
                    }
                    BlockKind::None => {
                        return Err(self.syntax(
                            line_no,
                            rest_col,
                            format!("expected a value or an indented block after `{key}:`"),
                        ));
                    }
                }
            };
            let first = MapEntry {
                span: entry_span.merge(value.span()),
                key: Some(key),
                value,
                spread: false,
            };
            let mut entries = vec![first];
            if self.block_follows(dash_indent) {
                entries.extend(self.parse_map_block(dash_indent + INDENT_STEP, true)?);
            }
            let span = entries
                .iter()
                .skip(1)
                .fold(entries[0].span.clone(), |acc, e| acc.merge(&e.span));
            return Ok(Expr::Map(MapExpr { entries, span }));
        }

        self.parse_inline_value(rest, line_no, rest_col)
    }

    // ---- scalars and references ----------------------------------------

    /// Parse an inline value: `[]`, a reference, or a (possibly quoted)
    /// string literal.
    fn parse_inline_value(&self, text: &str, line: usize, col: usize) -> Result<Expr> {
        if text == "[]" {
            return Ok(Expr::List(ListExpr {
                elements: Vec::new(),
                span: Span::on_line(&self.filename, line, col, col + 1),
            }));
        }
        if text.starts_with('@') {
            return Ok(Expr::Reference(self.parse_reference(text, line, col)?));
        }
        let span = Span::on_line(&self.filename, line, col, col + text.len() - 1);
        let value = self.unquote(text, line, col)?;
        Ok(Expr::Str(StringLit { value, span }))
    }

    /// Trim one outer pair of matching single or double quotes.
    fn unquote(&self, text: &str, line: usize, col: usize) -> Result<String> {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return Ok(String::new());
        }
        let quote = bytes[0];
        if quote == b'"' || quote == b'\'' {
            if bytes.len() >= 2 && bytes[bytes.len() - 1] == quote {
                return Ok(text[1..text.len() - 1].to_string());
            }
            return Err(self.err(
                ParseErrorKind::Lex,
                line,
                col,
                "unmatched quote in string literal",
            ));
        }
        // an unopened closing quote at the end is equally unmatched
        let last = bytes[bytes.len() - 1];
        if (last == b'"' || last == b'\'') && !text[..text.len() - 1].contains(last as char) {
            return Err(self.err(
                ParseErrorKind::Lex,
                line,
                col + text.len() - 1,
                "unmatched quote in string literal",
            ));
        }
        Ok(text.to_string())
    }

    /// Parse `@alias:segment[.segment|[index]]*` or `@alias:*`.
    fn parse_reference(&self, text: &str, line: usize, col: usize) -> Result<ReferenceExpr> {
        debug_assert!(text.starts_with('@'));
        let span = Span::on_line(&self.filename, line, col, col + text.len() - 1);
        let body = &text[1..];

        let alias_len = alias_length(body);
        if alias_len == 0 {
            return Err(self.syntax(line, col + 1, "reference alias must match [A-Za-z_][A-Za-z0-9_-]*"));
        }
        let alias = body[..alias_len].to_string();
        let after_alias = &body[alias_len..];
        if !after_alias.starts_with(':') {
            return Err(self.syntax(line, col + 1 + alias_len, "expected `:` after reference alias"));
        }
        let path_text = &after_alias[1..];
        if path_text.is_empty() {
            return Err(self.syntax(line, col + 1 + alias_len + 1, "reference path is empty"));
        }

        let path_col = col + 1 + alias_len + 1;
        let mut path = Vec::new();
        let mut offset = 0;
        let segments: Vec<&str> = path_text.split('.').collect();
        let last_idx = segments.len() - 1;
        for (i, seg) in segments.iter().enumerate() {
            let seg_col = path_col + offset;
            offset += seg.len() + 1;
            if seg.is_empty() {
                return Err(self.syntax(line, seg_col, "empty reference path segment"));
            }
            if *seg == "*" {
                if i != last_idx {
                    return Err(self.syntax(
                        line,
                        seg_col,
                        "`*` may only appear as the final path segment",
                    ));
                }
                path.push(PathSeg::Wildcard);
                continue;
            }
            self.parse_path_segment(seg, line, seg_col, &mut path)?;
        }

        Ok(ReferenceExpr { alias, path, span })
    }

    /// Parse one dotted segment, splitting off `[index]` suffixes.
    fn parse_path_segment(
        &self,
        seg: &str,
        line: usize,
        col: usize,
        path: &mut Vec<PathSeg>,
    ) -> Result<()> {
        let name_end = seg.find('[').unwrap_or(seg.len());
        let name = &seg[..name_end];
        if name.is_empty() {
            return Err(self.syntax(line, col, "reference path segment is missing a key"));
        }
        if name.contains(|c: char| c.is_whitespace() || c == ']' || c == ':' || c == '@' || c == '*') {
            return Err(self.syntax(line, col, format!("invalid character in path segment `{name}`")));
        }
        path.push(PathSeg::Key(name.to_string()));

        let mut rest = &seg[name_end..];
        let mut rest_col = col + name_end;
        while !rest.is_empty() {
            let Some(close) = rest.find(']') else {
                return Err(self.syntax(line, rest_col, "unterminated `[` in reference path"));
            };
            if !rest.starts_with('[') {
                return Err(self.syntax(line, rest_col, "invalid list index in reference path"));
            }
            let digits = &rest[1..close];
            let index: usize = digits.parse().map_err(|_| {
                self.syntax(
                    line,
                    rest_col + 1,
                    format!("invalid list index `{digits}` in reference path"),
                )
            })?;
            path.push(PathSeg::Index(index));
            rest_col += close + 1;
            rest = &rest[close + 1..];
        }
        Ok(())
    }

    // ---- keys ----------------------------------------------------------

    /// Parse a `key:` prefix, returning the key, the trimmed remainder and
    /// the remainder's 1-indexed byte column.
    fn parse_key(&self, text: &str, line: usize, col: usize) -> Result<(String, String, usize)> {
        self.try_parse_key(text, col).ok_or_else(|| {
            self.syntax(line, col, "expected `key:` followed by a value or an indented block")
        })
    }

    /// Non-failing variant used to distinguish map items from scalars.
    ///
    /// A key ends at the first `:` outside quotes that is followed by a
    /// space or end of line, so scalars like `http://host` do not read as
    /// keys.
    fn try_parse_key(&self, text: &str, col: usize) -> Option<(String, String, usize)> {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return None;
        }
        let mut i = 0;
        // quoted key form: `"my key": value`
        if bytes[0] == b'"' || bytes[0] == b'\'' {
            let quote = bytes[0];
            let close = text[1..].find(quote as char)? + 1;
            if bytes.get(close + 1) != Some(&b':') {
                return None;
            }
            let after = close + 2;
            if after < bytes.len() && bytes[after] != b' ' {
                return None;
            }
            let key = text[1..close].to_string();
            let rest = text[after..].trim_start();
            let rest_col = col + text.len() - rest.len();
            return Some((key, rest.to_string(), rest_col));
        }
        let mut in_quote = 0u8;
        while i < bytes.len() {
            let b = bytes[i];
            if in_quote != 0 {
                if b == in_quote {
                    in_quote = 0;
                }
            } else if b == b'"' || b == b'\'' {
                in_quote = b;
            } else if b == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
                let key = text[..i].trim_end().to_string();
                if key.is_empty() {
                    return None;
                }
                let rest = text[i + 1..].trim_start();
                let rest_col = col + text.len() - rest.len();
                return Some((key, rest.to_string(), rest_col));
            }
            i += 1;
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    List,
    Map,
    None,
}

/// Length of a leading `[A-Za-z_][A-Za-z0-9_-]*` alias, 0 if absent.
fn alias_length(body: &str) -> usize {
    let bytes = body.as_bytes();
    if bytes.is_empty() || !(bytes[0].is_ascii_alphabetic() || bytes[0] == b'_') {
        return 0;
    }
    let mut len = 1;
    while len < bytes.len()
        && (bytes[len].is_ascii_alphanumeric() || bytes[len] == b'_' || bytes[len] == b'-')
    {
        len += 1;
    }
    len
}

/// Is this line a list item (`- x` or a lone `-`)?
fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Content of a list item after its dash marker, left-trimmed.
fn list_item_rest(text: &str) -> &str {
    if text == "-" {
        ""
    } else {
        text[2..].trim_start()
    }
}

/// Count leading spaces; a tab anywhere in the indentation is a lex error.
fn leading_indent(filename: &str, source: &str, number: usize, raw: &str) -> Result<usize> {
    let mut indent = 0;
    for (i, b) in raw.bytes().enumerate() {
        match b {
            b' ' => indent += 1,
            b'\t' => {
                return Err(ParseError::new(
                    ParseErrorKind::Lex,
                    filename,
                    number,
                    i + 1,
                    "tab characters are not allowed in indentation",
                    source,
                ));
            }
            _ => break,
        }
    }
    Ok(indent)
}

/// Cut a `#` comment that sits outside quoted strings.
fn strip_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut in_quote = 0u8;
    for (i, &b) in bytes.iter().enumerate() {
        if in_quote != 0 {
            if b == in_quote {
                in_quote = 0;
            }
        } else if b == b'"' || b == b'\'' {
            in_quote = b;
        } else if b == b'#' {
            return &text[..i];
        }
    }
    text
}
