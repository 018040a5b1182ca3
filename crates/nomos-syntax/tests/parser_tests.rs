//! Integration tests for the `.csl` parser

use nomos_syntax::{
    Expr, ParseErrorKind, Parser, PathSeg, SectionBody, Stmt, MAX_LIST_DEPTH,
};

fn parse(source: &str) -> nomos_syntax::SourceFile {
    Parser::new().parse("test.csl", source).expect("should parse")
}

fn parse_err(source: &str) -> nomos_syntax::ParseError {
    Parser::new()
        .parse("test.csl", source)
        .expect_err("should fail to parse")
}

#[test]
fn inline_scalar_section() {
    let file = parse("app: \"myapp\"\n");
    assert_eq!(file.statements.len(), 1);
    let Stmt::Section(section) = &file.statements[0] else {
        panic!("expected section");
    };
    assert_eq!(section.name, "app");
    let SectionBody::Value(Expr::Str(s)) = &section.body else {
        panic!("expected inline string");
    };
    assert_eq!(s.value, "myapp");
}

#[test]
fn unquoted_scalars_keep_their_text() {
    let file = parse("app: myapp\nurl: http://example.com/x\n");
    let values: Vec<String> = file
        .statements
        .iter()
        .map(|s| match s {
            Stmt::Section(sec) => match &sec.body {
                SectionBody::Value(Expr::Str(s)) => s.value.clone(),
                other => panic!("expected scalar, got {other:?}"),
            },
            other => panic!("expected section, got {other:?}"),
        })
        .collect();
    assert_eq!(values, vec!["myapp", "http://example.com/x"]);
}

#[test]
fn nested_section_entries() {
    let source = "\
server:
  host: \"localhost\"
  limits:
    connections: \"100\"
";
    let file = parse(source);
    let Stmt::Section(section) = &file.statements[0] else {
        panic!("expected section");
    };
    let SectionBody::Entries(entries) = &section.body else {
        panic!("expected block entries");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key.as_deref(), Some("host"));
    let Expr::Map(limits) = &entries[1].value else {
        panic!("expected nested map");
    };
    assert_eq!(limits.entries.len(), 1);
    assert_eq!(limits.entries[0].key.as_deref(), Some("connections"));
}

#[test]
fn lists_with_scalars_maps_and_nesting() {
    let source = "\
servers:
  - name: \"a\"
    port: \"80\"
  - name: \"b\"
tags:
  - \"x\"
  - \"y\"
matrix:
  -
    - \"1\"
    - \"2\"
empty: []
";
    let file = parse(source);
    assert_eq!(file.statements.len(), 4);

    let Stmt::Section(servers) = &file.statements[0] else { panic!() };
    let SectionBody::Value(Expr::List(list)) = &servers.body else {
        panic!("expected list body");
    };
    assert_eq!(list.elements.len(), 2);
    let Expr::Map(first) = &list.elements[0] else { panic!("expected map item") };
    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.entries[0].key.as_deref(), Some("name"));
    assert_eq!(first.entries[1].key.as_deref(), Some("port"));

    let Stmt::Section(matrix) = &file.statements[2] else { panic!() };
    let SectionBody::Value(Expr::List(outer)) = &matrix.body else { panic!() };
    let Expr::List(inner) = &outer.elements[0] else { panic!("expected nested list") };
    assert_eq!(inner.elements.len(), 2);

    let Stmt::Section(empty) = &file.statements[3] else { panic!() };
    let SectionBody::Value(Expr::List(l)) = &empty.body else { panic!() };
    assert!(l.elements.is_empty());
}

#[test]
fn source_declaration_splits_known_fields_from_config() {
    let source = "\
source:
  alias: \"prod\"
  type: \"acme/vault\"
  version: \"1.2.3\"
  region: \"us-east-1\"
";
    let file = parse(source);
    let Stmt::Source(decl) = &file.statements[0] else {
        panic!("expected source decl");
    };
    assert_eq!(decl.alias, "prod");
    assert_eq!(decl.source_type, "acme/vault");
    assert_eq!(decl.version, "1.2.3");
    assert_eq!(decl.config.len(), 1);
    assert_eq!(decl.config[0].0, "region");
}

#[test]
fn source_without_alias_is_rejected() {
    let err = parse_err("source:\n  type: \"a/b\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("alias"), "message: {}", err.message);
}

#[test]
fn reference_paths_parse_segments_indices_and_wildcard() {
    let file = parse("db: @prod:db.hosts[0].name\nall: @prod:*\n");
    let Stmt::Section(db) = &file.statements[0] else { panic!() };
    let SectionBody::Value(Expr::Reference(r)) = &db.body else {
        panic!("expected reference");
    };
    assert_eq!(r.alias, "prod");
    assert_eq!(
        r.path,
        vec![
            PathSeg::Key("db".into()),
            PathSeg::Key("hosts".into()),
            PathSeg::Index(0),
            PathSeg::Key("name".into()),
        ]
    );

    let Stmt::Section(all) = &file.statements[1] else { panic!() };
    let SectionBody::Value(Expr::Reference(r)) = &all.body else { panic!() };
    assert_eq!(r.path, vec![PathSeg::Wildcard]);
}

#[test]
fn reference_span_covers_whole_token_including_at() {
    let file = parse("db: @prod:db.host\n");
    let Stmt::Section(section) = &file.statements[0] else { panic!() };
    let SectionBody::Value(Expr::Reference(r)) = &section.body else { panic!() };
    assert_eq!(r.span.start_line, 1);
    assert_eq!(r.span.start_col, 5);
    assert_eq!(r.span.end_col, 17);
}

#[test]
fn wildcard_must_be_final_segment() {
    let err = parse_err("db: @prod:*.host\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains('*'), "message: {}", err.message);
}

#[test]
fn spreads_at_top_level_and_in_maps() {
    let source = "\
@base:defaults
cfg:
  @base:overrides
  extra: \"1\"
";
    let file = parse(source);
    let Stmt::Spread(spread) = &file.statements[0] else {
        panic!("expected top-level spread");
    };
    assert_eq!(spread.reference.alias, "base");

    let Stmt::Section(cfg) = &file.statements[1] else { panic!() };
    let SectionBody::Entries(entries) = &cfg.body else { panic!() };
    assert!(entries[0].spread);
    assert!(entries[0].key.is_none());
    assert!(!entries[1].spread);
}

#[test]
fn comments_are_stripped_outside_quotes() {
    let file = parse("app: \"my#app\" # trailing comment\n# whole line\nother: plain # note\n");
    assert_eq!(file.statements.len(), 2);
    let Stmt::Section(app) = &file.statements[0] else { panic!() };
    let SectionBody::Value(Expr::Str(s)) = &app.body else { panic!() };
    assert_eq!(s.value, "my#app");
    let Stmt::Section(other) = &file.statements[1] else { panic!() };
    let SectionBody::Value(Expr::Str(s)) = &other.body else { panic!() };
    assert_eq!(s.value, "plain");
}

#[test]
fn crlf_line_endings_parse() {
    let file = parse("app: \"a\"\r\nother: \"b\"\r\n");
    assert_eq!(file.statements.len(), 2);
}

#[test]
fn tab_in_indentation_is_a_lex_error() {
    let err = parse_err("section:\n\thost: \"x\"\n");
    assert_eq!(err.kind, ParseErrorKind::Lex);
    assert_eq!(err.line, 2);
    assert_eq!(err.col, 1);
}

#[test]
fn odd_indentation_is_rejected() {
    let err = parse_err("section:\n   host: \"x\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("two spaces"), "message: {}", err.message);
}

#[test]
fn unmatched_quote_is_a_lex_error() {
    let err = parse_err("app: \"unclosed\n");
    assert_eq!(err.kind, ParseErrorKind::Lex);
    assert_eq!(err.line, 1);
    assert!(!err.snippet.is_empty());
}

#[test]
fn reference_block_statement_names_the_migration() {
    let err = parse_err("reference: \"old\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("@alias:path"), "message: {}", err.message);
}

#[test]
fn import_statement_names_the_migration() {
    let err = parse_err("import: \"other.csl\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("@alias:path"), "message: {}", err.message);
}

#[test]
fn empty_list_item_is_rejected() {
    let err = parse_err("items:\n  -\nother: \"x\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("empty list item"), "message: {}", err.message);
}

fn deep_list(depth: usize) -> String {
    let mut out = String::from("key:\n");
    for level in 1..depth {
        out.push_str(&"  ".repeat(level));
        out.push_str("-\n");
    }
    out.push_str(&"  ".repeat(depth));
    out.push_str("- \"x\"\n");
    out
}

#[test]
fn list_depth_twenty_is_valid() {
    let file = parse(&deep_list(MAX_LIST_DEPTH));
    assert_eq!(file.statements.len(), 1);
}

#[test]
fn list_depth_twenty_one_names_the_limit() {
    let err = parse_err(&deep_list(MAX_LIST_DEPTH + 1));
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("20"), "message: {}", err.message);
}

#[test]
fn top_level_indentation_is_rejected() {
    let err = parse_err("  app: \"x\"\n");
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert!(err.message.contains("top level"), "message: {}", err.message);
}

#[test]
fn error_spans_stay_within_the_file() {
    for bad in ["app: \"unclosed\n", "a:\n    deep: \"x\"\n", "x: @:path\n"] {
        let err = parse_err(bad);
        let line_count = bad.lines().count();
        assert!(err.line >= 1 && err.line <= line_count, "line {} for {bad:?}", err.line);
        let line_len = bad.lines().nth(err.line - 1).unwrap().len();
        assert!(err.col >= 1 && err.col <= line_len + 1, "col {} for {bad:?}", err.col);
    }
}

#[test]
fn empty_and_comment_only_files_parse_to_nothing() {
    assert!(parse("").statements.is_empty());
    assert!(parse("# just a comment\n\n").statements.is_empty());
}

#[test]
fn keys_may_contain_dots() {
    let file = parse("my.key: \"v\"\n");
    let Stmt::Section(section) = &file.statements[0] else { panic!() };
    assert_eq!(section.name, "my.key");
}

#[test]
fn root_span_covers_the_file() {
    let file = parse("a: \"1\"\nbb: \"2\"\n");
    assert_eq!(file.span.start_line, 1);
    assert_eq!(file.span.start_col, 1);
    assert_eq!(file.span.end_line, 2);
    assert_eq!(file.span.end_col, 7);
}
