//! Canonical-print round-trip: parse -> print -> parse is identity on the AST

use nomos_syntax::{print, Parser};

fn roundtrip(source: &str) {
    let parser = Parser::new();
    let first = parser.parse("round.csl", source).expect("initial parse");
    let printed = print::canonical(&first);
    let second = parser
        .parse("round.csl", &printed)
        .unwrap_or_else(|e| panic!("reparse of canonical output failed: {e}\n---\n{printed}"));
    assert!(
        first.structural_eq(&second),
        "ASTs differ after round trip\n---\n{printed}"
    );
    // canonical output is a fixed point
    assert_eq!(printed, print::canonical(&second));
}

#[test]
fn roundtrip_scalars_and_sections() {
    roundtrip("app: \"myapp\"\nserver:\n  host: \"localhost\"\n  port: \"8080\"\n");
}

#[test]
fn roundtrip_unquoted_scalars() {
    roundtrip("app: myapp\nurl: http://example.com/path\n");
}

#[test]
fn roundtrip_sources_and_references() {
    roundtrip(
        "\
source:
  alias: \"prod\"
  type: \"acme/vault\"
  version: \"2.0.1\"
  region: \"us-east-1\"
db: @prod:db.hosts[0].name
all: @prod:*
",
    );
}

#[test]
fn roundtrip_lists_and_nested_maps() {
    roundtrip(
        "\
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
deep:
  inner:
    leaf: \"v\"
",
    );
}

#[test]
fn roundtrip_spreads() {
    roundtrip("@base:defaults\ncfg:\n  @base:overrides\n  extra: \"1\"\n");
}

#[test]
fn roundtrip_values_with_embedded_quotes() {
    roundtrip("title: say \"hi\"\npath: \"C:\\\\data\"\n");
}

#[test]
fn roundtrip_dotted_keys() {
    roundtrip("my.key: \"v\"\nnested:\n  dotted.inner: \"w\"\n");
}
