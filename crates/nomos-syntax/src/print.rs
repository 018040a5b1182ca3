//! Canonical printing of parsed files
//!
//! `canonical` renders an AST back to `.csl` text such that re-parsing the
//! output yields a structurally equal AST. String values are always printed
//! double-quoted (the parser trims exactly one outer pair, so embedded
//! quotes survive the round trip).

use crate::ast::*;

/// Render a parsed file in canonical form.
pub fn canonical(file: &SourceFile) -> String {
    let mut out = String::new();
    for stmt in &file.statements {
        match stmt {
            Stmt::Source(decl) => print_source(&mut out, decl),
            Stmt::Section(decl) => print_section(&mut out, decl),
            Stmt::Spread(spread) => {
                out.push_str(&spread.reference.to_string());
                out.push('\n');
            }
        }
    }
    out
}

fn print_source(out: &mut String, decl: &SourceDecl) {
    out.push_str("source:\n");
    push_line(out, 1, &format!("alias: {}", quoted(&decl.alias)));
    if !decl.source_type.is_empty() {
        push_line(out, 1, &format!("type: {}", quoted(&decl.source_type)));
    }
    if !decl.version.is_empty() {
        push_line(out, 1, &format!("version: {}", quoted(&decl.version)));
    }
    for (key, value) in &decl.config {
        print_entry(out, 1, Some(key), value, false);
    }
}

fn print_section(out: &mut String, decl: &SectionDecl) {
    match &decl.body {
        SectionBody::Value(Expr::List(list)) if !list.elements.is_empty() => {
            out.push_str(&format!("{}:\n", key_text(&decl.name)));
            print_list(out, 1, list);
        }
        SectionBody::Value(value) => {
            out.push_str(&format!("{}: {}\n", key_text(&decl.name), inline_text(value)));
        }
        SectionBody::Entries(entries) => {
            out.push_str(&format!("{}:\n", key_text(&decl.name)));
            for entry in entries {
                print_entry(out, 1, entry.key.as_deref(), &entry.value, entry.spread);
            }
        }
    }
}

fn print_entry(out: &mut String, level: usize, key: Option<&str>, value: &Expr, spread: bool) {
    if spread {
        if let Expr::Reference(r) = value {
            push_line(out, level, &r.to_string());
        }
        return;
    }
    let key = key_text(key.unwrap_or_default());
    match value {
        Expr::Map(map) => {
            push_line(out, level, &format!("{key}:"));
            for entry in &map.entries {
                print_entry(out, level + 1, entry.key.as_deref(), &entry.value, entry.spread);
            }
        }
        Expr::List(list) if !list.elements.is_empty() => {
            push_line(out, level, &format!("{key}:"));
            print_list(out, level + 1, list);
        }
        other => push_line(out, level, &format!("{key}: {}", inline_text(other))),
    }
}

fn print_list(out: &mut String, level: usize, list: &ListExpr) {
    for element in &list.elements {
        match element {
            Expr::Map(map) => print_map_item(out, level, map),
            Expr::List(inner) if inner.elements.is_empty() => push_line(out, level, "- []"),
            Expr::List(inner) => {
                push_line(out, level, "-");
                print_list(out, level + 1, inner);
            }
            other => push_line(out, level, &format!("- {}", inline_text(other))),
        }
    }
}

/// A map list item: first entry rides the dash line when it is inline,
/// remaining entries follow at the dash column + 2.
fn print_map_item(out: &mut String, level: usize, map: &MapExpr) {
    let mut entries = map.entries.iter();
    let Some(first) = entries.next() else {
        push_line(out, level, "-");
        return;
    };
    let first_key = key_text(first.key.as_deref().unwrap_or_default());
    match &first.value {
        _ if first.spread => {
            // a leading spread cannot ride the dash; print it indented
            push_line(out, level, "-");
            print_entry(out, level + 1, None, &first.value, true);
        }
        Expr::Map(inner) => {
            push_line(out, level, &format!("- {first_key}:"));
            for entry in &inner.entries {
                print_entry(out, level + 2, entry.key.as_deref(), &entry.value, entry.spread);
            }
        }
        Expr::List(inner) if !inner.elements.is_empty() => {
            push_line(out, level, &format!("- {first_key}:"));
            print_list(out, level + 2, inner);
        }
        other => push_line(out, level, &format!("- {first_key}: {}", inline_text(other))),
    }
    for entry in entries {
        print_entry(out, level + 1, entry.key.as_deref(), &entry.value, entry.spread);
    }
}

fn inline_text(value: &Expr) -> String {
    match value {
        Expr::Str(s) => quoted(&s.value),
        Expr::Reference(r) => r.to_string(),
        Expr::List(l) if l.elements.is_empty() => "[]".to_string(),
        // non-empty lists and maps are printed as blocks by the callers
        Expr::List(_) | Expr::Map(_) => String::new(),
    }
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

fn key_text(key: &str) -> String {
    let needs_quoting = key.is_empty()
        || key.starts_with(['"', '\'', '@', '-', '['])
        || key.contains([':', '#'])
        || key.starts_with(' ')
        || key.ends_with(' ');
    if needs_quoting {
        format!("\"{key}\"")
    } else {
        key.to_string()
    }
}

fn push_line(out: &mut String, level: usize, text: &str) {
    for _ in 0..level {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}
