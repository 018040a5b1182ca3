//! Deterministic output encoding
//!
//! Serializes the merged snapshot to JSON, YAML or an HCL variable file.
//! Snapshot maps are `serde_json` objects backed by a sorted map, so keys
//! come out in lexicographic order at every level in every backend.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use nomos_diag::{Diagnostic, ErrorKind};

use crate::options::OutputFormat;

/// Envelope metadata, emitted only when requested.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub input_files: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Render the snapshot in the chosen format.
///
/// With metadata the JSON/YAML output becomes `{data, metadata}`; tfvars
/// never carries metadata.
pub fn encode(
    snapshot: &serde_json::Map<String, Value>,
    format: OutputFormat,
    metadata: Option<&Metadata>,
) -> Result<String, Diagnostic> {
    let value = match metadata {
        Some(metadata) if format != OutputFormat::Tfvars => {
            let mut envelope = serde_json::Map::new();
            envelope.insert("data".to_string(), Value::Object(snapshot.clone()));
            envelope.insert(
                "metadata".to_string(),
                serde_json::to_value(metadata).map_err(encode_error)?,
            );
            Value::Object(envelope)
        }
        _ => Value::Object(snapshot.clone()),
    };

    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&value).map_err(encode_error)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yaml::to_string(&value).map_err(encode_error),
        OutputFormat::Tfvars => encode_tfvars(snapshot),
    }
}

fn encode_error(e: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(ErrorKind::Encoder, e.to_string())
}

/// Flat top-level `key = value` attributes, keys sorted, values rendered as
/// HCL literals.
fn encode_tfvars(snapshot: &serde_json::Map<String, Value>) -> Result<String, Diagnostic> {
    let mut out = String::new();
    for (key, value) in snapshot {
        if !is_hcl_identifier(key) {
            return Err(Diagnostic::error(
                ErrorKind::Encoder,
                format!("invalid HCL identifier `{key}` in tfvars output"),
            ));
        }
        out.push_str(key);
        out.push_str(" = ");
        render_hcl(value, 0, &mut out);
        out.push('\n');
    }
    Ok(out)
}

/// HCL identifiers start with a letter or underscore and continue with
/// letters, digits, underscores and dashes. Spaces, dots and leading digits
/// are invalid.
pub fn is_hcl_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn render_hcl(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_hcl(item, indent, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            let pad = "  ".repeat(indent + 1);
            for (key, item) in map {
                out.push_str(&pad);
                // nested object keys are quoted when not identifiers
                if is_hcl_identifier(key) {
                    out.push_str(key);
                } else {
                    out.push('"');
                    out.push_str(key);
                    out.push('"');
                }
                out.push_str(" = ");
                render_hcl(item, indent + 1, out);
                out.push('\n');
            }
            out.push_str(&"  ".repeat(indent));
            out.push('}');
        }
    }
}

/// Append the format's canonical extension only when the path has none; an
/// explicit extension is preserved even when it mismatches the format.
pub fn resolve_output_path(path: &Path, format: OutputFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

/// Write the rendered output, creating intermediate directories.
pub fn write_output(path: &Path, content: &str) -> Result<(), Diagnostic> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Diagnostic::error(
                    ErrorKind::Io,
                    format!("failed to create `{}`: {e}", parent.display()),
                )
            })?;
        }
    }
    std::fs::write(path, content).map_err(|e| {
        Diagnostic::error(
            ErrorKind::Io,
            format!("failed to write `{}`: {e}", path.display()),
        )
    })
}
