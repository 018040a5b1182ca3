//! AST evaluation and section merging
//!
//! Walks parsed files in lexicographic path order, materialises `source`
//! declarations into live providers through a [`ProviderLauncher`], resolves
//! inline references, splices spreads, substitutes `${name}` variables, and
//! merges sections under last-writer-wins rules.

use std::collections::HashMap;
use std::sync::Arc;

use async_recursion::async_recursion;
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use nomos_diag::{Diagnostic, ErrorKind};
use nomos_registry::{Provider, ProviderError};
use nomos_syntax::{
    Expr, MapEntry, PathSeg, ReferenceExpr, SectionBody, SourceDecl, SourceFile, Stmt,
};

/// Which stage a provider failed in; decides the diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchErrorKind {
    Resolution,
    Runtime,
}

#[derive(Debug)]
pub struct LaunchError {
    pub kind: LaunchErrorKind,
    pub message: String,
}

impl LaunchError {
    pub fn resolution(message: impl Into<String>) -> Self {
        Self {
            kind: LaunchErrorKind::Resolution,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: LaunchErrorKind::Runtime,
            message: message.into(),
        }
    }

    fn error_kind(&self) -> ErrorKind {
        match self.kind {
            LaunchErrorKind::Resolution => ErrorKind::ProviderResolution,
            LaunchErrorKind::Runtime => ErrorKind::ProviderRuntime,
        }
    }
}

/// Obtains an uninitialized live provider for a declaration. Implemented
/// over the subprocess manager and the builtin registry by the driver.
#[async_trait]
pub trait ProviderLauncher: Send + Sync {
    async fn launch(&self, decl: &SourceDecl) -> Result<Arc<dyn Provider>, LaunchError>;
}

enum Binding {
    Live(Arc<dyn Provider>),
    /// Install or launch failed under `allow_missing_provider`; references
    /// against it evaluate to null with a warning.
    Missing,
}

pub struct Evaluator<'a> {
    launcher: &'a dyn ProviderLauncher,
    vars: &'a HashMap<String, Value>,
    allow_missing: bool,
    cancel: &'a CancellationToken,
    bindings: HashMap<String, Binding>,
    pub warnings: Vec<Diagnostic>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        launcher: &'a dyn ProviderLauncher,
        vars: &'a HashMap<String, Value>,
        allow_missing: bool,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            launcher,
            vars,
            allow_missing,
            cancel,
            bindings: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Evaluate all files (already in lexicographic path order) into the
    /// merged snapshot.
    pub async fn evaluate(
        &mut self,
        files: &[(String, SourceFile)],
    ) -> Result<serde_json::Map<String, Value>, Diagnostic> {
        let mut root = serde_json::Map::new();
        for (path, file) in files {
            tracing::debug!(file = path, "evaluating");
            for stmt in &file.statements {
                if self.cancel.is_cancelled() {
                    return Err(Diagnostic::error(ErrorKind::Cancelled, "compilation cancelled"));
                }
                match stmt {
                    Stmt::Source(decl) => self.bind_source(decl).await?,
                    Stmt::Section(decl) => {
                        let value = match &decl.body {
                            SectionBody::Value(expr) => self.eval_expr(expr).await?,
                            SectionBody::Entries(entries) => self.eval_entries(entries).await?,
                        };
                        merge_into(&mut root, &decl.name, value, &decl.span, &mut self.warnings);
                    }
                    Stmt::Spread(spread) => {
                        let value = self.resolve_reference(&spread.reference).await?;
                        match value {
                            Value::Object(entries) => {
                                for (key, item) in entries {
                                    merge_into(&mut root, &key, item, &spread.span, &mut self.warnings);
                                }
                            }
                            Value::Null => {}
                            _ => {
                                return Err(Diagnostic::error(
                                    ErrorKind::Validation,
                                    format!(
                                        "spread of `{}` requires a map value",
                                        spread.reference
                                    ),
                                )
                                .with_span(spread.span.clone()));
                            }
                        }
                    }
                }
            }
        }
        Ok(root)
    }

    /// Materialise a source declaration into a live provider binding.
    ///
    /// The declaration's config is evaluated first, so it may reference any
    /// source bound earlier in the global order.
    async fn bind_source(&mut self, decl: &SourceDecl) -> Result<(), Diagnostic> {
        let mut config = serde_json::Map::new();
        for (key, expr) in &decl.config {
            config.insert(key.clone(), self.eval_expr(expr).await?);
        }

        let provider = match self.launcher.launch(decl).await {
            Ok(provider) => provider,
            Err(failure) => {
                let diagnostic = Diagnostic::error(
                    failure.error_kind(),
                    format!("source `{}`: {}", decl.alias, failure.message),
                )
                .with_span(decl.span.clone());
                if self.allow_missing {
                    self.warnings.push(demote(diagnostic));
                    self.bindings.insert(decl.alias.clone(), Binding::Missing);
                    return Ok(());
                }
                return Err(diagnostic);
            }
        };

        match provider.initialize(Value::Object(config)).await {
            Ok(capabilities) => {
                tracing::debug!(alias = decl.alias, ?capabilities, "provider initialized");
            }
            Err(e) => {
                let diagnostic =
                    Diagnostic::error(ErrorKind::ProviderRuntime, e.to_string())
                        .with_span(decl.span.clone());
                if self.allow_missing {
                    self.warnings.push(demote(diagnostic));
                    self.bindings.insert(decl.alias.clone(), Binding::Missing);
                    return Ok(());
                }
                return Err(diagnostic);
            }
        }

        self.bindings
            .insert(decl.alias.clone(), Binding::Live(provider));
        Ok(())
    }

    #[async_recursion]
    async fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Diagnostic> {
        match expr {
            Expr::Str(s) => Ok(self.substitute(&s.value)),
            Expr::Reference(reference) => self.resolve_reference(reference).await,
            Expr::List(list) => {
                let mut items = Vec::with_capacity(list.elements.len());
                for element in &list.elements {
                    items.push(self.eval_expr(element).await?);
                }
                Ok(Value::Array(items))
            }
            Expr::Map(map) => self.eval_entries(&map.entries).await,
        }
    }

    /// Build an object from map entries; spread entries splice the
    /// referenced map's keys at the point they appear, later keys win.
    async fn eval_entries(&mut self, entries: &[MapEntry]) -> Result<Value, Diagnostic> {
        let mut out = serde_json::Map::new();
        for entry in entries {
            if entry.spread {
                let Expr::Reference(reference) = &entry.value else {
                    return Err(Diagnostic::error(
                        ErrorKind::Validation,
                        "spread entries must be references",
                    )
                    .with_span(entry.span.clone()));
                };
                match self.resolve_reference(reference).await? {
                    Value::Object(spliced) => out.extend(spliced),
                    Value::Null => {}
                    _ => {
                        return Err(Diagnostic::error(
                            ErrorKind::Validation,
                            format!("spread of `{reference}` requires a map value"),
                        )
                        .with_span(entry.span.clone()));
                    }
                }
                continue;
            }
            let key = entry.key.clone().unwrap_or_default();
            let value = self.eval_expr(&entry.value).await?;
            out.insert(key, value);
        }
        Ok(Value::Object(out))
    }

    /// Call `Get` on the provider bound to the reference's alias.
    async fn resolve_reference(&mut self, reference: &ReferenceExpr) -> Result<Value, Diagnostic> {
        let Some(binding) = self.bindings.get(&reference.alias) else {
            return Err(Diagnostic::error(
                ErrorKind::Validation,
                format!("reference to undeclared source alias `{}`", reference.alias),
            )
            .with_span(reference.span.clone()));
        };
        let provider = match binding {
            Binding::Live(provider) => Arc::clone(provider),
            Binding::Missing => {
                self.warnings.push(
                    Diagnostic::warning(
                        ErrorKind::ProviderResolution,
                        format!(
                            "provider for `{}` is unavailable; `{reference}` is null",
                            reference.alias
                        ),
                    )
                    .with_span(reference.span.clone()),
                );
                return Ok(Value::Null);
            }
        };

        let path = wire_path(&reference.path);
        match provider.get(&path).await {
            Ok(value) => Ok(value),
            Err(e) => {
                let diagnostic = Diagnostic::error(ErrorKind::ProviderRuntime, render_get_error(&e))
                    .with_span(reference.span.clone());
                if self.allow_missing {
                    self.warnings.push(demote(diagnostic));
                    Ok(Value::Null)
                } else {
                    Err(diagnostic)
                }
            }
        }
    }

    /// `${name}` scalars become the bound variable's value; everything else
    /// passes through untouched.
    fn substitute(&self, text: &str) -> Value {
        if let Some(name) = text.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
            if let Some(value) = self.vars.get(name) {
                return value.clone();
            }
        }
        Value::String(text.to_string())
    }
}

/// Path segments as the provider sees them: keys verbatim, indices as bare
/// decimals, the wildcard as `*`.
pub fn wire_path(path: &[PathSeg]) -> Vec<String> {
    path.iter()
        .map(|seg| match seg {
            PathSeg::Key(k) => k.clone(),
            PathSeg::Index(i) => i.to_string(),
            PathSeg::Wildcard => "*".to_string(),
        })
        .collect()
}

fn render_get_error(e: &ProviderError) -> String {
    e.to_string()
}

fn demote(diagnostic: Diagnostic) -> Diagnostic {
    Diagnostic {
        severity: nomos_diag::Severity::Warning,
        ..diagnostic
    }
}

/// Merge `incoming` into `root[name]` with last-writer-wins semantics.
///
/// Maps merge recursively; a conflict that crosses the map/non-map boundary
/// warns and adopts the later value.
pub fn merge_into(
    root: &mut serde_json::Map<String, Value>,
    name: &str,
    incoming: Value,
    span: &nomos_syntax::Span,
    warnings: &mut Vec<Diagnostic>,
) {
    let merged = match root.remove(name) {
        Some(existing) => merge_value(existing, incoming, name, span, warnings),
        None => incoming,
    };
    root.insert(name.to_string(), merged);
}

fn merge_value(
    existing: Value,
    incoming: Value,
    name: &str,
    span: &nomos_syntax::Span,
    warnings: &mut Vec<Diagnostic>,
) -> Value {
    match (existing, incoming) {
        (Value::Object(mut old), Value::Object(new)) => {
            for (key, value) in new {
                let merged = match old.remove(&key) {
                    Some(prev) => merge_value(prev, value, &key, span, warnings),
                    None => value,
                };
                old.insert(key, merged);
            }
            Value::Object(old)
        }
        (existing, incoming) => {
            let old_is_map = existing.is_object();
            let new_is_map = incoming.is_object();
            if old_is_map != new_is_map {
                warnings.push(
                    Diagnostic::warning(
                        ErrorKind::Validation,
                        format!(
                            "`{name}` was previously {}; replaced by {}",
                            kind_name(&existing),
                            kind_name(&incoming)
                        ),
                    )
                    .with_span(span.clone()),
                );
            }
            incoming
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a scalar",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomos_syntax::Span;

    fn span() -> Span {
        Span::point("test.csl", 1, 1)
    }

    #[test]
    fn maps_merge_recursively_last_writer_wins() {
        let mut warnings = Vec::new();
        let mut root = serde_json::Map::new();
        merge_into(
            &mut root,
            "server",
            serde_json::json!({"host": "a", "limits": {"cpu": "1"}}),
            &span(),
            &mut warnings,
        );
        merge_into(
            &mut root,
            "server",
            serde_json::json!({"limits": {"mem": "1Gi"}, "port": 80}),
            &span(),
            &mut warnings,
        );
        assert!(warnings.is_empty());
        assert_eq!(
            Value::Object(root),
            serde_json::json!({
                "server": {"host": "a", "limits": {"cpu": "1", "mem": "1Gi"}, "port": 80}
            })
        );
    }

    #[test]
    fn scalar_vs_map_conflict_warns_and_takes_later() {
        let mut warnings = Vec::new();
        let mut root = serde_json::Map::new();
        merge_into(&mut root, "app", serde_json::json!({"name": "x"}), &span(), &mut warnings);
        merge_into(&mut root, "app", serde_json::json!("flat"), &span(), &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(root["app"], serde_json::json!("flat"));
    }

    #[test]
    fn scalar_overwrite_is_silent() {
        let mut warnings = Vec::new();
        let mut root = serde_json::Map::new();
        merge_into(&mut root, "app", serde_json::json!("a"), &span(), &mut warnings);
        merge_into(&mut root, "app", serde_json::json!("b"), &span(), &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(root["app"], serde_json::json!("b"));
    }

    #[test]
    fn wire_path_renders_all_segment_kinds() {
        let path = vec![
            PathSeg::Key("db".into()),
            PathSeg::Index(2),
            PathSeg::Wildcard,
        ];
        assert_eq!(wire_path(&path), vec!["db", "2", "*"]);
    }
}
