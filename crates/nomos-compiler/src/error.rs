//! Compilation failure type

use nomos_diag::{Diagnostic, Diagnostics};

/// A failed compilation: every collected error plus the warnings gathered
/// before the failure.
#[derive(Debug)]
pub struct CompileFailure {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for CompileFailure {}

impl CompileFailure {
    pub fn single(diagnostic: Diagnostic) -> Self {
        Self {
            errors: vec![diagnostic],
            warnings: Vec::new(),
        }
    }

    pub fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            errors: diagnostics.errors,
            warnings: diagnostics.warnings,
        }
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(Diagnostic::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Does any error carry the given kind?
    pub fn has_kind(&self, kind: nomos_diag::ErrorKind) -> bool {
        self.errors.iter().any(|d| d.kind == kind)
    }
}
