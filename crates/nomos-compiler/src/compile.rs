//! The compile driver
//!
//! Wires discovery, parsing, validation, provider installation, the
//! subprocess manager, evaluation and encoding behind one entry point.
//! The driver formats nothing and picks no exit codes; that is the outer
//! CLI's business.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use nomos_diag::{Diagnostic, Diagnostics, ErrorKind};
use nomos_installer::{
    DeclaredProvider, InstallReporter, InstallerConfig, NullReporter, ProviderInstaller,
    ReleaseClient,
};
use nomos_registry::{
    validate_version, CacheLayout, Lockfile, Platform, Provider, ProviderIdentity,
    ProviderTypeRegistry, ResolvedType,
};
use nomos_runtime::{ProviderManager, RuntimeConfig};
use nomos_syntax::{Parser, SourceDecl, SourceFile, Stmt};

use crate::encode::{encode, resolve_output_path, write_output, Metadata};
use crate::error::CompileFailure;
use crate::eval::{Evaluator, LaunchError, ProviderLauncher};
use crate::options::CompileOptions;

/// A successful compilation.
#[derive(Debug)]
pub struct Compilation {
    /// The merged snapshot (top-level sections)
    pub snapshot: serde_json::Map<String, Value>,
    /// The encoded output in the chosen format
    pub rendered: String,
    /// Every input file, in processing order
    pub input_files: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    pub metadata: Option<Metadata>,
    /// Where the output was written, after extension policy
    pub output_path: Option<PathBuf>,
}

/// Compile with a silent install reporter.
pub async fn compile(
    options: CompileOptions,
    cancel: CancellationToken,
) -> Result<Compilation, CompileFailure> {
    compile_with_reporter(options, Arc::new(NullReporter), cancel).await
}

/// Compile, surfacing install progress through `reporter`.
pub async fn compile_with_reporter(
    options: CompileOptions,
    reporter: Arc<dyn InstallReporter>,
    cancel: CancellationToken,
) -> Result<Compilation, CompileFailure> {
    let start_time = chrono::Utc::now();
    let mut diagnostics = Diagnostics::new();

    // discovery
    let files = match crate::discovery::discover(&options.path) {
        Ok(files) => files,
        Err(diagnostic) => return Err(CompileFailure::single(diagnostic)),
    };
    let input_files: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();

    // parsing; aggregate every parse error before reporting
    let parser = Parser::new();
    let mut parsed: Vec<(String, SourceFile)> = Vec::new();
    for path in &files {
        match parser.parse_file(path) {
            Ok(file) => parsed.push((path.display().to_string(), file)),
            Err(e) => diagnostics.push(Diagnostic::from(e)),
        }
    }
    if diagnostics.has_errors() {
        return Err(CompileFailure::from_diagnostics(diagnostics));
    }

    // validation of source declarations
    let decls = collect_source_decls(&parsed, &options.type_registry, &mut diagnostics);
    if diagnostics.has_errors() {
        return Err(CompileFailure::from_diagnostics(diagnostics));
    }

    if cancel.is_cancelled() {
        return Err(CompileFailure::single(cancelled()));
    }

    // provider installation
    let cache_base = options.cache_root.clone().unwrap_or_else(|| PathBuf::from("."));
    let layout = CacheLayout::new(&cache_base);
    let mut binaries: HashMap<String, PathBuf> = HashMap::new();
    if !decls.downloadable.is_empty() {
        let lockfile_path = layout.lockfile_path();
        let mut lockfile = match Lockfile::load(&lockfile_path) {
            Ok(lockfile) => lockfile,
            Err(e) => {
                return Err(CompileFailure::single(Diagnostic::error(
                    ErrorKind::Validation,
                    e.to_string(),
                )));
            }
        };

        let installer_config = InstallerConfig {
            max_concurrent: options.max_concurrent_providers,
            fetch_timeout: options.per_provider_fetch,
            allow_missing: options.allow_missing_provider,
            platform: Platform::current(),
        };
        let installer = match build_installer(&options, layout.clone(), installer_config) {
            Ok(installer) => installer.with_reporter(reporter),
            Err(diagnostic) => return Err(CompileFailure::single(diagnostic)),
        };

        let summary = match installer
            .ensure_installed(&decls.downloadable, &mut lockfile, &cancel)
            .await
        {
            Ok(summary) => summary,
            Err(e) => return Err(CompileFailure::single(installer_diagnostic(e))),
        };
        for (identity, error) in &summary.failed {
            diagnostics.push(Diagnostic::warning(
                ErrorKind::ProviderResolution,
                format!("provider {identity} unavailable: {error}"),
            ));
        }

        // bind every alias of an installed identity to its binary
        let installed: HashMap<ProviderIdentity, &nomos_registry::LockedProvider> = summary
            .installed
            .iter()
            .map(|entry| (entry.identity(), entry))
            .collect();
        for decl in &decls.downloadable {
            let identity = ProviderIdentity::new(&decl.source_type, &decl.version, Platform::current());
            if let Some(entry) = installed.get(&identity) {
                binaries.insert(
                    decl.alias.clone(),
                    layout.resolve(std::path::Path::new(&entry.path)),
                );
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(CompileFailure::single(cancelled()));
    }

    // evaluation, with deterministic shutdown on every path
    let manager = Arc::new(ProviderManager::new(binaries, RuntimeConfig::default()));
    let launcher = CompileLauncher {
        manager: Arc::clone(&manager),
        registry: options.type_registry.clone(),
    };
    let mut evaluator = Evaluator::new(&launcher, &options.vars, options.allow_missing_provider, &cancel);
    let evaluated = evaluator.evaluate(&parsed).await;
    for warning in evaluator.warnings.drain(..) {
        diagnostics.push(warning);
    }
    manager.shutdown_all().await;

    let snapshot = match evaluated {
        Ok(snapshot) => snapshot,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            return Err(CompileFailure::from_diagnostics(diagnostics));
        }
    };

    // encoding and output
    let metadata = options.include_metadata.then(|| Metadata {
        input_files: input_files.clone(),
        start_time: start_time.to_rfc3339(),
        end_time: chrono::Utc::now().to_rfc3339(),
        errors: Vec::new(),
        warnings: diagnostics.warnings.iter().map(Diagnostic::render).collect(),
    });
    let rendered = match encode(&snapshot, options.format, metadata.as_ref()) {
        Ok(rendered) => rendered,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            return Err(CompileFailure::from_diagnostics(diagnostics));
        }
    };

    let output_path = match &options.output_path {
        Some(path) => {
            let resolved = resolve_output_path(path, options.format);
            if let Err(diagnostic) = write_output(&resolved, &rendered) {
                diagnostics.push(diagnostic);
                return Err(CompileFailure::from_diagnostics(diagnostics));
            }
            Some(resolved)
        }
        None => None,
    };

    tracing::debug!(
        inputs = input_files.len(),
        warnings = diagnostics.warnings.len(),
        "compilation finished"
    );
    Ok(Compilation {
        snapshot,
        rendered,
        input_files,
        warnings: diagnostics.warnings,
        metadata,
        output_path,
    })
}

fn cancelled() -> Diagnostic {
    Diagnostic::error(ErrorKind::Cancelled, "compilation cancelled")
}

fn build_installer(
    options: &CompileOptions,
    layout: CacheLayout,
    config: InstallerConfig,
) -> Result<ProviderInstaller, Diagnostic> {
    let installer = ProviderInstaller::new(layout, config)
        .map_err(|e| Diagnostic::error(ErrorKind::ProviderResolution, e.to_string()))?;
    match &options.release_index_url {
        Some(base_url) => {
            let client = ReleaseClient::new()
                .map_err(|e| Diagnostic::error(ErrorKind::ProviderResolution, e.to_string()))?
                .with_base_url(base_url);
            Ok(installer.with_release_client(client))
        }
        None => Ok(installer),
    }
}

fn installer_diagnostic(error: nomos_installer::Error) -> Diagnostic {
    let kind = match &error {
        nomos_installer::Error::VersionConflict { .. } => ErrorKind::VersionConflict,
        nomos_installer::Error::Cancelled { .. } => ErrorKind::Cancelled,
        nomos_installer::Error::Io(_) => ErrorKind::Io,
        _ => ErrorKind::ProviderResolution,
    };
    Diagnostic::error(kind, error.to_string())
}

/// Source declarations split by how their provider is obtained.
#[derive(Debug, Default)]
struct CollectedDecls {
    downloadable: Vec<DeclaredProvider>,
}

/// Validate all source declarations and collect the downloadable ones.
///
/// Checks: unique alias per file, cross-file alias consistency, valid
/// semver, and resolvable provider type.
fn collect_source_decls(
    parsed: &[(String, SourceFile)],
    registry: &ProviderTypeRegistry,
    diagnostics: &mut Diagnostics,
) -> CollectedDecls {
    let mut collected = CollectedDecls::default();
    // alias -> (type, version) across all files
    let mut global: HashMap<String, (String, String)> = HashMap::new();

    for (path, file) in parsed {
        let mut seen_in_file: HashSet<&str> = HashSet::new();
        for stmt in &file.statements {
            let Stmt::Source(decl) = stmt else { continue };

            if !seen_in_file.insert(decl.alias.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        ErrorKind::Validation,
                        format!("duplicate source alias `{}` in {path}", decl.alias),
                    )
                    .with_span(decl.alias_span.clone()),
                );
                continue;
            }

            if let Err(e) = validate_version(&decl.source_type, &decl.version) {
                let span = decl.version_span.clone().unwrap_or_else(|| decl.span.clone());
                diagnostics.push(
                    Diagnostic::error(ErrorKind::Validation, e.to_string()).with_span(span),
                );
                continue;
            }

            match global.get(&decl.alias) {
                Some((source_type, version))
                    if source_type != &decl.source_type || version != &decl.version =>
                {
                    diagnostics.push(
                        Diagnostic::error(
                            ErrorKind::Validation,
                            format!(
                                "source alias `{}` is bound to `{source_type}`@`{version}` elsewhere; \
                                 redeclaring it as `{}`@`{}` is ambiguous",
                                decl.alias, decl.source_type, decl.version
                            ),
                        )
                        .with_span(decl.alias_span.clone()),
                    );
                    continue;
                }
                _ => {
                    global.insert(
                        decl.alias.clone(),
                        (decl.source_type.clone(), decl.version.clone()),
                    );
                }
            }

            match registry.resolve(&decl.source_type) {
                Ok(ResolvedType::Download { .. }) => {
                    collected.downloadable.push(DeclaredProvider {
                        alias: decl.alias.clone(),
                        source_type: decl.source_type.clone(),
                        version: decl.version.clone(),
                        file: path.clone(),
                    });
                }
                Ok(ResolvedType::Builtin(_)) => {}
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error(ErrorKind::Validation, e.to_string())
                            .with_span(decl.span.clone()),
                    );
                }
            }
        }
    }
    collected
}

/// Launches providers for the evaluator: builtins through the registry,
/// downloadables through the subprocess manager.
struct CompileLauncher {
    manager: Arc<ProviderManager>,
    registry: ProviderTypeRegistry,
}

#[async_trait]
impl ProviderLauncher for CompileLauncher {
    async fn launch(&self, decl: &SourceDecl) -> Result<Arc<dyn Provider>, LaunchError> {
        match self.registry.resolve(&decl.source_type) {
            Ok(ResolvedType::Builtin(factory)) => Ok(factory(&decl.alias)),
            Ok(ResolvedType::Download { .. }) => self
                .manager
                .provider(&decl.alias)
                .await
                .map(|p| p as Arc<dyn Provider>)
                .map_err(|e| match &e {
                    nomos_runtime::Error::UnknownAlias { .. } => {
                        LaunchError::resolution(format!("provider binary is not installed: {e}"))
                    }
                    _ => LaunchError::runtime(e.to_string()),
                }),
            Err(e) => Err(LaunchError::resolution(e.to_string())),
        }
    }
}
