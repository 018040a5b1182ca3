//! Command-line interface definition and dispatch

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use tokio_util::sync::CancellationToken;

use nomos_compiler::{compile_with_reporter, CompileOptions, OutputFormat};
use nomos_diag::Diagnostic;

use crate::reporter::ConsoleReporter;

#[derive(Parser)]
#[command(name = "nomos")]
#[command(about = "Compile declarative configuration into deterministic snapshots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output with detailed logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Compile .csl sources into a snapshot
    Compile {
        /// A .csl file or a directory of them
        path: PathBuf,

        /// Output format: json, yaml or tfvars (case-insensitive)
        #[arg(long, default_value = "json")]
        format: String,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bind a ${name} variable; repeatable
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Degrade provider failures to warnings with null values
        #[arg(long)]
        allow_missing_providers: bool,

        /// Wrap the output in a data/metadata envelope
        #[arg(long)]
        metadata: bool,

        /// Treat warnings as errors for the exit code
        #[arg(long)]
        strict: bool,

        /// Concurrent provider downloads; 0 means CPU count
        #[arg(long, default_value_t = 0)]
        jobs: usize,

        /// Per-provider fetch timeout in seconds
        #[arg(long, default_value_t = 300)]
        fetch_timeout: u64,
    },
}

impl Cli {
    pub async fn run(self) -> ExitCode {
        match self.command {
            Commands::Version => {
                println!("nomos {}", env!("CARGO_PKG_VERSION"));
                ExitCode::SUCCESS
            }
            Commands::Compile {
                path,
                format,
                output,
                vars,
                allow_missing_providers,
                metadata,
                strict,
                jobs,
                fetch_timeout,
            } => {
                let format: OutputFormat = match format.parse() {
                    Ok(format) => format,
                    Err(message) => {
                        eprintln!("{} {message}", style("error:").red().bold());
                        return ExitCode::FAILURE;
                    }
                };
                let parsed_vars = match parse_vars(&vars) {
                    Ok(parsed) => parsed,
                    Err(message) => {
                        eprintln!("{} {message}", style("error:").red().bold());
                        return ExitCode::FAILURE;
                    }
                };

                let mut options = CompileOptions::new(path);
                options.format = format;
                options.output_path = output;
                options.vars = parsed_vars;
                options.allow_missing_provider = allow_missing_providers;
                options.include_metadata = metadata;
                options.strict = strict;
                options.max_concurrent_providers = jobs;
                options.per_provider_fetch = Duration::from_secs(fetch_timeout);

                run_compile(options).await
            }
        }
    }
}

async fn run_compile(options: CompileOptions) -> ExitCode {
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    let strict = options.strict;
    let to_stdout = options.output_path.is_none();
    match compile_with_reporter(options, Arc::new(ConsoleReporter::new()), cancel).await {
        Ok(result) => {
            print_diagnostics(&result.warnings);
            if let Some(path) = &result.output_path {
                eprintln!(
                    "{} wrote {} ({} inputs)",
                    style("✓").green(),
                    path.display(),
                    result.input_files.len()
                );
            } else if to_stdout {
                print!("{}", result.rendered);
            }
            if strict && !result.warnings.is_empty() {
                eprintln!(
                    "{} {} warning(s) with --strict",
                    style("error:").red().bold(),
                    result.warnings.len()
                );
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            print_diagnostics(&failure.warnings);
            print_diagnostics(&failure.errors);
            ExitCode::FAILURE
        }
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let prefix = match diagnostic.severity {
            nomos_diag::Severity::Error => style("error:").red().bold(),
            nomos_diag::Severity::Warning => style("warning:").yellow().bold(),
        };
        eprintln!("{prefix} {}", diagnostic.render());
    }
}

/// Parse `name=value` bindings; values that parse as JSON are taken as JSON,
/// anything else is a string.
fn parse_vars(
    pairs: &[String],
) -> Result<std::collections::HashMap<String, serde_json::Value>, String> {
    let mut vars = std::collections::HashMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(format!("--var `{pair}` is not of the form NAME=VALUE"));
        };
        if name.is_empty() {
            return Err(format!("--var `{pair}` has an empty name"));
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        vars.insert(name.to_string(), value);
    }
    Ok(vars)
}
