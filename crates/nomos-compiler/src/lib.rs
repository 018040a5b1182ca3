//! # nomos-compiler
//!
//! The compilation pipeline: discovers `.csl` files, parses them, resolves
//! and installs declared providers, launches them, evaluates references and
//! sections into a merged snapshot, and encodes the result
//! deterministically as JSON, YAML or a tfvars file.
//!
//! The single entry point is [`compile`]; the outer CLI owns argument
//! parsing, diagnostic printing and exit codes.

pub mod compile;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod eval;
pub mod options;

pub use compile::{compile, compile_with_reporter, Compilation};
pub use encode::{encode, is_hcl_identifier, resolve_output_path, Metadata};
pub use error::CompileFailure;
pub use eval::{Evaluator, LaunchError, LaunchErrorKind, ProviderLauncher};
pub use options::{CompileOptions, OutputFormat};
