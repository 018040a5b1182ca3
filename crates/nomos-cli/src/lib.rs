//! # nomos-cli
//!
//! The outer driver: argument parsing, tracing setup, console progress and
//! exit-code mapping around [`nomos_compiler::compile`]. The core never
//! prints; everything user-visible happens here.

pub mod cli;
pub mod reporter;
pub mod tracing_setup;

pub use cli::Cli;
pub use tracing_setup::setup_tracing;
