//! # nomos-runtime
//!
//! The provider subprocess manager: launches cached provider binaries,
//! performs the `PROVIDER_PORT=<n>` stdout handshake, establishes a framed
//! protobuf RPC channel on loopback, multiplexes concurrent callers over
//! one connection per alias, and tears everything down deterministically
//! when compilation ends.

pub mod client;
pub mod error;
pub mod manager;
pub mod proto;
pub mod provider;

pub use client::{RpcClient, DEFAULT_CALL_TIMEOUT};
pub use error::{Error, Result};
pub use manager::{parse_port_line, ProviderManager, ProviderProcess, RuntimeConfig};
