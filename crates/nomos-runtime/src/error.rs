//! Error types for nomos-runtime

use std::net::SocketAddr;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while running provider subprocesses
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No installed binary is known for the alias
    #[error("No installed provider binary for alias `{alias}`")]
    UnknownAlias { alias: String },

    /// The child process could not be started
    #[error("Failed to start provider `{alias}` ({path}): {source}")]
    SpawnFailed {
        alias: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The child never produced a valid `PROVIDER_PORT=<n>` line
    #[error("Provider `{alias}` handshake failed: {reason}")]
    HandshakeFailed { alias: String, reason: String },

    /// The handshake line did not arrive in time
    #[error("Provider `{alias}` did not announce a port within {seconds}s")]
    HandshakeTimeout { alias: String, seconds: u64 },

    /// Could not dial the announced port
    #[error("Failed to connect to provider `{alias}` at {addr}: {source}")]
    ConnectFailed {
        alias: String,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The initial health probe came back non-OK
    #[error("Provider `{alias}` reported unhealthy status `{status}`")]
    Unhealthy { alias: String, status: String },

    /// An RPC call violated the protocol
    #[error("Provider `{alias}` protocol error: {reason}")]
    Protocol { alias: String, reason: String },

    /// An RPC call did not complete in time
    #[error("Provider `{alias}` call timed out")]
    CallTimeout { alias: String },

    /// The connection closed mid-call
    #[error("Provider `{alias}` connection closed unexpectedly")]
    ConnectionClosed { alias: String },

    /// The operation was cancelled
    #[error("Cancelled while talking to provider `{alias}`")]
    Cancelled { alias: String },
}
