//! Error types for nomos-registry

use std::path::PathBuf;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur around provider identity and the lockfile
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lockfile could not be parsed
    #[error("Failed to parse lockfile {path}: {source}")]
    LockfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Lockfile was written by a newer schema
    #[error("Lockfile {path} has unsupported schema version {found} (supported: {supported})")]
    LockfileSchema {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// Lockfile could not be serialized
    #[error("Failed to encode lockfile: {0}")]
    LockfileEncode(#[source] serde_json::Error),

    /// Provider type is neither `owner/repo` nor pre-registered
    #[error("Unknown provider type `{source_type}`: not `owner/repo` and not registered")]
    UnknownProviderType { source_type: String },

    /// Declared version is not valid semver
    #[error("Invalid semantic version `{version}` for provider `{source_type}`")]
    InvalidVersion {
        source_type: String,
        version: String,
    },
}
