//! Error types for nomos-installer

use std::path::PathBuf;

use nomos_registry::ProviderIdentity;

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during provider resolution and installation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registry/lockfile error
    #[error(transparent)]
    Registry(#[from] nomos_registry::Error),

    /// Transient network failure while fetching `identity`
    #[error("Network failure while fetching {identity}: {reason}")]
    NetworkFailure {
        identity: ProviderIdentity,
        reason: String,
    },

    /// Network timeout
    #[error("Network timeout while fetching {identity} from {url}")]
    NetworkTimeout {
        identity: ProviderIdentity,
        url: String,
    },

    /// The release index throttled us; retried after the advertised delay
    #[error("Rate limited while fetching {identity}")]
    RateLimited { identity: ProviderIdentity },

    /// No release matched the requested version
    #[error("No release found for {identity}: {reason}")]
    ReleaseNotFound {
        identity: ProviderIdentity,
        reason: String,
    },

    /// No release asset matched the platform
    #[error("No release asset for {identity} matches {os}-{arch} in release {release_tag}")]
    AssetNotFound {
        identity: ProviderIdentity,
        os: String,
        arch: String,
        release_tag: String,
    },

    /// Checksum verification failed after the retry cycle
    #[error("Checksum mismatch for {identity}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        identity: ProviderIdentity,
        expected: String,
        actual: String,
    },

    /// Disk space exhausted while installing
    #[error("Disk full while installing {identity} at {path}")]
    DiskFull {
        identity: ProviderIdentity,
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied while installing {identity} at {path}")]
    PermissionDenied {
        identity: ProviderIdentity,
        path: PathBuf,
    },

    /// A download exceeded the per-provider fetch timeout
    #[error("Fetching {identity} exceeded the per-provider timeout")]
    FetchTimeout { identity: ProviderIdentity },

    /// The operation was cancelled
    #[error("Cancelled{}", .identity.as_ref().map(|i| format!(" while fetching {i}")).unwrap_or_default())]
    Cancelled { identity: Option<ProviderIdentity> },

    /// Two or more declarations pin the same provider to different versions
    #[error("Version conflict for provider `{source_type}`: {}", format_conflicts(.versions))]
    VersionConflict {
        source_type: String,
        /// `(version, declaring file)` pairs, one per declaration
        versions: Vec<(String, String)>,
    },
}

fn format_conflicts(versions: &[(String, String)]) -> String {
    versions
        .iter()
        .map(|(version, file)| {
            let shown = if version.is_empty() { "latest" } else { version };
            format!("`{shown}` ({file})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Should a retry cycle attempt this again?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NetworkFailure { .. } | Error::NetworkTimeout { .. } | Error::RateLimited { .. }
        )
    }

    /// Map an IO failure during install to the disk-specific kinds.
    pub(crate) fn from_install_io(
        identity: &ProviderIdentity,
        path: &std::path::Path,
        err: std::io::Error,
    ) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                identity: identity.clone(),
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => Error::DiskFull {
                identity: identity.clone(),
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        }
    }
}
