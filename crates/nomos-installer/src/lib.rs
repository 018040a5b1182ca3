//! # nomos-installer
//!
//! The provider resolution and caching engine: resolves declared providers
//! to releases, downloads the matching platform asset with retry and
//! integrity checking, installs it atomically under the `.nomos/` cache,
//! and keeps the lockfile in sync.
//!
//! The installer performs no terminal I/O; progress surfaces through the
//! [`InstallReporter`] callback interface.

pub mod download;
pub mod error;
pub mod installer;
pub mod progress;
pub mod release;

pub use download::{Downloader, FetchRequest, FetchedArtifact};
pub use error::{Error, Result};
pub use installer::{
    detect_version_conflicts, DeclaredProvider, InstallSummary, InstallerConfig, ProviderInstaller,
};
pub use progress::{InstallReporter, NullReporter};
pub use release::{select_asset, Release, ReleaseAsset, ReleaseClient, TOKEN_ENV};

/// User agent for all release-index and download traffic
pub const USER_AGENT: &str = concat!("nomos/", env!("CARGO_PKG_VERSION"));
