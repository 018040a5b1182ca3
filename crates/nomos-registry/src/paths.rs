//! Cache layout under the `.nomos/` root
//!
//! ```text
//! .nomos/
//!   providers/<sanitised-type>/<version>/<os>-<arch>/provider[.exe]
//!   .nomos-tmp/            staging for in-flight downloads
//!   providers.lock.json    the lockfile
//! ```

use std::path::{Path, PathBuf};

use crate::identity::ProviderIdentity;
use crate::platform::Os;

pub const CACHE_DIR_NAME: &str = ".nomos";
pub const LOCKFILE_NAME: &str = "providers.lock.json";
pub const STAGING_DIR_NAME: &str = ".nomos-tmp";

/// Resolves every on-disk location the compiler touches.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Layout rooted at `<base>/.nomos`
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            root: base.as_ref().join(CACHE_DIR_NAME),
        }
    }

    /// Layout with an explicit cache root (already including `.nomos`)
    pub fn at_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }

    pub fn providers_dir(&self) -> PathBuf {
        self.root.join("providers")
    }

    /// Final location of an installed provider binary.
    pub fn provider_binary(&self, identity: &ProviderIdentity) -> PathBuf {
        let suffix = if identity.os == Os::Windows.as_str() { ".exe" } else { "" };
        let version = if identity.version.is_empty() {
            "latest"
        } else {
            &identity.version
        };
        self.providers_dir()
            .join(identity.sanitized_type())
            .join(version)
            .join(format!("{}-{}", identity.os, identity.arch))
            .join(format!("provider{suffix}"))
    }

    /// The binary path relative to the cache root, as stored in the lockfile.
    pub fn relative_binary_path(&self, identity: &ProviderIdentity) -> PathBuf {
        self.provider_binary(identity)
            .strip_prefix(&self.root)
            .expect("binary path is under the cache root")
            .to_path_buf()
    }

    /// Resolve a lockfile-relative path back to an absolute one.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
