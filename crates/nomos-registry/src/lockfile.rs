//! The providers lockfile
//!
//! Records exact identity and checksum of every installed provider binary.
//! Read once at startup, merged after successful installs, rewritten
//! atomically (temp-then-rename in the same directory). Entries are keyed by
//! `(type, version, os, arch)` and sorted by that tuple before writing so
//! the file is byte-stable across runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checksum::file_sha256;
use crate::error::{Error, Result};
use crate::identity::ProviderIdentity;
use crate::paths::CacheLayout;

pub const LOCKFILE_SCHEMA_VERSION: u32 = 1;

/// How an installed artifact was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSource {
    pub owner: String,
    pub repo: String,
    pub release_tag: String,
    pub asset: String,
}

/// One installed provider binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedProvider {
    pub alias: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    /// Relative location under the cache root
    pub path: String,
    /// Hex SHA-256 of the binary file
    pub checksum: String,
    pub source: SourceMetadata,
}

impl LockedProvider {
    pub fn identity(&self) -> ProviderIdentity {
        ProviderIdentity {
            source_type: self.source_type.clone(),
            version: self.version.clone(),
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub schema_version: u32,
    pub providers: Vec<LockedProvider>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self {
            schema_version: LOCKFILE_SCHEMA_VERSION,
            providers: Vec::new(),
        }
    }
}

impl Lockfile {
    /// Load from disk; a missing file is an empty lockfile.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let lockfile: Lockfile =
            serde_json::from_slice(&data).map_err(|source| Error::LockfileParse {
                path: path.to_path_buf(),
                source,
            })?;
        if lockfile.schema_version > LOCKFILE_SCHEMA_VERSION {
            return Err(Error::LockfileSchema {
                path: path.to_path_buf(),
                found: lockfile.schema_version,
                supported: LOCKFILE_SCHEMA_VERSION,
            });
        }
        Ok(lockfile)
    }

    /// Find the entry for an identity, if present.
    pub fn find(&self, identity: &ProviderIdentity) -> Option<&LockedProvider> {
        self.providers.iter().find(|p| p.identity() == *identity)
    }

    /// Insert or replace entries by identity.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = LockedProvider>) {
        for entry in entries {
            let identity = entry.identity();
            self.providers.retain(|p| p.identity() != identity);
            self.providers.push(entry);
        }
    }

    /// Sort entries by `(type, version, os, arch)`.
    pub fn normalize(&mut self) {
        self.providers.sort_by_key(|p| p.identity());
    }

    /// Write atomically: serialize, write to a sibling temp file, rename.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.normalize();
        let data =
            serde_json::to_vec_pretty(self).map_err(Error::LockfileEncode)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(tmp.path(), &data)?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), providers = self.providers.len(), "lockfile written");
        Ok(())
    }

    /// Does the on-disk binary for `entry` exist with the recorded checksum?
    pub fn verify_entry(&self, layout: &CacheLayout, entry: &LockedProvider) -> bool {
        let path = layout.resolve(Path::new(&entry.path));
        if !path.is_file() {
            return false;
        }
        match file_sha256(&path) {
            Ok(actual) => actual == entry.checksum,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, Platform};

    fn entry(source_type: &str, version: &str) -> LockedProvider {
        LockedProvider {
            alias: "a".into(),
            source_type: source_type.into(),
            version: version.into(),
            os: "linux".into(),
            arch: "amd64".into(),
            path: format!("providers/{}/{version}/linux-amd64/provider", source_type.replace('/', "-")),
            checksum: "00".repeat(32),
            source: SourceMetadata::default(),
        }
    }

    #[test]
    fn missing_lockfile_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lf = Lockfile::load(&dir.path().join("providers.lock.json")).unwrap();
        assert!(lf.providers.is_empty());
        assert_eq!(lf.schema_version, LOCKFILE_SCHEMA_VERSION);
    }

    #[test]
    fn save_load_round_trip_is_sorted_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.lock.json");

        let mut lf = Lockfile::default();
        lf.merge([entry("zeta/prov", "1.0.0"), entry("acme/vault", "0.2.0")]);
        lf.save(&path).unwrap();
        let first = std::fs::read(&path).unwrap();

        let mut reloaded = Lockfile::load(&path).unwrap();
        assert_eq!(reloaded.providers.len(), 2);
        assert_eq!(reloaded.providers[0].source_type, "acme/vault");
        reloaded.save(&path).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second, "rewriting an unchanged lockfile must be byte-identical");
    }

    #[test]
    fn merge_replaces_by_identity() {
        let mut lf = Lockfile::default();
        lf.merge([entry("acme/vault", "1.0.0")]);
        let mut updated = entry("acme/vault", "1.0.0");
        updated.checksum = "11".repeat(32);
        lf.merge([updated]);
        assert_eq!(lf.providers.len(), 1);
        assert_eq!(lf.providers[0].checksum, "11".repeat(32));
    }

    #[test]
    fn newer_schema_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.lock.json");
        std::fs::write(&path, r#"{"schema_version": 99, "providers": []}"#).unwrap();
        let err = Lockfile::load(&path).unwrap_err();
        assert!(err.to_string().contains("schema version 99"), "{err}");
    }

    #[test]
    fn verify_entry_checks_existence_and_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        let identity =
            ProviderIdentity::new("acme/vault", "1.0.0", Platform::new(Os::Linux, Arch::Amd64));
        let binary = layout.provider_binary(&identity);
        std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
        std::fs::write(&binary, b"binary-bytes").unwrap();

        let mut locked = entry("acme/vault", "1.0.0");
        locked.path = layout
            .relative_binary_path(&identity)
            .to_string_lossy()
            .into_owned();
        locked.checksum = crate::checksum::bytes_sha256(b"binary-bytes");

        let lf = Lockfile::default();
        assert!(lf.verify_entry(&layout, &locked));

        std::fs::write(&binary, b"corrupted").unwrap();
        assert!(!lf.verify_entry(&layout, &locked));
    }
}
