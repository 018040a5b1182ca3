//! Provider installation orchestration
//!
//! Takes the source declarations collected from every parsed file, detects
//! version conflicts, reuses verified cache entries, downloads the rest
//! concurrently under a semaphore, and merges successful installs into the
//! lockfile with an atomic write. Cancellation never rewrites the lockfile.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use nomos_registry::{
    CacheLayout, GithubSource, LockedProvider, Lockfile, Platform, ProviderIdentity,
    SourceMetadata,
};

use crate::download::{Downloader, FetchRequest};
use crate::error::{Error, Result};
use crate::progress::{InstallReporter, NullReporter};
use crate::release::{select_asset, Release, ReleaseAsset, ReleaseClient};

/// A downloadable provider declaration gathered from one `.csl` file.
#[derive(Debug, Clone)]
pub struct DeclaredProvider {
    pub alias: String,
    /// `owner/repo`
    pub source_type: String,
    /// Semantic version or empty for latest
    pub version: String,
    /// File that declared it, for conflict diagnostics
    pub file: String,
}

/// Outcome of installing all declared providers.
#[derive(Debug, Default)]
pub struct InstallSummary {
    /// Entries installed or reused this run, ready for lockfile merge
    pub installed: Vec<LockedProvider>,
    /// Identities that failed, with their error
    pub failed: Vec<(ProviderIdentity, Error)>,
    /// How many identities were served from the verified cache
    pub reused: usize,
}

/// Tuning knobs for the installer.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Maximum concurrent downloads; 0 means available parallelism
    pub max_concurrent: usize,
    /// Timeout for one provider's whole fetch cycle (including retries)
    pub fetch_timeout: Duration,
    /// Continue past failed providers instead of aborting
    pub allow_missing: bool,
    /// Platform to install for (defaults to the host)
    pub platform: Platform,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            fetch_timeout: Duration::from_secs(300),
            allow_missing: false,
            platform: Platform::current(),
        }
    }
}

/// Coordinates the release client, downloader and lockfile.
pub struct ProviderInstaller {
    layout: CacheLayout,
    releases: ReleaseClient,
    downloader: Downloader,
    config: InstallerConfig,
    reporter: Arc<dyn InstallReporter>,
}

impl ProviderInstaller {
    pub fn new(layout: CacheLayout, config: InstallerConfig) -> Result<Self> {
        Ok(Self {
            layout,
            releases: ReleaseClient::new()?,
            downloader: Downloader::new()?,
            config,
            reporter: Arc::new(NullReporter),
        })
    }

    /// Swap in a custom release client (tests point this at a mock index).
    pub fn with_release_client(mut self, releases: ReleaseClient) -> Self {
        self.releases = releases;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn InstallReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Make every declared provider available on disk, updating `lockfile`.
    ///
    /// Fails fast on version conflicts before any network traffic. Writes
    /// the lockfile only when the run was not cancelled and either nothing
    /// failed or `allow_missing` is set.
    pub async fn ensure_installed(
        &self,
        declarations: &[DeclaredProvider],
        lockfile: &mut Lockfile,
        cancel: &CancellationToken,
    ) -> Result<InstallSummary> {
        detect_version_conflicts(declarations)?;

        // unique identities, first-declared alias wins the lockfile entry
        let mut unique: BTreeMap<ProviderIdentity, &DeclaredProvider> = BTreeMap::new();
        for decl in declarations {
            let identity =
                ProviderIdentity::new(&decl.source_type, &decl.version, self.config.platform);
            unique.entry(identity).or_insert(decl);
        }

        let mut summary = InstallSummary::default();
        let mut pending = Vec::new();
        for (identity, decl) in unique {
            if let Some(entry) = lockfile.find(&identity) {
                if lockfile.verify_entry(&self.layout, entry) {
                    tracing::debug!(%identity, "provider cached and verified, skipping download");
                    self.reporter.install_reused(&identity).await;
                    summary.reused += 1;
                    summary.installed.push(entry.clone());
                    continue;
                }
                // corrupted or missing on disk; remove and re-download
                let path = self.layout.resolve(std::path::Path::new(&entry.path));
                tracing::warn!(%identity, path = %path.display(), "cached binary failed verification, re-downloading");
                let _ = std::fs::remove_file(&path);
            }
            pending.push((identity, decl));
        }

        if pending.is_empty() {
            self.finish(lockfile, &summary, cancel)?;
            return Ok(summary);
        }

        let permits = if self.config.max_concurrent > 0 {
            self.config.max_concurrent
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        };
        let semaphore = Arc::new(Semaphore::new(permits.max(1)));

        let mut tasks = Vec::new();
        for (identity, decl) in pending {
            let semaphore = Arc::clone(&semaphore);
            let known_entry = lockfile.find(&identity).cloned();
            tasks.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.reporter.install_started(&identity).await;
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(Error::Cancelled { identity: Some(identity.clone()) }),
                    result = tokio::time::timeout(
                        self.config.fetch_timeout,
                        self.install_one(&identity, decl, known_entry.as_ref(), cancel),
                    ) => match result {
                        Ok(inner) => inner,
                        Err(_) => Err(Error::FetchTimeout { identity: identity.clone() }),
                    },
                };
                (identity, result)
            });
        }

        for (identity, result) in futures_util::future::join_all(tasks).await {
            match result {
                Ok(entry) => {
                    self.reporter.install_finished(&identity).await;
                    summary.installed.push(entry);
                }
                Err(err) => {
                    self.reporter.install_failed(&identity, &err.to_string()).await;
                    summary.failed.push((identity, err));
                }
            }
        }

        if let Some((identity, _)) = summary.failed.iter().find(|(_, e)| matches!(e, Error::Cancelled { .. })) {
            return Err(Error::Cancelled {
                identity: Some(identity.clone()),
            });
        }
        if !self.config.allow_missing {
            if let Some((_, err)) = summary.failed.drain(..).next() {
                return Err(err);
            }
        }

        self.finish(lockfile, &summary, cancel)?;
        Ok(summary)
    }

    /// Merge and persist the lockfile for a run that is allowed to complete.
    fn finish(
        &self,
        lockfile: &mut Lockfile,
        summary: &InstallSummary,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { identity: None });
        }
        if summary.installed.is_empty() && lockfile.providers.is_empty() {
            // nothing declared and nothing recorded; leave the cache untouched
            return Ok(());
        }
        lockfile.merge(summary.installed.iter().cloned());
        lockfile.save(&self.layout.lockfile_path())?;
        Ok(())
    }

    /// Resolve, download, verify and install one provider identity.
    async fn install_one(
        &self,
        identity: &ProviderIdentity,
        decl: &DeclaredProvider,
        known_entry: Option<&LockedProvider>,
        cancel: &CancellationToken,
    ) -> Result<LockedProvider> {
        let (owner, repo) = identity.github_repo().ok_or_else(|| Error::ReleaseNotFound {
            identity: identity.clone(),
            reason: format!("`{}` is not an owner/repo provider type", identity.source_type),
        })?;

        let release = self.releases.resolve(owner, repo, identity).await?;
        let asset = select_asset(&release, self.config.platform, identity)?;
        let expected = self
            .expected_checksum(identity, known_entry, &release, asset)
            .await?;

        let dest = self.layout.provider_binary(identity);
        let staging_dir = self.layout.staging_dir();
        let request = FetchRequest {
            identity,
            url: &asset.browser_download_url,
            dest: &dest,
            staging_dir: &staging_dir,
            expected_checksum: expected.as_deref(),
            bearer_token: self.releases.token(),
        };

        let artifact = match self.downloader.fetch(&request, cancel).await {
            Ok(artifact) => artifact,
            Err(Error::ChecksumMismatch { .. }) => {
                // one cleanup-and-retry cycle; a second mismatch is fatal
                tracing::warn!(%identity, "checksum mismatch, retrying download once");
                let _ = std::fs::remove_file(&dest);
                self.downloader.fetch(&request, cancel).await?
            }
            Err(err) => return Err(err),
        };

        Ok(LockedProvider {
            alias: decl.alias.clone(),
            source_type: identity.source_type.clone(),
            version: identity.version.clone(),
            os: identity.os.clone(),
            arch: identity.arch.clone(),
            path: self
                .layout
                .relative_binary_path(identity)
                .to_string_lossy()
                .into_owned(),
            checksum: artifact.checksum,
            source: SourceMetadata {
                github: Some(GithubSource {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    release_tag: release.tag_name.clone(),
                    asset: asset.name.clone(),
                }),
            },
        })
    }

    /// The checksum to verify against: the lockfile's when it recorded the
    /// same release tag, else the release's published checksum, else none.
    async fn expected_checksum(
        &self,
        identity: &ProviderIdentity,
        known_entry: Option<&LockedProvider>,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<Option<String>> {
        if let Some(entry) = known_entry {
            let same_release = entry
                .source
                .github
                .as_ref()
                .is_some_and(|g| g.release_tag == release.tag_name && g.asset == asset.name);
            if same_release {
                return Ok(Some(entry.checksum.clone()));
            }
        }
        self.releases.published_checksum(release, asset, identity).await
    }
}

/// Abort when two declarations share a type but differ in version.
///
/// Aliases may differ freely; the same `(type, version)` may appear with
/// multiple aliases. The error enumerates every version seen with its
/// declaring file.
pub fn detect_version_conflicts(declarations: &[DeclaredProvider]) -> Result<()> {
    let mut by_type: BTreeMap<&str, Vec<&DeclaredProvider>> = BTreeMap::new();
    for decl in declarations {
        by_type.entry(decl.source_type.as_str()).or_default().push(decl);
    }
    for (source_type, decls) in by_type {
        let mut versions: Vec<&str> = decls.iter().map(|d| d.version.as_str()).collect();
        versions.sort_unstable();
        versions.dedup();
        if versions.len() > 1 {
            let mut seen = Vec::new();
            for decl in &decls {
                let pair = (decl.version.clone(), decl.file.clone());
                if !seen.contains(&pair) {
                    seen.push(pair);
                }
            }
            seen.sort();
            return Err(Error::VersionConflict {
                source_type: source_type.to_string(),
                versions: seen,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(alias: &str, source_type: &str, version: &str, file: &str) -> DeclaredProvider {
        DeclaredProvider {
            alias: alias.into(),
            source_type: source_type.into(),
            version: version.into(),
            file: file.into(),
        }
    }

    #[test]
    fn same_version_multiple_aliases_is_fine() {
        let decls = vec![
            decl("a", "ab/prov", "0.1.0", "one.csl"),
            decl("b", "ab/prov", "0.1.0", "two.csl"),
        ];
        assert!(detect_version_conflicts(&decls).is_ok());
    }

    #[test]
    fn differing_versions_conflict_and_list_everything() {
        let decls = vec![
            decl("a", "ab/prov", "0.1.0", "one.csl"),
            decl("b", "ab/prov", "0.2.0", "two.csl"),
        ];
        let err = detect_version_conflicts(&decls).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("ab/prov"), "{text}");
        assert!(text.contains("0.1.0"), "{text}");
        assert!(text.contains("0.2.0"), "{text}");
        assert!(text.contains("one.csl"), "{text}");
        assert!(text.contains("two.csl"), "{text}");
    }

    #[test]
    fn distinct_types_never_conflict() {
        let decls = vec![
            decl("a", "ab/prov", "0.1.0", "one.csl"),
            decl("b", "cd/other", "9.9.9", "one.csl"),
        ];
        assert!(detect_version_conflicts(&decls).is_ok());
    }
}
