//! Release index client
//!
//! Resolves a provider identity to a concrete release and its assets via the
//! GitHub releases API. The base URL is injectable so tests can point at a
//! local mock server. Authentication uses an optional bearer token from the
//! `NOMOS_GITHUB_TOKEN` environment variable, added only when non-empty.

use serde::Deserialize;

use nomos_registry::{candidate_tags, Platform, ProviderIdentity};

use crate::error::{Error, Result};
use crate::USER_AGENT;

/// The single optional environment input: a bearer token for the release
/// index.
pub const TOKEN_ENV: &str = "NOMOS_GITHUB_TOKEN";

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Checksum manifest names recognised alongside release binaries.
const CHECKSUM_MANIFESTS: &[&str] = &["checksums.txt", "SHA256SUMS", "checksums.sha256"];

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// HTTP client for the release index.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Create a client against the public index, picking up the bearer
    /// token from the environment when set and non-empty.
    pub fn new() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::with_token(token)
    }

    pub fn with_token(token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
            token,
        })
    }

    /// Point at a different index root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Resolve the release matching `identity`: the latest release when no
    /// version is pinned, else the `vX.Y.Z` tag with a bare-tag fallback.
    pub async fn resolve(&self, owner: &str, repo: &str, identity: &ProviderIdentity) -> Result<Release> {
        if identity.version.is_empty() {
            let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.base_url);
            return self.fetch_release(&url, identity).await;
        }
        let tags = candidate_tags(&identity.version);
        for tag in &tags {
            let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.base_url);
            if let Some(release) = self.try_fetch_release(&url, identity).await? {
                return Ok(release);
            }
        }
        Err(Error::ReleaseNotFound {
            identity: identity.clone(),
            reason: format!("no release tagged {} or {}", tags[0], tags[1]),
        })
    }

    async fn fetch_release(&self, url: &str, identity: &ProviderIdentity) -> Result<Release> {
        self.try_fetch_release(url, identity)
            .await?
            .ok_or_else(|| Error::ReleaseNotFound {
                identity: identity.clone(),
                reason: "no published release".to_string(),
            })
    }

    async fn try_fetch_release(
        &self,
        url: &str,
        identity: &ProviderIdentity,
    ) -> Result<Option<Release>> {
        tracing::debug!(%url, "resolving release");
        let response = self.get(url).send().await.map_err(|e| {
            Error::NetworkFailure {
                identity: identity.clone(),
                reason: e.to_string(),
            }
        })?;
        match response.status() {
            status if status.is_success() => {
                let release = response.json::<Release>().await?;
                Ok(Some(release))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_server_error() => Err(Error::NetworkFailure {
                identity: identity.clone(),
                reason: format!("release index returned HTTP {status}"),
            }),
            status => Err(Error::ReleaseNotFound {
                identity: identity.clone(),
                reason: format!("release index returned HTTP {status}"),
            }),
        }
    }

    /// The published checksum for `asset`, if the release carries one:
    /// either `<asset>.sha256` or a line in a recognised checksum manifest.
    pub async fn published_checksum(
        &self,
        release: &Release,
        asset: &ReleaseAsset,
        identity: &ProviderIdentity,
    ) -> Result<Option<String>> {
        let sidecar = format!("{}.sha256", asset.name);
        if let Some(found) = release.assets.iter().find(|a| a.name == sidecar) {
            let body = self.fetch_text(&found.browser_download_url, identity).await?;
            return Ok(body.split_whitespace().next().map(str::to_lowercase));
        }
        for manifest in CHECKSUM_MANIFESTS {
            let Some(found) = release.assets.iter().find(|a| a.name == *manifest) else {
                continue;
            };
            let body = self.fetch_text(&found.browser_download_url, identity).await?;
            for line in body.lines() {
                let mut parts = line.split_whitespace();
                let (Some(hash), Some(name)) = (parts.next(), parts.next()) else {
                    continue;
                };
                // manifests often prefix names with `*` or `./`
                let name = name.trim_start_matches('*').trim_start_matches("./");
                if name == asset.name {
                    return Ok(Some(hash.to_lowercase()));
                }
            }
        }
        Ok(None)
    }

    async fn fetch_text(&self, url: &str, identity: &ProviderIdentity) -> Result<String> {
        let response = self.get(url).send().await.map_err(|e| Error::NetworkFailure {
            identity: identity.clone(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(Error::NetworkFailure {
                identity: identity.clone(),
                reason: format!("checksum fetch returned HTTP {}", response.status()),
            });
        }
        Ok(response.text().await?)
    }
}

/// Pick the release asset for `platform`, skipping checksum sidecars.
pub fn select_asset<'a>(
    release: &'a Release,
    platform: Platform,
    identity: &ProviderIdentity,
) -> Result<&'a ReleaseAsset> {
    release
        .assets
        .iter()
        .filter(|a| !a.name.ends_with(".sha256") && !is_checksum_manifest(&a.name))
        .find(|a| platform.matches_asset(&a.name))
        .ok_or_else(|| Error::AssetNotFound {
            identity: identity.clone(),
            os: platform.os.as_str().to_string(),
            arch: platform.arch.as_str().to_string(),
            release_tag: release.tag_name.clone(),
        })
}

fn is_checksum_manifest(name: &str) -> bool {
    CHECKSUM_MANIFESTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomos_registry::{Arch, Os};

    fn release(assets: &[&str]) -> Release {
        Release {
            tag_name: "v1.0.0".into(),
            assets: assets
                .iter()
                .map(|name| ReleaseAsset {
                    name: name.to_string(),
                    browser_download_url: format!("https://dl.test/{name}"),
                    size: 1,
                })
                .collect(),
        }
    }

    fn identity() -> ProviderIdentity {
        ProviderIdentity::new("acme/vault", "1.0.0", Platform::new(Os::Linux, Arch::Amd64))
    }

    #[test]
    fn selects_platform_asset_and_skips_sidecars() {
        let release = release(&[
            "prov-linux-amd64.sha256",
            "checksums.txt",
            "prov-darwin-arm64",
            "prov-linux-amd64",
        ]);
        let asset =
            select_asset(&release, Platform::new(Os::Linux, Arch::Amd64), &identity()).unwrap();
        assert_eq!(asset.name, "prov-linux-amd64");
    }

    #[test]
    fn missing_platform_asset_reports_tuple_and_tag() {
        let release = release(&["prov-darwin-arm64"]);
        let err =
            select_asset(&release, Platform::new(Os::Linux, Arch::Amd64), &identity()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("linux-amd64"), "{text}");
        assert!(text.contains("v1.0.0"), "{text}");
    }
}
