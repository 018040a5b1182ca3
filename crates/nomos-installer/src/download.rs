//! Streaming artifact download with retry, verification and atomic install
//!
//! Bytes stream into a temporary file under the cache staging directory
//! while a SHA-256 runs over them. On success the file is made executable
//! and renamed into place; on every failure or cancellation path the
//! temporary file is removed by its RAII guard.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use nomos_registry::ProviderIdentity;

use crate::error::{Error, Result};
use crate::USER_AGENT;

/// Longest `Retry-After` delay we will honour before giving the attempt up
/// to the backoff loop.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// One artifact to fetch and install.
#[derive(Debug)]
pub struct FetchRequest<'a> {
    pub identity: &'a ProviderIdentity,
    pub url: &'a str,
    /// Final binary location
    pub dest: &'a Path,
    /// Staging directory for the in-flight temp file (same filesystem)
    pub staging_dir: &'a Path,
    /// Verify against this checksum when pre-known; otherwise the computed
    /// checksum is recorded as-is
    pub expected_checksum: Option<&'a str>,
    pub bearer_token: Option<&'a str>,
}

/// Result of a completed fetch.
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub path: PathBuf,
    pub checksum: String,
    pub size: u64,
}

/// HTTP downloader for provider release artifacts
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    max_retries: usize,
    min_delay: Duration,
    max_delay: Duration,
}

impl Downloader {
    /// Default maximum retry attempts
    const DEFAULT_MAX_RETRIES: usize = 3;
    /// Default minimum retry delay
    const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
    /// Default maximum retry delay
    const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(15);

    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            min_delay: Self::DEFAULT_MIN_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        })
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the minimum retry delay
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    fn build_retry_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// Fetch one artifact, retrying transient failures with exponential
    /// backoff, and install it atomically at `request.dest`.
    pub async fn fetch(
        &self,
        request: &FetchRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<FetchedArtifact> {
        (|| async { self.fetch_once(request, cancel).await })
            .retry(self.build_retry_strategy())
            .when(|e: &Error| e.is_recoverable())
            .notify(|err: &Error, dur: Duration| {
                tracing::warn!("download failed: {err}, retrying in {dur:?}");
            })
            .await
    }

    async fn fetch_once(
        &self,
        request: &FetchRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<FetchedArtifact> {
        let identity = request.identity;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                identity: Some(identity.clone()),
            });
        }

        std::fs::create_dir_all(request.staging_dir)
            .map_err(|e| Error::from_install_io(identity, request.staging_dir, e))?;
        // removed on drop unless persisted
        let mut staging = tempfile::NamedTempFile::new_in(request.staging_dir)
            .map_err(|e| Error::from_install_io(identity, request.staging_dir, e))?;

        tracing::debug!(url = request.url, %identity, "starting download");
        let mut req = self.client.get(request.url);
        if let Some(token) = request.bearer_token {
            req = req.bearer_auth(token);
        }
        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled { identity: Some(identity.clone()) });
            }
            resp = req.send() => resp.map_err(|e| self.classify(identity, request.url, e))?,
        };

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after(&response).unwrap_or(self.min_delay).min(MAX_RETRY_AFTER);
            tracing::warn!(%identity, ?delay, "rate limited, honouring Retry-After");
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled { identity: Some(identity.clone()) });
                }
                _ = tokio::time::sleep(delay) => {}
            }
            return Err(Error::RateLimited {
                identity: identity.clone(),
            });
        }
        if status.is_server_error() {
            return Err(Error::NetworkFailure {
                identity: identity.clone(),
                reason: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            return Err(Error::ReleaseNotFound {
                identity: identity.clone(),
                reason: format!("artifact fetch returned HTTP {status}"),
            });
        }

        let mut stream = response.bytes_stream();
        let mut hasher = Sha256::new();
        let mut size = 0u64;
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled { identity: Some(identity.clone()) });
                }
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(|e| self.classify(identity, request.url, e))?;
            hasher.update(&chunk);
            size += chunk.len() as u64;
            staging
                .as_file_mut()
                .write_all(&chunk)
                .map_err(|e| Error::from_install_io(identity, request.staging_dir, e))?;
        }
        staging
            .as_file_mut()
            .flush()
            .map_err(|e| Error::from_install_io(identity, request.staging_dir, e))?;

        let checksum = hex(&hasher.finalize());
        if let Some(expected) = request.expected_checksum {
            if !expected.eq_ignore_ascii_case(&checksum) {
                // staging temp removed by drop
                return Err(Error::ChecksumMismatch {
                    identity: identity.clone(),
                    expected: expected.to_lowercase(),
                    actual: checksum,
                });
            }
        }

        self.install(staging, request.dest, identity)?;
        tracing::debug!(%identity, dest = %request.dest.display(), size, "installed provider binary");
        Ok(FetchedArtifact {
            path: request.dest.to_path_buf(),
            checksum,
            size,
        })
    }

    /// chmod executable, then rename into place.
    fn install(
        &self,
        staging: tempfile::NamedTempFile,
        dest: &Path,
        identity: &ProviderIdentity,
    ) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::from_install_io(identity, parent, e))?;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(staging.path(), std::fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::from_install_io(identity, staging.path(), e))?;
        }
        staging
            .persist(dest)
            .map_err(|e| Error::from_install_io(identity, dest, e.error))?;
        Ok(())
    }

    fn classify(&self, identity: &ProviderIdentity, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::NetworkTimeout {
                identity: identity.clone(),
                url: url.to_string(),
            }
        } else {
            Error::NetworkFailure {
                identity: identity.clone(),
                reason: err.to_string(),
            }
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
