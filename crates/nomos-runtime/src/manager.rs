//! Provider subprocess lifecycle
//!
//! Launches cached provider binaries on demand, performs the
//! `PROVIDER_PORT=<n>` handshake, health-checks the RPC channel, and shares
//! one connection per alias across all callers. Shutdown is deterministic:
//! best-effort `Shutdown` RPC, then kill, on success and failure alike.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};

use crate::client::{RpcClient, DEFAULT_CALL_TIMEOUT};
use crate::error::{Error, Result};
use crate::proto::STATUS_OK;

/// Timeouts governing launch and calls.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How long to wait for the `PROVIDER_PORT` line
    pub handshake_timeout: Duration,
    /// Per-RPC timeout
    pub call_timeout: Duration,
    /// Best-effort shutdown RPC timeout
    pub shutdown_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

/// A running provider child and its RPC channel.
#[derive(Debug)]
pub struct ProviderProcess {
    alias: String,
    child: Mutex<Child>,
    client: RpcClient,
}

impl ProviderProcess {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    async fn kill(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            tracing::debug!(alias = self.alias, error = %e, "provider child already gone");
        }
    }
}

/// Launches and caches provider subprocesses, keyed by alias.
pub struct ProviderManager {
    /// alias -> installed binary path
    binaries: HashMap<String, PathBuf>,
    providers: RwLock<HashMap<String, Arc<ProviderProcess>>>,
    config: RuntimeConfig,
}

impl ProviderManager {
    /// `binaries` maps every alias to its installed binary (resolved from
    /// the lockfile by the caller).
    pub fn new(binaries: HashMap<String, PathBuf>, config: RuntimeConfig) -> Self {
        Self {
            binaries,
            providers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// The live provider for `alias`, launching it on first access.
    ///
    /// A given alias is launched at most once: the launch happens under the
    /// write lock after a double check, so concurrent first callers share
    /// one child.
    pub async fn provider(&self, alias: &str) -> Result<Arc<ProviderProcess>> {
        if let Some(found) = self.providers.read().await.get(alias) {
            return Ok(Arc::clone(found));
        }
        let mut providers = self.providers.write().await;
        if let Some(found) = providers.get(alias) {
            return Ok(Arc::clone(found));
        }
        let process = self.launch(alias).await?;
        providers.insert(alias.to_string(), Arc::clone(&process));
        Ok(process)
    }

    async fn launch(&self, alias: &str) -> Result<Arc<ProviderProcess>> {
        let path = self.binaries.get(alias).ok_or_else(|| Error::UnknownAlias {
            alias: alias.to_string(),
        })?;

        tracing::debug!(alias, path = %path.display(), "launching provider");
        let mut child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::SpawnFailed {
                alias: alias.to_string(),
                path: path.display().to_string(),
                source,
            })?;

        // mirror the child's stderr into our log stream
        if let Some(stderr) = child.stderr.take() {
            let alias_owned = alias.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(provider = alias_owned, "{line}");
                }
            });
        }

        let stdout = child.stdout.take().ok_or_else(|| Error::HandshakeFailed {
            alias: alias.to_string(),
            reason: "child stdout unavailable".to_string(),
        })?;

        let port = match tokio::time::timeout(
            self.config.handshake_timeout,
            read_port_line(stdout, alias),
        )
        .await
        {
            Ok(Ok(port)) => port,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(Error::HandshakeTimeout {
                    alias: alias.to_string(),
                    seconds: self.config.handshake_timeout.as_secs(),
                });
            }
        };

        // the child is local and short-lived; plain TCP is fine
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let client = match RpcClient::connect(alias, addr, self.config.call_timeout).await {
            Ok(client) => client,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e);
            }
        };

        let health = match client.health().await {
            Ok(resp) => resp,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e);
            }
        };
        if health.status != STATUS_OK {
            let _ = child.kill().await;
            return Err(Error::Unhealthy {
                alias: alias.to_string(),
                status: health.status,
            });
        }

        tracing::debug!(alias, port, "provider ready");
        Ok(Arc::new(ProviderProcess {
            alias: alias.to_string(),
            child: Mutex::new(child),
            client,
        }))
    }

    /// Shut every provider down: best-effort `Shutdown` RPC, close the
    /// channel, kill anything still alive, clear the map. No provider may
    /// outlive the compilation.
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<ProviderProcess>> =
            self.providers.write().await.drain().map(|(_, p)| p).collect();
        for process in drained {
            let shutdown =
                tokio::time::timeout(self.config.shutdown_timeout, process.client.shutdown());
            if let Err(_) | Ok(Err(_)) = shutdown.await {
                tracing::debug!(alias = process.alias(), "shutdown RPC failed, killing");
            }
            process.kill().await;
        }
    }

    /// Aliases with a live child (for tests and introspection)
    pub async fn running(&self) -> Vec<String> {
        self.providers.read().await.keys().cloned().collect()
    }
}

/// Read stdout until the handshake line; the first line must be
/// `PROVIDER_PORT=<decimal>` or the launch fails.
async fn read_port_line(stdout: tokio::process::ChildStdout, alias: &str) -> Result<u16> {
    let mut lines = BufReader::new(stdout).lines();
    match lines.next_line().await? {
        Some(line) => parse_port_line(&line).ok_or_else(|| Error::HandshakeFailed {
            alias: alias.to_string(),
            reason: format!("expected PROVIDER_PORT=<n>, got `{line}`"),
        }),
        None => Err(Error::HandshakeFailed {
            alias: alias.to_string(),
            reason: "stdout closed before the port handshake".to_string(),
        }),
    }
}

/// Parse `PROVIDER_PORT=<decimal>`.
pub fn parse_port_line(line: &str) -> Option<u16> {
    let value = line.trim().strip_prefix("PROVIDER_PORT=")?;
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_port_lines() {
        assert_eq!(parse_port_line("PROVIDER_PORT=4000"), Some(4000));
        assert_eq!(parse_port_line("PROVIDER_PORT=1\n"), Some(1));
    }

    #[test]
    fn rejects_malformed_port_lines() {
        assert_eq!(parse_port_line("PORT=4000"), None);
        assert_eq!(parse_port_line("PROVIDER_PORT="), None);
        assert_eq!(parse_port_line("PROVIDER_PORT=abc"), None);
        assert_eq!(parse_port_line("PROVIDER_PORT=70000"), None);
        assert_eq!(parse_port_line("listening"), None);
    }

    #[tokio::test]
    async fn unknown_alias_is_an_error() {
        let manager = ProviderManager::new(HashMap::new(), RuntimeConfig::default());
        let err = manager.provider("nope").await.unwrap_err();
        assert!(matches!(err, Error::UnknownAlias { .. }));
    }
}
