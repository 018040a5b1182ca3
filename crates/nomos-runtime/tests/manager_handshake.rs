//! Handshake failure paths, driven with tiny system binaries

#![cfg(unix)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use nomos_runtime::{Error, ProviderManager, RuntimeConfig};

fn manager(binaries: &[(&str, &str)]) -> ProviderManager {
    let map: HashMap<String, PathBuf> = binaries
        .iter()
        .map(|(alias, path)| (alias.to_string(), PathBuf::from(path)))
        .collect();
    ProviderManager::new(
        map,
        RuntimeConfig {
            handshake_timeout: Duration::from_secs(5),
            ..RuntimeConfig::default()
        },
    )
}

#[tokio::test]
async fn wrong_first_line_is_fatal() {
    // echo prints an empty line, not PROVIDER_PORT=<n>
    let manager = manager(&[("echo", "/bin/echo")]);
    let err = manager.provider("echo").await.unwrap_err();
    assert!(matches!(err, Error::HandshakeFailed { .. }), "got {err:?}");
    assert!(manager.running().await.is_empty());
}

#[tokio::test]
async fn eof_without_port_line_is_fatal() {
    let manager = manager(&[("true", "/bin/true")]);
    let err = manager.provider("true").await.unwrap_err();
    assert!(matches!(err, Error::HandshakeFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_binary_fails_to_spawn() {
    let manager = manager(&[("ghost", "/nonexistent/provider")]);
    let err = manager.provider("ghost").await.unwrap_err();
    assert!(matches!(err, Error::SpawnFailed { .. }), "got {err:?}");
}
