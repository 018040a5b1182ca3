//! End-to-end subprocess test against the provider-stub binary
//!
//! Runs only with `--features dev-tools`, which builds the stub.

use std::collections::HashMap;
use std::path::PathBuf;

use nomos_registry::Provider;
use nomos_runtime::{ProviderManager, RuntimeConfig};

fn stub_manager() -> ProviderManager {
    let stub = PathBuf::from(env!("CARGO_BIN_EXE_provider-stub"));
    let mut binaries = HashMap::new();
    binaries.insert("vault".to_string(), stub);
    ProviderManager::new(binaries, RuntimeConfig::default())
}

#[tokio::test]
async fn launch_handshake_query_and_shutdown() {
    let manager = stub_manager();
    let provider = manager.provider("vault").await.expect("stub should launch");

    let caps = provider
        .initialize(serde_json::json!({
            "db": {"host": "db.internal", "ports": [5432, 5433]},
            "region": "eu-west-1",
        }))
        .await
        .expect("initialize");
    assert!(caps.contains(&"get".to_string()));

    let host = provider
        .get(&["db".to_string(), "host".to_string()])
        .await
        .expect("get db.host");
    assert_eq!(host, serde_json::json!("db.internal"));

    let port = provider
        .get(&["db".to_string(), "ports".to_string(), "1".to_string()])
        .await
        .expect("get db.ports[1]");
    assert_eq!(port, serde_json::json!(5433));

    let whole = provider.get(&["*".to_string()]).await.expect("get *");
    assert_eq!(whole["region"], serde_json::json!("eu-west-1"));

    let keys = provider.list().await.expect("list");
    assert!(keys.contains(&"db".to_string()));
    assert!(keys.contains(&"region".to_string()));

    let missing = provider.get(&["nope".to_string()]).await;
    assert!(missing.is_err(), "unknown keys are provider errors");

    manager.shutdown_all().await;
    assert!(manager.running().await.is_empty());
}

#[tokio::test]
async fn same_alias_launches_at_most_once() {
    let manager = std::sync::Arc::new(stub_manager());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let manager = std::sync::Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.provider("vault").await.expect("launch")
        }));
    }
    let mut processes = Vec::new();
    for handle in handles {
        processes.push(handle.await.unwrap());
    }
    // all callers share the same process instance
    for pair in processes.windows(2) {
        assert!(std::sync::Arc::ptr_eq(&pair[0], &pair[1]));
    }
    assert_eq!(manager.running().await.len(), 1);
    manager.shutdown_all().await;
}
