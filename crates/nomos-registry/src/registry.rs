//! Provider type registry
//!
//! Maps a declared `type` string to how the compiler obtains the provider:
//! any `owner/repo` form resolves to a downloadable descriptor; anything
//! else must have been pre-registered as a builtin factory, or the
//! declaration is invalid.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::identity::split_owner_repo;
use crate::provider::Provider;

/// Constructs a builtin provider instance for a given alias.
pub type BuiltinFactory = Arc<dyn Fn(&str) -> Arc<dyn Provider> + Send + Sync>;

/// How a declared type is obtained.
#[derive(Clone)]
pub enum ResolvedType {
    /// Download from a release index
    Download { owner: String, repo: String },
    /// Construct in-process
    Builtin(BuiltinFactory),
}

impl std::fmt::Debug for ResolvedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedType::Download { owner, repo } => {
                f.debug_struct("Download").field("owner", owner).field("repo", repo).finish()
            }
            ResolvedType::Builtin(_) => f.write_str("Builtin(..)"),
        }
    }
}

/// Registry of known provider types.
#[derive(Default, Clone)]
pub struct ProviderTypeRegistry {
    builtins: HashMap<String, BuiltinFactory>,
}

impl ProviderTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a builtin type under a non-`owner/repo` name.
    pub fn register_builtin(&mut self, type_name: impl Into<String>, factory: BuiltinFactory) {
        self.builtins.insert(type_name.into(), factory);
    }

    /// Resolve a declared type or fail with `UnknownProviderType`.
    pub fn resolve(&self, source_type: &str) -> Result<ResolvedType> {
        if let Some(factory) = self.builtins.get(source_type) {
            return Ok(ResolvedType::Builtin(factory.clone()));
        }
        if let Some((owner, repo)) = split_owner_repo(source_type) {
            return Ok(ResolvedType::Download {
                owner: owner.to_string(),
                repo: repo.to_string(),
            });
        }
        Err(Error::UnknownProviderType {
            source_type: source_type.to_string(),
        })
    }
}

impl std::fmt::Debug for ProviderTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTypeRegistry")
            .field("builtins", &self.builtins.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl Provider for Fixed {
        fn alias(&self) -> &str {
            "fixed"
        }
        async fn initialize(
            &self,
            _config: serde_json::Value,
        ) -> std::result::Result<Vec<String>, crate::provider::ProviderError> {
            Ok(vec![])
        }
        async fn get(
            &self,
            _path: &[String],
        ) -> std::result::Result<serde_json::Value, crate::provider::ProviderError> {
            Ok(serde_json::Value::Null)
        }
        async fn list(
            &self,
        ) -> std::result::Result<Vec<String>, crate::provider::ProviderError> {
            Ok(vec![])
        }
        async fn shutdown(&self) {}
    }

    #[test]
    fn owner_repo_resolves_to_download() {
        let registry = ProviderTypeRegistry::new();
        match registry.resolve("acme/vault").unwrap() {
            ResolvedType::Download { owner, repo } => {
                assert_eq!(owner, "acme");
                assert_eq!(repo, "vault");
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn registered_builtin_wins_over_download_shape() {
        let mut registry = ProviderTypeRegistry::new();
        registry.register_builtin("env", Arc::new(|_| Arc::new(Fixed) as Arc<dyn Provider>));
        assert!(matches!(registry.resolve("env").unwrap(), ResolvedType::Builtin(_)));
    }

    #[test]
    fn unknown_bare_type_is_an_error() {
        let registry = ProviderTypeRegistry::new();
        let err = registry.resolve("vault").unwrap_err();
        assert!(err.to_string().contains("vault"));
    }
}
