//! The provider surface consumed by the evaluator
//!
//! Both subprocess-backed providers (nomos-runtime) and builtin providers
//! implement this trait; the evaluator never knows which it is talking to.

use async_trait::async_trait;

/// Errors surfaced by a live provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider `{alias}` failed to initialize: {message}")]
    Initialize { alias: String, message: String },

    #[error("provider `{alias}` returned an error for `{path}`: {message}")]
    Get {
        alias: String,
        path: String,
        message: String,
    },

    #[error("provider `{alias}` call failed: {message}")]
    Call { alias: String, message: String },
}

/// A live provider: initialized once, then queried for values.
///
/// Implementations must be safe for concurrent calls.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The alias this instance is bound to
    fn alias(&self) -> &str;

    /// Pass the declaration's provider-specific config; returns the
    /// capability strings from the provider's manifest.
    async fn initialize(&self, config: serde_json::Value) -> Result<Vec<String>, ProviderError>;

    /// Value at a dotted path under the provider's namespace. A trailing
    /// `*` segment selects the whole tree.
    async fn get(&self, path: &[String]) -> Result<serde_json::Value, ProviderError>;

    /// Top-level keys, used for sanity checks.
    async fn list(&self) -> Result<Vec<String>, ProviderError>;

    /// Best-effort lifecycle end; errors are logged, not propagated.
    async fn shutdown(&self);
}
