//! Progress reporting interface for installation operations
//!
//! The installer performs no terminal I/O itself; the driver supplies a
//! reporter and renders status lines however it likes.

use nomos_registry::ProviderIdentity;

/// Progress callbacks emitted while providers install
#[async_trait::async_trait]
pub trait InstallReporter: Send + Sync {
    /// A download for `identity` is starting
    async fn install_started(&self, identity: &ProviderIdentity);

    /// `identity` was already cached with a matching checksum
    async fn install_reused(&self, identity: &ProviderIdentity);

    /// `identity` downloaded, verified and installed
    async fn install_finished(&self, identity: &ProviderIdentity);

    /// `identity` failed to install
    async fn install_failed(&self, identity: &ProviderIdentity, message: &str);
}

/// Reporter that discards all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

#[async_trait::async_trait]
impl InstallReporter for NullReporter {
    async fn install_started(&self, _identity: &ProviderIdentity) {}
    async fn install_reused(&self, _identity: &ProviderIdentity) {}
    async fn install_finished(&self, _identity: &ProviderIdentity) {}
    async fn install_failed(&self, _identity: &ProviderIdentity, _message: &str) {}
}
