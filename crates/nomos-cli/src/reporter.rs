//! Console install progress

use console::style;

use nomos_installer::InstallReporter;
use nomos_registry::ProviderIdentity;

/// Renders installer progress as status lines on stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl InstallReporter for ConsoleReporter {
    async fn install_started(&self, identity: &ProviderIdentity) {
        eprintln!("{} fetching {identity}", style("→").cyan());
    }

    async fn install_reused(&self, identity: &ProviderIdentity) {
        eprintln!("{} cached {identity}", style("·").dim());
    }

    async fn install_finished(&self, identity: &ProviderIdentity) {
        eprintln!("{} installed {identity}", style("✓").green());
    }

    async fn install_failed(&self, identity: &ProviderIdentity, message: &str) {
        eprintln!("{} {identity}: {message}", style("✗").red());
    }
}
