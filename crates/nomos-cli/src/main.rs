use std::process::ExitCode;

use clap::Parser;

use nomos_cli::{setup_tracing, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    cli.run().await
}
