use clap::Parser;
use infrastructure::config::Config;
use presentation::cli::{Cli, CliApp};
use shared::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load()?;
    tracing::debug!(?config, "configuration loaded");
    let app = CliApp::new(config);
    app.run(cli).await
}
