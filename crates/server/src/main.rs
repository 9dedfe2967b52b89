use animal_rescue_mcp::config::{Args, Settings};
use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    animal_rescue_mcp::telemetry::init(&args.log_level, args.log_format);

    let settings = Settings::resolve(&args).context("resolve settings")?;
    tracing::debug!(?settings, "resolved settings");

    animal_rescue_mcp::run(settings)
        .await
        .context("animal rescue MCP server")
}
