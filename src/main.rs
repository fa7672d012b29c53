use clap::Parser;
use quote_consolidator::cli::Cli;
use quote_consolidator::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (mut config, found) = Config::load_or_default(&cli.config)?;
    cli.run.apply_overrides(&mut config);
    config.validate()?;

    // Initialize telemetry
    let _telemetry = quote_consolidator::telemetry::init_telemetry(&config.telemetry)?;
    if !found {
        tracing::warn!(path = %cli.config, "Config file not found, using defaults");
    }

    cli.run.execute(&config).await
}
