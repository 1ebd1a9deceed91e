use anyhow::Context;
use clap::Parser;
use infinity_swap::cli::Cli;
use infinity_swap::core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    dotenv::dotenv().ok();

    // Parse CLI arguments before any configuration or network work
    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    infinity_swap::cli::commands::swap::execute(cli, config)
        .await
        .context("swap failed")?;

    Ok(())
}
