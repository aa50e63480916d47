mod cli;
mod config;
mod main_lib;

use clap::Parser;
use cli::Cli;
use config::Config;
use main_lib::{build_service, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_format);
    let cli = Cli::parse();
    let service = build_service(&config)?;

    if cli.wait && !service.wait_until_ready().await {
        anyhow::bail!("Geocoder at {} is not ready", config.pelias_host);
    }

    let document = run(&service, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
