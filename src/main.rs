//! triples - print the latest upload of a YouTube channel
//!
//! Resolves the channel's uploads playlist, fetches its newest item and
//! prints the title with a watch link.

use clap::Parser;
use tracing::debug;

use triples::app::App;
use triples::cli::{api_key_from_env, Cli, StartupConfig};
use triples::health::HealthCheck;
use triples::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

/// Runs the health check or the lookup selected by the arguments
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.health {
        let mut check = HealthCheck::new(api_key_from_env());
        if let Some(cache_file) = &cli.cache_file {
            check = check.with_snapshot_file(cache_file);
        }
        check.run(|line| println!("{}", line)).await?;
        return Ok(());
    }

    let config = StartupConfig::from_cli(&cli, api_key_from_env())?;
    debug!(channel = %config.channel, cache_file = %config.cache_file.display(), "starting lookup");

    let app = App::from_config(&config)?;
    let video = app.latest_video(&config.channel).await?;

    println!("{}", video.title);
    println!("Enjoy Your Content! {}", video.watch_url());

    Ok(())
}
