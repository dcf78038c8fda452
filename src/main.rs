use clap::Parser;
use tracing_subscriber::EnvFilter;

use pve_portal_api::cli::{self, Cli};
use pve_portal_api::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, SECRET_KEY etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match config::config() {
        Ok(config) => cli::run(cli, config.clone()).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
