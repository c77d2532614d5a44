// src/main.rs

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use prospector::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    prospector::cli::run(cli).await
}
