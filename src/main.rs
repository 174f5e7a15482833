pub mod types;
pub mod config;
pub mod data;
pub mod geodata;
pub mod aggregate;
pub mod series;
pub mod export;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the store feed, aggregate it, and write static series files
    Build {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Fetch, aggregate, and serve the drill-down API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { config } => {
            println!("Building marker series with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let registry = load_registry(&app_config).await?;

            export::write_series(&app_config.output, &registry)?;

            println!("Build complete!");
        }
        Commands::Serve { config } => {
            println!("Serving marker series with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let registry = load_registry(&app_config).await?;

            server::start_server(app_config, registry).await?;
        }
    }

    Ok(())
}

async fn load_registry(config: &config::AppConfig) -> anyhow::Result<aggregate::Registry> {
    // 1. Load store records
    let records = data::load_stores(&config.source).await?;

    // 2. Load state polygon atlas
    let atlas = geodata::load_atlas(&config.geodata)?;

    // 3. Aggregate into the nation -> state -> city hierarchy
    let registry = aggregate::build_registry(&records, &atlas);
    if registry.dropped() > 0 {
        tracing::warn!(
            dropped = registry.dropped(),
            "records skipped: state code matched no polygon"
        );
    }
    println!(
        "Aggregated {} records into {} regions",
        records.len() as u64 - registry.dropped(),
        registry.len()
    );

    Ok(registry)
}
