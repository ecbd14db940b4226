mod catalog;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mercurial-cli")]
#[command(about = "Mercurial storefront catalog tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and maintain the product catalog
    Catalog {
        #[command(subcommand)]
        command: catalog::CatalogCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog { command } => catalog::run(command).await,
    }
}
