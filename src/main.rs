use anyhow::Result;
use clap::{Parser, Subcommand};
use connexon_leads::{discover, extract, fetch};

#[derive(Parser)]
#[command(name = "connexon-leads")]
#[command(about = "Scrape Connexon newsletter issues, resolve cited papers on PubMed, emit a sales lead CSV")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a newsletter issue page and extract cited publication titles
    Discover(discover::DiscoverArgs),
    /// Look up titles on PubMed and download the matching records as XML
    Fetch(fetch::FetchArgs),
    /// Extract per-author lead rows from PubMed records and write the CSV
    Extract(extract::ExtractArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    match cli.command {
        Commands::Discover(args) => discover::run(args),
        Commands::Fetch(args) => fetch::run(args),
        Commands::Extract(args) => extract::run(args),
    }
}
