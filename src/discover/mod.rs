use anyhow::{Context, Result};
use clap::Args;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::Campaign;

mod newsletter;
pub use newsletter::{publication_titles, specific_lead_source};

// The newsletter host 403s requests without a browser User-Agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Args)]
pub struct DiscoverArgs {
    /// URL of the newsletter issue page
    #[arg(short = 'u', long)]
    pub url: String,

    /// Working directory for output files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,
}

pub fn run(args: DiscoverArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("connexon_leads=info".parse().unwrap()),
        )
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: DiscoverArgs) -> Result<()> {
    fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    if !args.url.contains("/issue/") {
        warn!("URL does not look like a Connexon issue page: {}", args.url);
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = client
        .get(&args.url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", args.url))?;
    let html = response.error_for_status()?.text().await?;

    let titles = publication_titles(&html);
    if titles.is_empty() {
        warn!("No publication titles found on {}", args.url);
    }
    info!("Found {} publication titles", titles.len());

    let specific = match specific_lead_source(&html) {
        Some(s) => s,
        None => {
            warn!("Could not determine issue name from the page title");
            "Unknown issue".to_string()
        }
    };
    let campaign = Campaign::new(specific, args.url.clone());

    let titles_path = args.output.join("publication_titles.json");
    serde_json::to_writer_pretty(File::create(&titles_path)?, &titles)
        .context("Failed to write publication_titles.json")?;

    let campaign_path = args.output.join("campaign.json");
    serde_json::to_writer_pretty(File::create(&campaign_path)?, &campaign)
        .context("Failed to write campaign.json")?;

    info!("Output: {}", args.output.display());

    Ok(())
}
