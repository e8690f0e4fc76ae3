use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::{PmidLookup, PmidLookupFailed};

mod client;
pub use client::EntrezClient;

const NCBI_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

#[derive(Args)]
pub struct FetchArgs {
    /// Working directory (reads publication_titles.json)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Working directory (writes pmid_lookups.jsonl and pubmed_records.xml)
    #[arg(short, long)]
    pub output: PathBuf,

    /// E-utilities base URL
    #[arg(short = 'u', long, default_value = NCBI_EUTILS_URL)]
    pub base_url: String,

    /// Contact email forwarded to NCBI
    #[arg(short, long)]
    pub email: Option<String>,

    /// NCBI API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// PMID substituted for titles with no search hit (default: skip them)
    #[arg(long)]
    pub fallback_pmid: Option<String>,
}

pub fn run(args: FetchArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("connexon_leads=info".parse().unwrap()),
        )
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: FetchArgs) -> Result<()> {
    fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let titles_path = args.input.join("publication_titles.json");
    let titles_file = File::open(&titles_path)
        .with_context(|| format!("Failed to open {}", titles_path.display()))?;
    let titles: Vec<String> = serde_json::from_reader(titles_file)
        .context("Failed to parse publication_titles.json")?;

    info!("Loaded {} publication titles", titles.len());

    let client = EntrezClient::new(
        args.base_url.clone(),
        args.timeout,
        args.email.clone(),
        args.api_key.clone(),
    );

    let lookups_path = args.output.join("pmid_lookups.jsonl");
    let failed_path = args.output.join("pmid_lookups.failed.jsonl");
    let mut lookups_writer = BufWriter::new(
        File::create(&lookups_path).context("Failed to create lookups file")?,
    );
    let mut failed_writer = BufWriter::new(
        File::create(&failed_path).context("Failed to create failed file")?,
    );

    let pb = ProgressBar::new(titles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut pmids: Vec<String> = Vec::with_capacity(titles.len());

    for title in &titles {
        match client.esearch(title).await {
            Ok(Some(pmid)) => {
                let lookup = PmidLookup {
                    title: title.clone(),
                    pmid: pmid.clone(),
                };
                writeln!(lookups_writer, "{}", serde_json::to_string(&lookup)?)?;
                pmids.push(pmid);
            }
            Ok(None) => {
                warn!("No PubMed match for title: {}", title);
                let failed = PmidLookupFailed {
                    title: title.clone(),
                    error: "No match found".to_string(),
                };
                writeln!(failed_writer, "{}", serde_json::to_string(&failed)?)?;

                if let Some(fallback) = &args.fallback_pmid {
                    // Substituted records can attribute the wrong paper; make
                    // the operator see it.
                    warn!(
                        "Substituting fallback PMID {} for unmatched title; verify attribution",
                        fallback
                    );
                    let lookup = PmidLookup {
                        title: title.clone(),
                        pmid: fallback.clone(),
                    };
                    writeln!(lookups_writer, "{}", serde_json::to_string(&lookup)?)?;
                    pmids.push(fallback.clone());
                }
            }
            Err(e) => {
                warn!("PubMed search failed for title: {}: {}", title, e);
                let failed = PmidLookupFailed {
                    title: title.clone(),
                    error: e.to_string(),
                };
                writeln!(failed_writer, "{}", serde_json::to_string(&failed)?)?;
            }
        }
        pb.inc(1);
    }

    pb.finish();
    lookups_writer.flush().context("Failed to flush lookups file")?;
    failed_writer.flush().context("Failed to flush failed file")?;

    if pmids.is_empty() {
        warn!("No PMIDs resolved; skipping record fetch");
        return Ok(());
    }

    let xml = client
        .efetch(&pmids)
        .await
        .context("Failed to fetch PubMed records")?;

    let records_path = args.output.join("pubmed_records.xml");
    fs::write(&records_path, xml)
        .with_context(|| format!("Failed to write {}", records_path.display()))?;

    info!("Fetched {} records", pmids.len());
    info!("Output: {}", args.output.display());

    Ok(())
}
