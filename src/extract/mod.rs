use anyhow::{Context, Result};
use clap::Args;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::Campaign;

pub mod affiliation;
pub mod record;
pub mod resolver;

pub use affiliation::AffiliationField;
pub use record::{
    extract_rows, parse_pubmed_xml, ExtractError, PubmedRecord, RecordAuthor, DOI_NOT_FOUND,
    MALFORMED_RECORD,
};

#[derive(Args)]
pub struct ExtractArgs {
    /// Working directory (reads pubmed_records.xml and campaign.json)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "leads.csv")]
    pub output: PathBuf,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("connexon_leads=info".parse().unwrap()),
        )
        .try_init();

    let campaign_path = args.input.join("campaign.json");
    let campaign_file = File::open(&campaign_path)
        .with_context(|| format!("Failed to open {}", campaign_path.display()))?;
    let campaign: Campaign =
        serde_json::from_reader(campaign_file).context("Failed to parse campaign.json")?;

    let records_path = args.input.join("pubmed_records.xml");
    let xml = fs::read_to_string(&records_path)
        .with_context(|| format!("Failed to read {}", records_path.display()))?;

    let records = parse_pubmed_xml(&xml)?;
    info!("Parsed {} PubMed records", records.len());

    let (rows, skipped) = extract_rows(&records, &campaign);

    let output_dir = args.output.parent().unwrap_or(Path::new("."));
    let skipped_path = output_dir.join("skipped_records.jsonl");
    let mut skipped_writer = BufWriter::new(
        File::create(&skipped_path).context("Failed to create skipped records file")?,
    );
    for skip in &skipped {
        writeln!(skipped_writer, "{}", serde_json::to_string(skip)?)?;
    }
    skipped_writer.flush()?;

    let mut csv_writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    if rows.is_empty() {
        // serialize() only emits the header alongside a first row; the header
        // is part of the output contract even for an empty run.
        csv_writer.write_record(crate::CSV_HEADERS)?;
    }
    for row in &rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().context("Failed to flush CSV")?;

    info!(
        "Wrote {} lead rows ({} records skipped)",
        rows.len(),
        skipped.len()
    );
    info!("Output: {}", args.output.display());

    Ok(())
}
