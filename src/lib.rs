use serde::{Deserialize, Serialize};

pub mod discover;
pub mod extract;
pub mod fetch;

/// Static campaign metadata for one newsletter issue, shared by every row
/// produced from it. Written by `discover`, read back by `extract`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub lead_source: String,
    pub specific_lead_source: String,
    pub search_term: String,
    pub archive_url: String,
}

impl Campaign {
    pub fn new(specific_lead_source: String, archive_url: String) -> Self {
        Self {
            lead_source: "Connexon".to_string(),
            search_term: format!("Connexon; {}", specific_lead_source),
            specific_lead_source,
            archive_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmidLookup {
    pub title: String,
    pub pmid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmidLookupFailed {
    pub title: String,
    pub error: String,
}

/// A record dropped by `extract`, with the reason it was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub pmid: String,
    pub title: String,
    pub error: String,
}

/// City/state/country/postal parts pulled from the tail of an affiliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// CSV column order for the downstream lead-import tooling. Must stay in
/// lock-step with the serde renames on [`LeadRow`].
pub const CSV_HEADERS: [&str; 13] = [
    "Last Name",
    "First Name",
    "Email",
    "Company",
    "Department",
    "City",
    "State",
    "Country",
    "Postal Code",
    "Lead Source",
    "Publication Date",
    "Publication Link",
    "Publication Title",
];

/// One output row, one per (record, author) pair. Field order and the serde
/// names are the CSV column contract for the downstream lead-import tooling;
/// `search_term` and `archive_url` ride along but stay out of the CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRow {
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "Lead Source")]
    pub lead_source: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Publication Link")]
    pub publication_link: String,
    #[serde(rename = "Publication Title")]
    pub publication_title: String,
    #[serde(skip)]
    pub search_term: String,
    #[serde(skip)]
    pub archive_url: String,
}
