use anyhow::Result;
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::warn;

use super::affiliation::{self, AffiliationField};
use super::resolver;
use crate::{Campaign, LeadRow, SkippedRecord};

/// Sentinel for records carrying no DOI cross-reference. Distinguishes
/// "looked but missing" from an empty field.
pub const DOI_NOT_FOUND: &str = "DOI not found";

/// Sentinel marking a row whose author entry could not be parsed.
pub const MALFORMED_RECORD: &str = "Malformed Record";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no complete publication date for PMID {pmid}")]
    DateUnresolvable { pmid: String },
}

/// Raw day/month/year strings from one of the XML date containers. A
/// container counts only when all three parts are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateParts {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl DateParts {
    fn to_date(&self) -> Option<NaiveDate> {
        let year = self.year.as_ref()?.trim().parse::<i32>().ok()?;
        let month = parse_month(self.month.as_ref()?)?;
        let day = self.day.as_ref()?.trim().parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordAuthor {
    pub last_name: String,
    pub fore_name: String,
    pub collective_name: String,
    /// Raw affiliation text; empty when the XML carries none for this author.
    pub affiliation: String,
}

/// One `<PubmedArticle>` reduced to the fields the lead rows need.
#[derive(Debug, Clone, Default)]
pub struct PubmedRecord {
    pub pmid: String,
    pub title: String,
    pub pub_date: DateParts,
    pub electronic_date: DateParts,
    pub medline_date: DateParts,
    pub doi: Option<String>,
    pub authors: Vec<RecordAuthor>,
}

/// Which date container the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DateTarget {
    Print,
    Electronic,
    Medline,
}

fn attr_value(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| String::from_utf8(a.value.into_owned()).ok())
}

/// Parse efetch `<PubmedArticleSet>` XML into records.
pub fn parse_pubmed_xml(xml: &str) -> Result<Vec<PubmedRecord>> {
    let mut records = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<PubmedRecord> = None;
    let mut author: Option<RecordAuthor> = None;
    let mut date_target: Option<DateTarget> = None;

    let mut in_pmid = false;
    let mut in_title = false;
    let mut in_year = false;
    let mut in_month = false;
    let mut in_day = false;
    let mut in_last_name = false;
    let mut in_fore_name = false;
    let mut in_collective = false;
    let mut in_affiliation = false;
    let mut in_doi = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => current = Some(PubmedRecord::default()),
                b"PMID" => in_pmid = true,
                b"ArticleTitle" => in_title = true,
                b"PubDate" => date_target = Some(DateTarget::Print),
                b"ArticleDate" => {
                    if attr_value(e, "DateType").as_deref() == Some("Electronic") {
                        date_target = Some(DateTarget::Electronic);
                    }
                }
                b"PubMedPubDate" => {
                    if attr_value(e, "PubStatus").as_deref() == Some("medline") {
                        date_target = Some(DateTarget::Medline);
                    }
                }
                b"Year" => in_year = true,
                b"Month" => in_month = true,
                b"Day" => in_day = true,
                b"Author" => author = Some(RecordAuthor::default()),
                b"LastName" => in_last_name = true,
                b"ForeName" => in_fore_name = true,
                b"CollectiveName" => in_collective = true,
                b"Affiliation" => in_affiliation = true,
                b"ArticleId" => {
                    if attr_value(e, "IdType").as_deref() == Some("doi") {
                        in_doi = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut record) = current {
                    if in_pmid && record.pmid.is_empty() {
                        record.pmid = text.clone();
                    }
                    if in_title {
                        record.title.push_str(&text);
                    }
                    if in_doi {
                        record.doi = Some(text.clone());
                    }
                    if let Some(target) = date_target {
                        let parts = match target {
                            DateTarget::Print => &mut record.pub_date,
                            DateTarget::Electronic => &mut record.electronic_date,
                            DateTarget::Medline => &mut record.medline_date,
                        };
                        if in_year {
                            parts.year = Some(text.clone());
                        }
                        if in_month {
                            parts.month = Some(text.clone());
                        }
                        if in_day {
                            parts.day = Some(text.clone());
                        }
                    }
                    if let Some(ref mut a) = author {
                        if in_last_name {
                            a.last_name = text.clone();
                        }
                        if in_fore_name {
                            a.fore_name = text.clone();
                        }
                        if in_collective {
                            a.collective_name = text.clone();
                        }
                        if in_affiliation {
                            // Some authors carry several AffiliationInfo blocks.
                            if !a.affiliation.is_empty() {
                                a.affiliation.push_str("; ");
                            }
                            a.affiliation.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"ArticleTitle" => in_title = false,
                b"PubDate" | b"ArticleDate" | b"PubMedPubDate" => date_target = None,
                b"Year" => in_year = false,
                b"Month" => in_month = false,
                b"Day" => in_day = false,
                b"LastName" => in_last_name = false,
                b"ForeName" => in_fore_name = false,
                b"CollectiveName" => in_collective = false,
                b"Affiliation" => in_affiliation = false,
                b"ArticleId" => in_doi = false,
                b"Author" => {
                    if let (Some(record), Some(a)) = (current.as_mut(), author.take()) {
                        record.authors.push(a);
                    }
                }
                b"PubmedArticle" => {
                    if let Some(record) = current.take() {
                        if record.title.is_empty() {
                            warn!("Skipping record with empty title (PMID {})", record.pmid);
                        } else {
                            records.push(record);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Record titles come with surrounding whitespace and a trailing period.
pub fn clean_title(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Month numeral ("11") or English abbreviation ("Nov"); both forms appear
/// in PubMed date containers.
fn parse_month(month: &str) -> Option<u32> {
    let m = month.trim();
    if let Ok(n) = m.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let abbrev = m.get(..3)?.to_ascii_lowercase();
    match abbrev.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Pick the publication date: print issue date first, then the Electronic
/// article date, then the medline history date. The first container with a
/// parseable day/month/year triple wins; fallbacks are never consulted once
/// an earlier container is complete.
pub fn resolve_date(record: &PubmedRecord) -> Result<NaiveDate, ExtractError> {
    [
        &record.pub_date,
        &record.electronic_date,
        &record.medline_date,
    ]
    .into_iter()
    .find_map(DateParts::to_date)
    .ok_or_else(|| ExtractError::DateUnresolvable {
        pmid: record.pmid.clone(),
    })
}

pub fn doi_link(record: &PubmedRecord) -> String {
    match &record.doi {
        Some(doi) => format!("http://dx.doi.org/{}", doi.trim()),
        None => DOI_NOT_FOUND.to_string(),
    }
}

/// Split a combined `"Mendez, Julio J"` name into last and first name,
/// keeping only the first token of the given name.
pub fn split_name(full: &str) -> (String, String) {
    match full.split_once(',') {
        Some((last, given)) => (last.trim().to_string(), first_token(given)),
        None => (full.trim().to_string(), String::new()),
    }
}

fn first_token(given: &str) -> String {
    given
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn author_name(author: &RecordAuthor) -> (String, String) {
    if !author.last_name.trim().is_empty() || !author.fore_name.trim().is_empty() {
        (
            author.last_name.trim().to_string(),
            first_token(&author.fore_name),
        )
    } else if !author.collective_name.trim().is_empty() {
        split_name(&author.collective_name)
    } else {
        (String::new(), String::new())
    }
}

/// Project one record into per-author rows. Fails only when no date
/// container yields a complete date.
pub fn record_rows(record: &PubmedRecord, campaign: &Campaign) -> Result<Vec<LeadRow>, ExtractError> {
    let date = resolve_date(record)?.format("%m/%d/%Y").to_string();
    let link = doi_link(record);
    let title = clean_title(&record.title);

    let raw_affiliations: Vec<String> = record
        .authors
        .iter()
        .map(|a| a.affiliation.clone())
        .collect();
    let resolved = resolver::resolve(&raw_affiliations);

    let rows = record
        .authors
        .iter()
        .zip(resolved.iter())
        .map(|(record_author, aff)| {
            let (last_name, first_name) = author_name(record_author);
            let malformed = last_name.is_empty() && first_name.is_empty();
            if malformed {
                warn!(
                    "Author entry with no usable name in PMID {}; marking row malformed",
                    record.pmid
                );
            }
            let locality = affiliation::parse_locality(aff);

            LeadRow {
                last_name,
                first_name,
                email: affiliation::extract(aff, AffiliationField::Email),
                company: if malformed {
                    MALFORMED_RECORD.to_string()
                } else {
                    affiliation::extract(aff, AffiliationField::Company)
                },
                department: affiliation::extract(aff, AffiliationField::Department),
                city: locality.city,
                state: locality.state,
                country: locality.country,
                postal_code: locality.postal_code,
                lead_source: campaign.lead_source.clone(),
                publication_date: date.clone(),
                publication_link: link.clone(),
                publication_title: title.clone(),
                search_term: campaign.search_term.clone(),
                archive_url: campaign.archive_url.clone(),
            }
        })
        .collect();

    Ok(rows)
}

/// Project all records, dropping those whose date cannot be resolved and
/// reporting the drops explicitly instead of swallowing them.
pub fn extract_rows(
    records: &[PubmedRecord],
    campaign: &Campaign,
) -> (Vec<LeadRow>, Vec<SkippedRecord>) {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for record in records {
        match record_rows(record, campaign) {
            Ok(mut record_rows) => rows.append(&mut record_rows),
            Err(e) => {
                warn!("Skipping record: {}", e);
                skipped.push(SkippedRecord {
                    pmid: record.pmid.clone(),
                    title: clean_title(&record.title),
                    error: e.to_string(),
                });
            }
        }
    }

    (rows, skipped)
}
