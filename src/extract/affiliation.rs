use once_cell::sync::Lazy;
use regex::Regex;

use crate::Locality;

/// Derived fields pulled out of a free-text affiliation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffiliationField {
    Company,
    Department,
    Email,
}

// An institution phrase headed by "University", "Institute" or "ETH",
// keeping the capitalized words around the head noun. Word runs stop at
// punctuation, so a match never crosses a comma.
static COMPANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\w ]*Universit(?:y|aria)[\w ]*|[\w '’]*Institute?[\w '’]*|[\w ]*ETH[\w ]*",
    )
    .unwrap()
});

static DEPARTMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\w ]*Department[\w ]*|[\w ]*Laboratory[A-Z ]*|[\w ]*Cent(?:er|re)[\w ]*|[\w ]*Service[A-Z ]*",
    )
    .unwrap()
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}").unwrap()
});

// "CT" or "CT 06520" or "CT 06520-8051" style state/postal tail component.
static STATE_POSTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2})(?:\s+([A-Za-z0-9][A-Za-z0-9 -]{2,9}))?$").unwrap());

/// Pull one derived field out of an affiliation string.
///
/// Case-insensitive, first match wins, and only the first occurrence is
/// reported even when a string names several institutions. No match is an
/// empty string, never an error.
pub fn extract(affiliation: &str, field: AffiliationField) -> String {
    let re = match field {
        AffiliationField::Company => &COMPANY_RE,
        AffiliationField::Department => &DEPARTMENT_RE,
        AffiliationField::Email => &EMAIL_RE,
    };

    re.find(affiliation)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Best-effort city/state/country/postal extraction from the trailing
/// comma-separated components of the first `;`-separated affiliation segment,
/// e.g. `"..., New Haven, CT 06520, USA"`. Unrecognized layouts leave the
/// fields empty.
pub fn parse_locality(affiliation: &str) -> Locality {
    let segment = affiliation.split(';').next().unwrap_or("");
    let parts: Vec<&str> = segment
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() < 3 {
        return Locality::default();
    }

    let country = clean_country(parts[parts.len() - 1]);

    match STATE_POSTAL_RE.captures(parts[parts.len() - 2]) {
        Some(caps) => Locality {
            city: parts[parts.len() - 3].to_string(),
            state: caps[1].to_string(),
            postal_code: caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            country,
        },
        None => Locality {
            country,
            ..Locality::default()
        },
    }
}

/// The country component often trails a period and sometimes an embedded
/// contact email ("USA. Electronic address: jane@yale.edu."); keep only the
/// country name itself.
fn clean_country(part: &str) -> String {
    let head = part.split('.').next().unwrap_or(part).trim();
    if head.is_empty() {
        part.trim_end_matches('.').trim().to_string()
    } else {
        head.to_string()
    }
}
