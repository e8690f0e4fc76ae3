use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Comment marker the newsletter template leaves next to each cited paper.
const TITLE_MARKER: &str = "#PUBLICATIONS TITLE";

static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").unwrap());

/// Extract cited publication titles from an issue page.
///
/// The Connexon templates tag each title with a `font` element carrying both
/// `face` and `size` attributes and an embedded `#PUBLICATIONS TITLE` comment,
/// so selection is by attribute presence rather than class.
pub fn publication_titles(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("[face][size]").unwrap();

    document
        .select(&selector)
        .filter(|el| el.inner_html().contains(TITLE_MARKER))
        .map(|el| {
            el.text()
                .collect::<String>()
                .trim_start_matches('\n')
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
        .collect()
}

/// Derive the issue name from the page `<title>`.
///
/// Issue pages title themselves `"Volume 6.45 - Mesenchymal Cell News - ..."`;
/// the result is `"Mesenchymal Cell News 6.45"`. Returns `None` when the title
/// does not follow that layout.
pub fn specific_lead_source(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").unwrap();
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();

    let mut parts = title.split(" - ");
    let volume_part = parts.next()?;
    let issue_name = parts.next()?.trim();
    let volume = VOLUME_RE.find(volume_part)?.as_str();

    Some(format!("{} {}", issue_name, volume))
}
