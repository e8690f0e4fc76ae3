/// Assign each author an effective affiliation.
///
/// PubMed issues commonly spell out the affiliation only on the first author
/// of a group sharing an institution and leave the field blank for the
/// co-authors that follow. A blank therefore means "same as the nearest
/// preceding author with an affiliation", not "same as the author right
/// before me", so the fold carries the last non-empty value across runs of
/// blanks. A blank before any affiliation has been seen stays blank.
pub fn resolve(raw: &[String]) -> Vec<String> {
    raw.iter()
        .scan(String::new(), |last_seen, affiliation| {
            if !affiliation.trim().is_empty() {
                *last_seen = affiliation.clone();
            }
            Some(last_seen.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_preserves_length() {
        let input = strings(&["Yale University", "", "MIT", ""]);
        assert_eq!(resolve(&input).len(), input.len());
    }

    #[test]
    fn test_resolve_carries_forward_over_runs_of_blanks() {
        let input = strings(&["Yale University", "", "", "Stanford University"]);
        assert_eq!(
            resolve(&input),
            strings(&[
                "Yale University",
                "Yale University",
                "Yale University",
                "Stanford University",
            ])
        );
    }

    #[test]
    fn test_resolve_leading_blank_stays_blank() {
        let input = strings(&["", "Yale University", ""]);
        assert_eq!(
            resolve(&input),
            strings(&["", "Yale University", "Yale University"])
        );
    }

    #[test]
    fn test_resolve_non_empty_entries_pass_through() {
        let input = strings(&["A", "B"]);
        assert_eq!(resolve(&input), strings(&["A", "B"]));
    }

    #[test]
    fn test_resolve_empty_input() {
        assert!(resolve(&[]).is_empty());
    }
}
