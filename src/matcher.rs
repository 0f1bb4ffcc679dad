//! Decides whether a release and a catalog record describe the same film.

use std::collections::BTreeSet;

use crate::item::{CatalogRecord, Release};

/// Releases and records whose years differ by this much or more are unrelated works.
pub const YEAR_TOLERANCE: u16 = 2;

/// Normalise a title for comparison: lowercase, `ё` folded to `е`, everything that is not a
/// letter or a digit dropped (spaces included).
pub fn normalize_title(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

fn title_set<'a>(titles: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    titles
        .into_iter()
        .map(normalize_title)
        .filter(|t| !t.is_empty())
        .collect()
}

fn release_titles(release: &Release) -> BTreeSet<String> {
    title_set(std::iter::once(release.title.as_str()).chain(release.names.iter().map(String::as_str)))
}

fn record_titles(record: &CatalogRecord) -> BTreeSet<String> {
    title_set(record.titles())
}

fn years_agree(a: Option<u16>, b: Option<u16>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Strict same-work test: normalised titles overlap (or neither side has any) and the years are
/// equal or unknown on either side.
pub fn is_match(release: &Release, candidate: &CatalogRecord) -> bool {
    let ours = release_titles(release);
    let theirs = record_titles(candidate);
    let titles_agree =
        (ours.is_empty() && theirs.is_empty()) || !ours.is_disjoint(&theirs);
    titles_agree && years_agree(release.year, candidate.year)
}

/// Loose test used once exact-year searching has failed: keeps candidates less than
/// [`YEAR_TOLERANCE`] years away, or whose distance cannot be computed.
pub fn within_year_band(release: &Release, candidate: &CatalogRecord) -> bool {
    match (release.year, candidate.year) {
        (Some(a), Some(b)) => a.abs_diff(b) < YEAR_TOLERANCE,
        _ => true,
    }
}
