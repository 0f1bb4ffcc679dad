use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    item::{CatalogRecord, Release},
    matcher::{self, normalize_title},
};

/// Fallback search stages, loosest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Title, alternate names and year.
    WithYear,
    TitleAndNames,
    NamesOnly,
    TitleOnly,
}

type QueryFn = fn(&Release) -> Option<String>;
type FilterFn = fn(&Release, &CatalogRecord) -> bool;

struct SearchStage {
    stage: Stage,
    query: QueryFn,
    keep: FilterFn,
}

/// Stages to run, in order.
///
/// NOTE: Ordering is important here. The first stage whose filtered results are non-empty ends
/// the cascade, even when the final similarity check rejects all of them.
static STAGES: &[SearchStage] = &[
    SearchStage {
        stage: Stage::WithYear,
        query: with_year_query,
        keep: matcher::is_match,
    },
    SearchStage {
        stage: Stage::TitleAndNames,
        query: title_and_names_query,
        keep: matcher::within_year_band,
    },
    SearchStage {
        stage: Stage::NamesOnly,
        query: names_query,
        keep: matcher::within_year_band,
    },
    SearchStage {
        stage: Stage::TitleOnly,
        query: title_query,
        keep: matcher::within_year_band,
    },
];

fn with_year_query(r: &Release) -> Option<String> {
    let year = r.year?;
    Some(format!("{} {} {}", r.title, r.joined_names(), year))
}

fn title_and_names_query(r: &Release) -> Option<String> {
    Some(format!("{} {}", r.title, r.joined_names()))
}

fn names_query(r: &Release) -> Option<String> {
    Some(r.joined_names())
}

fn title_query(r: &Release) -> Option<String> {
    Some(r.title.clone())
}

/// A record found by search and the stage that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub record: CatalogRecord,
    pub stage: Stage,
}

fn search_or_empty<C: Catalog + ?Sized>(catalog: &C, query: &str) -> Vec<CatalogRecord> {
    match catalog.search(query) {
        Ok(list) => list,
        Err(e) => {
            warn!(query, error = %e, "catalog search failed");
            Vec::new()
        }
    }
}

/// Find a release by progressively looser catalog searches.
///
/// Search order is authoritative: the first candidate surviving the filters wins.
pub fn search_fallback<C: Catalog + ?Sized>(release: &Release, catalog: &C) -> Option<SearchHit> {
    let mut reached = None;
    for s in STAGES {
        let Some(query) = (s.query)(release).filter(|q| !q.trim().is_empty()) else {
            continue;
        };
        let kept: Vec<CatalogRecord> = search_or_empty(catalog, &query)
            .into_iter()
            .filter(|c| (s.keep)(release, c))
            .collect();
        debug!(stage = ?s.stage, query, kept = kept.len(), "search stage");
        if !kept.is_empty() {
            reached = Some((s.stage, kept));
            break;
        }
    }

    let (stage, kept) = reached?;
    let record = kept.into_iter().find(|c| matcher::is_match(release, c))?;
    if !titles_look_equal(release, &record) {
        debug!(
            release = %release.title,
            names = %release.joined_names(),
            record = %record.name_ru,
            record_en = %record.name_en,
            "matched record titled differently"
        );
    }
    Some(SearchHit { record, stage })
}

fn titles_look_equal(release: &Release, record: &CatalogRecord) -> bool {
    normalize_title(&release.title) == normalize_title(&record.name_ru)
        && (release.names.is_empty()
            || normalize_title(&release.joined_names())
                == normalize_title(&format!("{}{}", record.name_en, record.name_original)))
}
