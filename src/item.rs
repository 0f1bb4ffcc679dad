use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Catalog identifier of a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KpId(pub u64);

impl fmt::Display for KpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for KpId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(KpId)
    }
}

/// A torrent release waiting to be identified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Release {
    pub title: String,
    /// Alternate names, usually the original-language and English titles.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub year: Option<u16>,
    /// Detail page of the release on the tracker.
    pub link: String,
}

impl Release {
    pub fn joined_names(&self) -> String {
        self.names.join(" ")
    }
}

/// A film record from the catalog. Empty titles mean the catalog does not know them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: KpId,
    #[serde(default)]
    pub name_ru: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_original: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub web_url: String,
}

impl CatalogRecord {
    pub fn titles(&self) -> [&str; 3] {
        [&self.name_ru, &self.name_en, &self.name_original]
    }
}

/// Snapshot of records already stored locally, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct KnownRecords {
    by_id: HashMap<KpId, CatalogRecord>,
}

impl KnownRecords {
    pub fn get(&self, id: KpId) -> Option<&CatalogRecord> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<CatalogRecord> for KnownRecords {
    fn from_iter<I: IntoIterator<Item = CatalogRecord>>(iter: I) -> Self {
        KnownRecords {
            by_id: iter.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    EmbeddedId,
    Search(crate::search::Stage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub record: CatalogRecord,
    pub source: MatchSource,
}

/// Outcome of a batch: at most one record per release. Missing releases are unresolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    matches: HashMap<Release, Resolution>,
}

impl ResolutionResult {
    /// Records the first resolution for `release`; later ones are ignored.
    pub(crate) fn insert(&mut self, release: Release, resolution: Resolution) -> bool {
        match self.matches.entry(release) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(resolution);
                true
            }
        }
    }

    pub fn get(&self, release: &Release) -> Option<&CatalogRecord> {
        self.matches.get(release).map(|r| &r.record)
    }

    pub fn resolution(&self, release: &Release) -> Option<&Resolution> {
        self.matches.get(release)
    }

    pub fn contains(&self, release: &Release) -> bool {
        self.matches.contains_key(release)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Release, &Resolution)> {
        self.matches.iter()
    }

    /// Number of matches per strategy.
    pub fn count_by_source(&self) -> HashMap<MatchSource, usize> {
        let mut counts = HashMap::new();
        for r in self.matches.values() {
            *counts.entry(r.source).or_insert(0) += 1;
        }
        counts
    }
}
