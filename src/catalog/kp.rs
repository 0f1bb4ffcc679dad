use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    item::{CatalogRecord, KpId},
};

pub const DEFAULT_API_BASE: &str = "https://kinopoiskapiunofficial.tech";

#[derive(Debug, Clone)]
pub struct KpClientConfig {
    pub base_url: String,
    /// Sent as `X-API-KEY` when present.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub global_timeout: Duration,
}

impl Default for KpClientConfig {
    fn default() -> Self {
        KpClientConfig {
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(5),
            global_timeout: Duration::from_secs(15),
        }
    }
}

/// Blocking client for the unofficial kinopoisk API.
pub struct KpClient {
    agent: ureq::Agent,
    base_url: Url,
    api_key: Option<String>,
}

impl KpClient {
    pub fn new(config: KpClientConfig) -> Result<Self> {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(config.connect_timeout))
            .timeout_global(Some(config.global_timeout))
            .build();
        Ok(KpClient {
            agent: ureq::Agent::new_with_config(cfg),
            base_url: Url::parse(config.base_url.trim_end_matches('/'))?,
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    fn get_json(&self, url: &Url, query: Option<(&str, &str)>) -> Result<String> {
        let mut req = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("X-API-KEY", key);
        }
        if let Some((k, v)) = query {
            req = req.query(k, v);
        }
        let body = req.call()?.into_body().read_to_string()?;
        Ok(body)
    }
}

impl Catalog for KpClient {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>> {
        let url = self.endpoint("/api/v2.1/films/search-by-keyword")?;
        let body = self.get_json(&url, Some(("keyword", query)))?;
        let records = parse_search(&body)?;
        debug!(query, found = records.len(), "catalog search");
        Ok(records)
    }

    fn fetch_record(&self, id: KpId) -> Result<CatalogRecord> {
        let url = self.endpoint(&format!("/api/v2.2/films/{id}"))?;
        let body = match self.get_json(&url, None) {
            Err(Error::Http(ureq::Error::StatusCode(404))) => return Err(Error::NotFound(id)),
            other => other?,
        };
        parse_record(&body)
    }
}

pub fn film_url(id: KpId) -> String {
    format!("https://www.kinopoisk.ru/film/{id}/")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    films: Vec<SearchFilm>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFilm {
    film_id: u64,
    name_ru: Option<String>,
    name_en: Option<String>,
    year: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmDetail {
    kinopoisk_id: u64,
    name_ru: Option<String>,
    name_en: Option<String>,
    name_original: Option<String>,
    year: Option<u16>,
    web_url: Option<String>,
}

/// Search results carry the year as text, sometimes a range ("2018-2020") or "null".
fn leading_year(s: &str) -> Option<u16> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{4})").unwrap());
    YEAR_RE.captures(s)?.get(1)?.as_str().parse().ok()
}

fn parse_search(body: &str) -> Result<Vec<CatalogRecord>> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    Ok(resp
        .films
        .into_iter()
        .map(|f| {
            let id = KpId(f.film_id);
            CatalogRecord {
                id,
                name_ru: f.name_ru.unwrap_or_default(),
                name_en: f.name_en.unwrap_or_default(),
                name_original: String::new(),
                year: f.year.as_deref().and_then(leading_year),
                web_url: film_url(id),
            }
        })
        .collect())
}

fn parse_record(body: &str) -> Result<CatalogRecord> {
    let d: FilmDetail = serde_json::from_str(body)?;
    let id = KpId(d.kinopoisk_id);
    Ok(CatalogRecord {
        id,
        name_ru: d.name_ru.unwrap_or_default(),
        name_en: d.name_en.unwrap_or_default(),
        name_original: d.name_original.unwrap_or_default(),
        year: d.year,
        web_url: d.web_url.unwrap_or_else(|| film_url(id)),
    })
}
