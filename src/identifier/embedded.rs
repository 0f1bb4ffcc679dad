use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    catalog::{Catalog, PageSource},
    identifier::kp::{catalog_link, trailing_segment},
    item::{CatalogRecord, KnownRecords, KpId, Release},
};

static ANCHOR_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<a\b[^>]*>"#).unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    // key="value", key='value' or key=value
    Regex::new(r#"(?i)([a-zA-Z_:\-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

fn collect_hrefs(html: &str) -> impl Iterator<Item = String> + '_ {
    ANCHOR_TAG_RE
        .find_iter(html)
        .filter_map(|m| anchor_href(m.as_str()))
}

fn anchor_href(tag: &str) -> Option<String> {
    ATTR_RE.captures_iter(tag).find_map(|cap| {
        if !cap[1].eq_ignore_ascii_case("href") {
            return None;
        }
        cap.get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| decode_amp(m.as_str()))
    })
}

fn decode_amp(s: &str) -> String {
    s.replace("&amp;", "&")
}

/// Raw identifier text of the first catalog link on the page.
pub fn embedded_id_text(html: &str, catalog_host: &str) -> Option<String> {
    collect_hrefs(html)
        .find_map(|href| catalog_link(&href, catalog_host))
        .map(|url| trailing_segment(&url).to_string())
}

/// Catalog id embedded in a release page, if the first catalog link ends in a number.
pub fn extract_id(html: &str, catalog_host: &str) -> Option<KpId> {
    let text = embedded_id_text(html, catalog_host)?;
    match text.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!(segment = %text, "catalog link does not end in an id");
            None
        }
    }
}

/// Resolve a release through the catalog id linked from its detail page.
///
/// Records already in `known` are returned without touching the network; otherwise the catalog
/// is asked once. Any failure along the way yields `None`.
pub fn find_by_embedded_id<P, C>(
    release: &Release,
    pages: &P,
    catalog: &C,
    known: &KnownRecords,
    catalog_host: &str,
) -> Option<CatalogRecord>
where
    P: PageSource + ?Sized,
    C: Catalog + ?Sized,
{
    let body = match pages.fetch_detail_page(release) {
        Ok(body) => body,
        Err(e) => {
            debug!(link = %release.link, error = %e, "detail page unavailable");
            return None;
        }
    };

    let id = extract_id(&body, catalog_host)?;

    if let Some(record) = known.get(id) {
        debug!(%id, "embedded id found among known records");
        return Some(record.clone());
    }

    match catalog.fetch_record(id) {
        Ok(record) if record.id == id => Some(record),
        Ok(record) => {
            warn!(%id, got = %record.id, "catalog returned a different record");
            None
        }
        Err(e) => {
            debug!(%id, error = %e, "catalog record unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{MockCatalog, MockPageSource},
        error::Error,
        identifier::kp::DEFAULT_CATALOG_HOST as HOST,
    };

    const PAGE: &str = r#"
        <html><body>
        <a href="/browse/1">Раздел</a>
        <table id="details">
          <tr><td>Описание</td><td>
            <a href='https://www.imdb.com/title/tt1270797/'>IMDb</a>
            <a class="kp" href="https://www.kinopoisk.ru/film/841176/" target="_blank">КиноПоиск</a>
            <a href="https://www.kinopoisk.ru/film/1/">Другой</a>
          </td></tr>
        </table>
        </body></html>"#;

    fn venom() -> Release {
        Release {
            title: "Venom".into(),
            names: vec![],
            year: Some(2018),
            link: "http://tracker/torrent/1".into(),
        }
    }

    fn record(id: u64) -> CatalogRecord {
        CatalogRecord {
            id: KpId(id),
            name_ru: "Веном".into(),
            name_en: "Venom".into(),
            name_original: "Venom".into(),
            year: Some(2018),
            web_url: format!("https://www.kinopoisk.ru/film/{id}/"),
        }
    }

    fn pages_with(body: &'static str) -> MockPageSource {
        let mut pages = MockPageSource::new();
        pages
            .expect_fetch_detail_page()
            .returning(move |_| Ok(body.to_string()));
        pages
    }

    #[test]
    fn extract_takes_first_catalog_link() {
        assert_eq!(extract_id(PAGE, HOST), Some(KpId(841176)));
    }

    #[test]
    fn extract_handles_unquoted_and_entity_hrefs() {
        let html = "<A HREF=https://kinopoisk.ru/film/42>kp</A>";
        assert_eq!(extract_id(html, HOST), Some(KpId(42)));
        let html = r#"<a href="https://www.kinopoisk.ru/film/43/?a=1&amp;b=2">kp</a>"#;
        assert_eq!(extract_id(html, HOST), Some(KpId(43)));
    }

    #[test]
    fn extract_rejects_non_numeric_or_missing_links() {
        let html = r#"<a href="https://www.kinopoisk.ru/name/keanu/">kp</a>"#;
        assert_eq!(embedded_id_text(html, HOST).as_deref(), Some("keanu"));
        assert_eq!(extract_id(html, HOST), None);
        assert_eq!(extract_id("<p>no links</p>", HOST), None);
        assert_eq!(extract_id(r#"<a href="/film/1/">relative</a>"#, HOST), None);
    }

    #[test]
    fn known_record_avoids_remote_fetch() {
        let pages = pages_with(PAGE);
        let mut catalog = MockCatalog::new();
        catalog.expect_fetch_record().times(0);
        let known: KnownRecords = vec![record(841176)].into_iter().collect();

        let found = find_by_embedded_id(&venom(), &pages, &catalog, &known, HOST).unwrap();
        assert_eq!(found.id, KpId(841176));
    }

    #[test]
    fn unknown_id_is_fetched_once() {
        let pages = pages_with(PAGE);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_record()
            .withf(|id| *id == KpId(841176))
            .times(1)
            .returning(|id| Ok(record(id.0)));

        let found =
            find_by_embedded_id(&venom(), &pages, &catalog, &KnownRecords::default(), HOST)
                .unwrap();
        assert_eq!(found.id, KpId(841176));
    }

    #[test]
    fn mismatched_remote_record_is_discarded() {
        let pages = pages_with(PAGE);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_record()
            .times(1)
            .returning(|_| Ok(record(7)));

        assert!(
            find_by_embedded_id(&venom(), &pages, &catalog, &KnownRecords::default(), HOST)
                .is_none()
        );
    }

    #[test]
    fn page_or_fetch_errors_yield_none() {
        let mut pages = MockPageSource::new();
        pages
            .expect_fetch_detail_page()
            .returning(|_| Err(Error::NotFound(KpId(0))));
        let mut catalog = MockCatalog::new();
        catalog.expect_fetch_record().times(0);
        assert!(
            find_by_embedded_id(&venom(), &pages, &catalog, &KnownRecords::default(), HOST)
                .is_none()
        );

        let pages = pages_with(PAGE);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_record()
            .times(1)
            .returning(|id| Err(Error::NotFound(id)));
        assert!(
            find_by_embedded_id(&venom(), &pages, &catalog, &KnownRecords::default(), HOST)
                .is_none()
        );
    }
}
