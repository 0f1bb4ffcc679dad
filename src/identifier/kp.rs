use url::Url;

use crate::item::KpId;

pub const DEFAULT_CATALOG_HOST: &str = "www.kinopoisk.ru";

/// Is `host` the catalog host, with or without the `www.` label?
fn is_catalog_host(host: &str, catalog_host: &str) -> bool {
    let bare = |h: &str| {
        let h = h.trim_end_matches('.').to_ascii_lowercase();
        h.strip_prefix("www.").unwrap_or(&h).to_string()
    };
    bare(host) == bare(catalog_host)
}

/// Parse an absolute (or protocol-relative) link and return it when it points at the catalog.
pub fn catalog_link(href: &str, catalog_host: &str) -> Option<Url> {
    let href = href.trim();
    let url = match Url::parse(href) {
        Ok(u) => u,
        Err(_) if href.starts_with("//") => Url::parse(&format!("https:{href}")).ok()?,
        Err(_) => return None,
    };
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    if !is_catalog_host(url.host_str()?, catalog_host) {
        return None;
    }
    Some(url)
}

/// Identifier candidate of a catalog link: the last path segment once trailing slashes are
/// stripped. This is the raw text; it may still fail to parse as an id.
pub fn trailing_segment(url: &Url) -> &str {
    let path = url.path().trim_end_matches('/');
    path.rsplit('/').next().unwrap_or_default()
}

/// Parse a catalog id from a bare number or a catalog URL
/// (e.g. `https://www.kinopoisk.ru/film/841176/`).
pub fn parse(input: &str, catalog_host: &str) -> Option<KpId> {
    let input = input.trim();
    if let Ok(id) = input.parse() {
        return Some(id);
    }
    let url = catalog_link(input, catalog_host)?;
    trailing_segment(&url).parse().ok()
}
