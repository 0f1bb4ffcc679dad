use std::sync::Arc;

use crate::{
    error::Result,
    item::{CatalogRecord, KpId, Release},
};

pub mod kp;
pub mod page;

/// Remote film catalog.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    /// Free-text search. The order of the returned records is the service's relevance order.
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>>;
    fn fetch_record(&self, id: KpId) -> Result<CatalogRecord>;
}

/// Source of release detail pages.
#[cfg_attr(test, mockall::automock)]
pub trait PageSource {
    fn fetch_detail_page(&self, release: &Release) -> Result<String>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>> {
        (**self).search(query)
    }

    fn fetch_record(&self, id: KpId) -> Result<CatalogRecord> {
        (**self).fetch_record(id)
    }
}

impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>> {
        (**self).search(query)
    }

    fn fetch_record(&self, id: KpId) -> Result<CatalogRecord> {
        (**self).fetch_record(id)
    }
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch_detail_page(&self, release: &Release) -> Result<String> {
        (**self).fetch_detail_page(release)
    }
}

impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    fn fetch_detail_page(&self, release: &Release) -> Result<String> {
        (**self).fetch_detail_page(release)
    }
}
