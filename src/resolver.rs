use std::sync::{Mutex, PoisonError};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use crate::{
    catalog::{Catalog, PageSource},
    error::Result,
    identifier::{embedded::find_by_embedded_id, kp::DEFAULT_CATALOG_HOST},
    item::{KnownRecords, MatchSource, Release, Resolution, ResolutionResult},
    search::search_fallback,
};

/// Releases resolved at the same time.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub concurrency: usize,
    /// Host whose links on release pages carry catalog ids.
    pub catalog_host: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            concurrency: DEFAULT_CONCURRENCY,
            catalog_host: DEFAULT_CATALOG_HOST.to_string(),
        }
    }
}

/// Receives releases that no strategy could resolve.
pub trait UnresolvedSink: Send + Sync {
    fn unresolved(&self, release: &Release);
}

/// One line describing an unresolved release: title, names, year and link.
pub fn format_unresolved(release: &Release) -> String {
    let year = release
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{} | {} | {} | {}",
        release.title,
        release.joined_names(),
        year,
        release.link
    )
}

/// Writes unresolved releases to the log for someone to look at by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl UnresolvedSink for LogSink {
    fn unresolved(&self, release: &Release) {
        warn!("not found in catalog: {}", format_unresolved(release));
    }
}

/// Resolves batches of releases against the catalog.
pub struct Resolver<P, C> {
    pages: P,
    catalog: C,
    catalog_host: String,
    sink: Box<dyn UnresolvedSink>,
    progress: Option<ProgressBar>,
    pool: rayon::ThreadPool,
}

impl<P, C> Resolver<P, C>
where
    P: PageSource + Sync,
    C: Catalog + Sync,
{
    pub fn new(pages: P, catalog: C, config: ResolverConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency.max(1))
            .thread_name(|idx| format!("kp-resolver-{idx}"))
            .build()?;
        Ok(Resolver {
            pages,
            catalog,
            catalog_host: config.catalog_host,
            sink: Box::new(LogSink),
            progress: None,
            pool,
        })
    }

    pub fn with_sink(mut self, sink: impl UnresolvedSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Tick `progress` once per finished release.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve one release: embedded id first, then fallback search.
    pub fn resolve(&self, release: &Release, known: &KnownRecords) -> Option<Resolution> {
        if let Some(record) = find_by_embedded_id(
            release,
            &self.pages,
            &self.catalog,
            known,
            &self.catalog_host,
        ) {
            return Some(Resolution {
                record,
                source: MatchSource::EmbeddedId,
            });
        }
        search_fallback(release, &self.catalog).map(|hit| Resolution {
            record: hit.record,
            source: MatchSource::Search(hit.stage),
        })
    }

    /// Resolve every release on the worker pool. Unresolved releases go to the sink and are
    /// left out of the result; nothing here fails the batch.
    pub fn resolve_all(&self, releases: &[Release], known: &KnownRecords) -> ResolutionResult {
        let found = Mutex::new(ResolutionResult::default());

        self.pool.install(|| {
            releases.par_iter().for_each(|release| {
                let _span = info_span!("release", title = %release.title).entered();
                match self.resolve(release, known) {
                    Some(resolution) => {
                        debug!(id = %resolution.record.id, source = ?resolution.source, "resolved");
                        found
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(release.clone(), resolution);
                    }
                    None => self.sink.unresolved(release),
                }
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
            });
        });

        let found = found.into_inner().unwrap_or_else(PoisonError::into_inner);
        let by_source = found.count_by_source();
        info!(
            total = releases.len(),
            resolved = found.len(),
            embedded = by_source.get(&MatchSource::EmbeddedId).copied().unwrap_or(0),
            known = known.len(),
            "batch resolved"
        );
        found
    }
}
