use thiserror::Error;

use crate::item::KpId;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the catalog and page adapters.
///
/// Resolution itself never fails: every variant here is caught at the call site inside the
/// resolver and turned into "no result for this strategy".
#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed catalog response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("catalog has no record {0}")]
    NotFound(KpId),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
