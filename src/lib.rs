//! Matching torrent releases to kinopoisk catalog records.
//!
//! A release is first looked up through a catalog link on its detail page; failing that, the
//! catalog is searched with progressively looser queries and the candidates are checked against
//! the release's titles and year.

pub mod catalog;
pub mod error;
pub mod identifier;
pub mod item;
pub mod matcher;
pub mod resolver;
pub mod search;

pub use error::{Error, Result};
pub use item::{CatalogRecord, KnownRecords, KpId, MatchSource, Release, Resolution, ResolutionResult};
pub use resolver::{LogSink, Resolver, ResolverConfig, UnresolvedSink};
