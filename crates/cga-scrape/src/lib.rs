//! CGA Scrape - Search results and rendered pages
//!
//! Implements the `ResultRetriever` and `PageFetcher` collaborators on top of
//! the HasData scraping API, and a cache that memoizes fetched pages by URL
//! so repeated runs (or a target page that also ranks for the keyword) do
//! not pay for the same render twice.

pub mod cache;
pub mod hasdata;

pub use cache::{CacheStats, CacheStatsReport, CachedFetcher};
pub use hasdata::HasDataClient;
