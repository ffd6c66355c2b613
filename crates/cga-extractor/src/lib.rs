//! CGA Extractor - Entity extraction pipeline
//!
//! Sends page text to a language-analysis service for entity/salience
//! extraction and folds the raw result into one normalized
//! `PageEntityTable` per page.

pub mod google;
pub mod normalize;

pub use google::GoogleNlpClient;
pub use normalize::normalize_entities;
