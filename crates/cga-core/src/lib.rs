//! CGA Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the content gap
//! analyzer:
//! - Search result and page content records
//! - Entity tables (per page) and coverage entries (aggregated)
//! - Common error types
//! - Collaborator traits for retrieval, fetching, text extraction and
//!   entity analysis
//! - Configuration management

pub mod config;

pub use config::{
    AnalysisConfig, AppConfig, CacheConfig, ConfigError, HasDataConfig, LoggingConfig, NlpConfig,
    TieBreak,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Number of entities per competitor page considered for coverage counting
pub const DEFAULT_TOP_K: usize = 30;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for CGA operations
#[derive(Error, Debug)]
pub enum CgaError {
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CgaError {
    /// Create an upstream service error
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CgaError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CgaError>;

// ============================================================================
// Search Results and Page Content
// ============================================================================

/// One organic search result for the analyzed keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
    /// Rank on the results page (1-based)
    pub position: Option<u32>,

    /// Display source (site name)
    pub source: Option<String>,

    /// Result URL
    pub link: String,

    /// Result snippet
    pub snippet: Option<String>,
}

impl SerpResult {
    /// Create a result with only a link
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            position: None,
            source: None,
            link: link.into(),
            snippet: None,
        }
    }

    /// Set rank
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Set source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set snippet
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Readable text extracted from one result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Rank of the originating result
    pub position: Option<u32>,

    /// Page URL
    pub link: String,

    /// Article text, absent when fetching or extraction failed
    pub content: Option<String>,
}

impl PageContent {
    /// Whether the page yielded any non-blank text
    pub fn has_content(&self) -> bool {
        self.content
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }
}

// ============================================================================
// Entity Models
// ============================================================================

/// One entity as returned by the analysis service, before normalization
///
/// Both fields are optional so that malformed records can be represented
/// and dropped by the normalizer instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub salience: Option<f64>,
}

impl RawEntity {
    /// Create a well-formed raw entity
    pub fn new(name: impl Into<String>, salience: f64) -> Self {
        Self {
            name: Some(name.into()),
            salience: Some(salience),
        }
    }
}

/// Result of an entity analysis call: either entities or an error indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityResponse {
    Error {
        error: String,
    },
    Entities {
        #[serde(default)]
        entities: Vec<RawEntity>,
    },
}

impl EntityResponse {
    /// Successful response
    pub fn entities(entities: Vec<RawEntity>) -> Self {
        Self::Entities { entities }
    }

    /// Error indicator
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A unique, case-folded entity on one page with its summed salience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub salience: f64,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, salience: f64) -> Self {
        Self {
            name: name.into(),
            salience,
        }
    }
}

/// Normalized entities of a single page, tagged with the page URL
///
/// Entity names within a table are unique. The table is not modified after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntityTable {
    /// Originating page URL
    url: String,

    /// Search rank of the page (absent for the target page)
    rank: Option<u32>,

    records: Vec<EntityRecord>,
}

impl PageEntityTable {
    /// Create a table from already-normalized records
    pub fn new(url: impl Into<String>, rank: Option<u32>, records: Vec<EntityRecord>) -> Self {
        Self {
            url: url.into(),
            rank,
            records,
        }
    }

    /// Create an empty table
    pub fn empty(url: impl Into<String>, rank: Option<u32>) -> Self {
        Self::new(url, rank, Vec::new())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Search rank, `None` for the target page
    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    /// Records in insertion order
    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-folded set of entity names on this page
    pub fn name_set(&self) -> HashSet<String> {
        self.records.iter().map(|r| r.name.to_lowercase()).collect()
    }

    /// Check whether the page mentions an entity (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.records.iter().any(|r| r.name.to_lowercase() == needle)
    }
}

/// Aggregated competitor coverage of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEntry {
    /// Case-folded entity name
    pub entity: String,

    /// Number of distinct competitor pages listing the entity in their top-K
    pub count: usize,

    /// Competitor URLs contributing to `count`, in first-seen order
    pub urls: Vec<String>,

    /// True when the target page does not mention the entity
    pub missing: bool,

    /// Sum of the entity's salience over the contributing pages
    pub total_salience: f64,
}

// ============================================================================
// Traits
// ============================================================================

/// Retrieves organic search results for a keyword
#[async_trait::async_trait]
pub trait ResultRetriever: Send + Sync {
    /// Fetch results in rank order
    async fn retrieve(&self, keyword: &str) -> Result<Vec<SerpResult>>;

    /// Get retriever name for logging
    fn name(&self) -> &str;
}

/// Fetches rendered HTML for a URL
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Extracts readable article text from HTML
pub trait TextExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<String>;
}

/// Runs entity/salience analysis on plain text
#[async_trait::async_trait]
pub trait EntityAnalyzer: Send + Sync {
    /// Analyze text. Service-side failures are reported as
    /// `EntityResponse::Error`; `Err` is reserved for transport failures.
    async fn analyze(&self, text: &str) -> Result<EntityResponse>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_response_deserialize_entities() {
        let json = r#"{"entities":[{"name":"Paris","salience":0.9,"type":"LOCATION"}],"language":"en"}"#;
        let response: EntityResponse = serde_json::from_str(json).unwrap();

        assert_eq!(
            response,
            EntityResponse::entities(vec![RawEntity::new("Paris", 0.9)])
        );
    }

    #[test]
    fn test_entity_response_deserialize_error() {
        let json = r#"{"error":"No text provided"}"#;
        let response: EntityResponse = serde_json::from_str(json).unwrap();

        assert!(response.is_error());
    }

    #[test]
    fn test_entity_response_missing_entities_is_empty() {
        let response: EntityResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response, EntityResponse::entities(vec![]));
    }

    #[test]
    fn test_raw_entity_missing_fields() {
        let raw: RawEntity = serde_json::from_str(r#"{"name":"Louvre"}"#).unwrap();
        assert_eq!(raw.name.as_deref(), Some("Louvre"));
        assert!(raw.salience.is_none());
    }

    #[test]
    fn test_page_table_contains_case_insensitive() {
        let table = PageEntityTable::new(
            "https://example.com",
            Some(1),
            vec![EntityRecord::new("eiffel tower", 0.5)],
        );

        assert!(table.contains("Eiffel Tower"));
        assert!(!table.contains("louvre"));
        assert_eq!(table.len(), 1);
        assert!(table.name_set().contains("eiffel tower"));
    }

    #[test]
    fn test_page_table_accessors() {
        let table = PageEntityTable::empty("https://example.com/paris", Some(4));
        assert_eq!(table.url(), "https://example.com/paris");
        assert_eq!(table.rank(), Some(4));

        let target = PageEntityTable::empty("https://target.example", None);
        assert_eq!(target.rank(), None);
    }

    #[test]
    fn test_page_content_has_content() {
        let mut page = PageContent {
            position: Some(1),
            link: "https://example.com".to_string(),
            content: Some("   ".to_string()),
        };
        assert!(!page.has_content());

        page.content = Some("Paris is the capital of France.".to_string());
        assert!(page.has_content());

        page.content = None;
        assert!(!page.has_content());
    }

    #[test]
    fn test_serp_result_builder() {
        let result = SerpResult::new("https://example.com/paris")
            .with_position(3)
            .with_source("Example")
            .with_snippet("Visit Paris");

        assert_eq!(result.position, Some(3));
        assert_eq!(result.source.as_deref(), Some("Example"));
        assert_eq!(result.snippet.as_deref(), Some("Visit Paris"));
    }

    #[test]
    fn test_upstream_error_display() {
        let err = CgaError::upstream("HasData", "status 401");
        assert_eq!(err.to_string(), "HasData error: status 401");
    }

    struct EchoAnalyzer;

    #[async_trait::async_trait]
    impl EntityAnalyzer for EchoAnalyzer {
        async fn analyze(&self, text: &str) -> Result<EntityResponse> {
            if text.is_empty() {
                return Ok(EntityResponse::error("No text provided"));
            }
            Ok(EntityResponse::entities(vec![RawEntity::new(text, 1.0)]))
        }
    }

    #[test]
    fn test_analyzer_trait_object() {
        let analyzer: std::sync::Arc<dyn EntityAnalyzer> = std::sync::Arc::new(EchoAnalyzer);

        let response = tokio_test::block_on(analyzer.analyze("Paris")).unwrap();
        assert!(!response.is_error());

        let response = tokio_test::block_on(analyzer.analyze("")).unwrap();
        assert!(response.is_error());
    }
}
