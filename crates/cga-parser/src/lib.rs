//! CGA Parser - Article text extraction
//!
//! Turns rendered HTML into the plain article text that is sent for entity
//! analysis. Navigation, footers, scripts and other boilerplate are left out
//! so that entity salience reflects the page's actual content.
//!
//! The `ArticleExtractor` implements the `TextExtractor` trait from
//! `cga-core` and produces an `ExtractedArticle`.

use cga_core::{CgaError, TextExtractor};
use thiserror::Error;

pub mod html;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during text extraction
#[derive(Error, Debug)]
pub enum ParserError {
    /// Input contained no markup at all
    #[error("HTML document is empty")]
    EmptyDocument,

    /// Markup parsed but no readable text was found
    #[error("No readable content found")]
    NoContent,

    /// Internal selector failed to compile
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for CgaError {
    fn from(err: ParserError) -> Self {
        CgaError::Extraction(err.to_string())
    }
}

// ============================================================================
// Extracted Article
// ============================================================================

/// Readable content extracted from a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    /// Document title, if present
    pub title: Option<String>,

    /// Article text, blocks separated by blank lines
    pub text: String,

    /// Number of text blocks (headings, paragraphs, list items) kept
    pub block_count: usize,
}

impl ExtractedArticle {
    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Get total word count (approximate)
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

// ============================================================================
// Article Extractor
// ============================================================================

/// Extracts the main article body from HTML
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    /// Containers with less visible text than this are not considered
    pub min_container_chars: usize,
    /// Upper bound on containers scored per document
    pub max_candidates: usize,
}

impl ArticleExtractor {
    /// Create an extractor with default thresholds
    pub fn new() -> Self {
        Self {
            min_container_chars: 20,
            max_candidates: 20_000,
        }
    }

    /// Set the minimum container size
    pub fn with_min_container_chars(mut self, chars: usize) -> Self {
        self.min_container_chars = chars;
        self
    }

    /// Extract the article from an HTML document
    pub fn parse(&self, html: &str) -> Result<ExtractedArticle> {
        if html.trim().is_empty() {
            return Err(ParserError::EmptyDocument);
        }

        let article = html::extract_article(html, self)?;
        tracing::debug!(
            "Extracted {} blocks ({} words)",
            article.block_count,
            article.word_count()
        );
        Ok(article)
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for ArticleExtractor {
    fn extract(&self, html: &str) -> cga_core::Result<String> {
        Ok(self.parse(html)?.text)
    }
}

// ============================================================================
// Tests
// ============================================================================
