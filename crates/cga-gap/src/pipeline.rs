//! Content gap analysis pipeline
//!
//! Runs the stages in order: search results, page text, per-page entities,
//! target page entities, then aggregation. Every collaborator failure is
//! logged and degraded to an empty or absent value for that unit of work;
//! only an invalid request fails a run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use cga_core::{
    AnalysisConfig, CgaError, CoverageEntry, EntityAnalyzer, EntityResponse, PageContent,
    PageEntityTable, PageFetcher, Result, ResultRetriever, SerpResult, TextExtractor,
};
use cga_extractor::normalize_entities;

use crate::aggregate::GapAggregator;
use crate::report::GapReport;

// ============================================================================
// Request
// ============================================================================

/// Input of one analysis run
#[derive(Debug, Clone)]
pub struct GapRequest {
    /// Search keyword whose results are the competitor set
    pub keyword: String,

    /// Page audited for gaps
    pub target_url: String,
}

impl GapRequest {
    pub fn new(keyword: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            target_url: target_url.into(),
        }
    }

    /// Both the keyword and the target URL are required
    pub fn validate(&self) -> Result<()> {
        if self.keyword.trim().is_empty() {
            return Err(CgaError::MalformedInput("keyword is empty".to_string()));
        }
        if self.target_url.trim().is_empty() {
            return Err(CgaError::MalformedInput("target URL is empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Content gap analysis orchestrator
pub struct GapAnalyzer {
    /// Search result source
    retriever: Arc<dyn ResultRetriever>,

    /// Rendered page source
    fetcher: Arc<dyn PageFetcher>,

    /// HTML to article text
    extractor: Arc<dyn TextExtractor>,

    /// Entity/salience analysis
    analyzer: Arc<dyn EntityAnalyzer>,

    /// Configuration
    config: AnalysisConfig,

    aggregator: GapAggregator,
}

impl GapAnalyzer {
    /// Create a new analyzer
    pub fn new(
        retriever: Arc<dyn ResultRetriever>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn EntityAnalyzer>,
        config: AnalysisConfig,
    ) -> Self {
        let aggregator = GapAggregator::from_config(&config);
        Self {
            retriever,
            fetcher,
            extractor,
            analyzer,
            config,
            aggregator,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn concurrency(&self) -> usize {
        self.config.concurrency.max(1)
    }

    /// Execute a full analysis
    pub async fn run(&self, request: &GapRequest) -> Result<GapReport> {
        request.validate()?;

        let start_time = Instant::now();
        let run_id = Uuid::new_v4();

        tracing::info!(
            "Gap analysis {} started: keyword=\"{}\" target={}",
            run_id,
            request.keyword,
            request.target_url
        );

        // 1. Search results
        let serp_results = self.retrieve(&request.keyword).await;

        // 2-4. Competitor pages and the target page are independent
        let competitors = async {
            let pages = self.collect_content(&serp_results).await;
            let tables = self.extract_competitor_entities(&pages).await;
            (pages, tables)
        };
        let ((pages, competitor_tables), target_table) =
            futures::join!(competitors, self.analyze_target(&request.target_url));

        // 5. Aggregate the complete batch
        let coverage = self.aggregate(&competitor_tables, &target_table);

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Gap analysis {} completed in {}ms: {} entities, {} missing",
            run_id,
            elapsed_ms,
            coverage.len(),
            coverage.iter().filter(|e| e.missing).count()
        );

        Ok(GapReport {
            run_id,
            keyword: request.keyword.clone(),
            target_url: request.target_url.clone(),
            generated_at: Utc::now(),
            elapsed_ms,
            serp_results,
            pages,
            competitor_tables,
            target_table,
            coverage,
        })
    }

    /// Retrieve search results, capped at `max_results`
    pub async fn retrieve(&self, keyword: &str) -> Vec<SerpResult> {
        match self.retriever.retrieve(keyword).await {
            Ok(mut results) => {
                if let Some(max) = self.config.max_results {
                    results.truncate(max);
                }
                tracing::debug!(
                    "{} returned {} results",
                    self.retriever.name(),
                    results.len()
                );
                results
            }
            Err(e) => {
                tracing::warn!("Search results unavailable for \"{}\": {}", keyword, e);
                Vec::new()
            }
        }
    }

    /// Fetch and extract text for each result, keeping result order
    pub async fn collect_content(&self, results: &[SerpResult]) -> Vec<PageContent> {
        let total = results.len();

        stream::iter(results.iter().enumerate())
            .map(|(i, result)| async move {
                let content = self.page_text(&result.link).await;
                tracing::info!("Page content [{}/{}]: {}", i + 1, total, result.link);
                PageContent {
                    position: result.position,
                    link: result.link.clone(),
                    content,
                }
            })
            .buffered(self.concurrency())
            .collect()
            .await
    }

    /// Run entity analysis for each page, keeping page order
    pub async fn extract_competitor_entities(&self, pages: &[PageContent]) -> Vec<PageEntityTable> {
        let total = pages.len();

        stream::iter(pages.iter().enumerate())
            .map(|(i, page)| async move {
                let table = self
                    .page_entities(&page.link, page.position, page.content.as_deref())
                    .await;
                tracing::info!(
                    "Page entities [{}/{}]: {} ({} entities)",
                    i + 1,
                    total,
                    page.link,
                    table.len()
                );
                table
            })
            .buffered(self.concurrency())
            .collect()
            .await
    }

    /// Fetch, extract and analyze the target page
    pub async fn analyze_target(&self, url: &str) -> PageEntityTable {
        let text = self.page_text(url).await;
        let table = self.page_entities(url, None, text.as_deref()).await;
        tracing::info!("Target page entities: {} ({} entities)", url, table.len());
        table
    }

    /// Aggregate competitor coverage against the target page
    pub fn aggregate(
        &self,
        competitors: &[PageEntityTable],
        target: &PageEntityTable,
    ) -> Vec<CoverageEntry> {
        self.aggregator.aggregate(competitors, target)
    }

    /// Page text, or `None` when fetching or extraction failed
    async fn page_text(&self, url: &str) -> Option<String> {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        match self.extractor.extract(&html) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!("No article text extracted from {}", url);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to extract text from {}: {}", url, e);
                None
            }
        }
    }

    async fn page_entities(
        &self,
        url: &str,
        rank: Option<u32>,
        text: Option<&str>,
    ) -> PageEntityTable {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            tracing::warn!("No content for {}, skipping entity analysis", url);
            return PageEntityTable::empty(url, rank);
        };

        let response = match self.analyzer.analyze(text).await {
            Ok(response) => response,
            Err(e) => EntityResponse::error(e.to_string()),
        };

        normalize_entities(url, rank, &response)
    }
}
