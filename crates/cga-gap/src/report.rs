//! Gap analysis report
//!
//! Everything one run produced: the search results, the extracted page
//! text, every page's entity table and the ranked coverage entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cga_core::{CoverageEntry, PageContent, PageEntityTable, Result, SerpResult};

/// Result of a content gap analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Analyzed keyword
    pub keyword: String,

    /// Audited page
    pub target_url: String,

    /// Completion timestamp
    pub generated_at: DateTime<Utc>,

    /// Processing time in milliseconds
    pub elapsed_ms: u64,

    /// Search results in rank order
    pub serp_results: Vec<SerpResult>,

    /// Extracted text per competitor page
    pub pages: Vec<PageContent>,

    /// Normalized entities per competitor page
    pub competitor_tables: Vec<PageEntityTable>,

    /// Normalized entities of the target page
    pub target_table: PageEntityTable,

    /// Entities ranked by competitor coverage
    pub coverage: Vec<CoverageEntry>,
}

impl GapReport {
    /// Gaps (entities the target page does not mention) in rank order
    pub fn missing(&self) -> impl Iterator<Item = &CoverageEntry> {
        self.coverage.iter().filter(|e| e.missing)
    }

    /// Summary counts
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            pages_analyzed: self.pages.len(),
            pages_with_content: self.pages.iter().filter(|p| p.has_content()).count(),
            pages_with_entities: self
                .competitor_tables
                .iter()
                .filter(|t| !t.is_empty())
                .count(),
            target_entities: self.target_table.len(),
            distinct_entities: self.coverage.len(),
            missing_entities: self.missing().count(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Headline numbers of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub pages_analyzed: usize,
    pub pages_with_content: usize,
    pub pages_with_entities: usize,
    pub target_entities: usize,
    pub distinct_entities: usize,
    pub missing_entities: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cga_core::EntityRecord;

    fn sample_report() -> GapReport {
        GapReport {
            run_id: Uuid::new_v4(),
            keyword: "paris".to_string(),
            target_url: "https://target.example".to_string(),
            generated_at: Utc::now(),
            elapsed_ms: 12,
            serp_results: vec![SerpResult::new("https://a.example").with_position(1)],
            pages: vec![
                PageContent {
                    position: Some(1),
                    link: "https://a.example".to_string(),
                    content: Some("Paris".to_string()),
                },
                PageContent {
                    position: Some(2),
                    link: "https://b.example".to_string(),
                    content: None,
                },
            ],
            competitor_tables: vec![
                PageEntityTable::new(
                    "https://a.example",
                    Some(1),
                    vec![EntityRecord::new("paris", 0.9)],
                ),
                PageEntityTable::empty("https://b.example", Some(2)),
            ],
            target_table: PageEntityTable::empty("https://target.example", None),
            coverage: vec![CoverageEntry {
                entity: "paris".to_string(),
                count: 1,
                urls: vec!["https://a.example".to_string()],
                missing: true,
                total_salience: 0.9,
            }],
        }
    }

    #[test]
    fn test_summary() {
        let summary = sample_report().summary();

        assert_eq!(
            summary,
            ReportSummary {
                pages_analyzed: 2,
                pages_with_content: 1,
                pages_with_entities: 1,
                target_entities: 0,
                distinct_entities: 1,
                missing_entities: 1,
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let report = sample_report();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["coverage"][0]["entity"], "paris");
        assert_eq!(value["coverage"][0]["count"], 1);
        assert_eq!(value["coverage"][0]["missing"], true);
        assert!(value["coverage"][0]["urls"].is_array());
        assert_eq!(value["competitor_tables"][0]["records"][0]["name"], "paris");
    }
}
