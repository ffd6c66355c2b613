//! Entity coverage aggregation
//!
//! For every entity that appears among a competitor page's top-K entities
//! (by salience), count how many distinct competitor pages cover it, record
//! which URLs those are, and flag whether the target page mentions it. The
//! result is ranked by coverage so the most widely covered gaps come first.

use std::collections::HashMap;

use cga_core::{
    AnalysisConfig, CoverageEntry, EntityRecord, PageEntityTable, TieBreak, DEFAULT_TOP_K,
};

/// Running coverage for one entity during the fold
struct Accumulator {
    entity: String,
    urls: Vec<String>,
    total_salience: f64,
}

/// Aggregates competitor entity tables against a target page
#[derive(Debug, Clone)]
pub struct GapAggregator {
    /// Entities per competitor page considered
    top_k: usize,
    /// Ordering among equal counts
    tie_break: TieBreak,
}

impl GapAggregator {
    /// Create an aggregator with K = 30 and first-seen tie-breaking
    pub fn new() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            tie_break: TieBreak::FirstSeen,
        }
    }

    /// Create from analysis config
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            top_k: config.top_k,
            tie_break: config.tie_break,
        }
    }

    /// Set K
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set tie-break policy
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Compute ranked coverage entries
    ///
    /// Competitor tables are folded in the order given, and each table in
    /// descending salience order, which fixes the first-seen order used to
    /// break ties. Each URL contributes at most once per entity, so
    /// `count == urls.len()` always holds.
    pub fn aggregate(
        &self,
        competitors: &[PageEntityTable],
        target: &PageEntityTable,
    ) -> Vec<CoverageEntry> {
        let mut accumulators: Vec<Accumulator> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for table in competitors {
            for record in top_entities(table, self.top_k) {
                let name = record.name.to_lowercase();

                match index.get(&name) {
                    Some(&i) => {
                        let acc = &mut accumulators[i];
                        if acc.urls.iter().any(|u| u == table.url()) {
                            continue;
                        }
                        acc.urls.push(table.url().to_string());
                        acc.total_salience += record.salience;
                    }
                    None => {
                        index.insert(name.clone(), accumulators.len());
                        accumulators.push(Accumulator {
                            entity: name,
                            urls: vec![table.url().to_string()],
                            total_salience: record.salience,
                        });
                    }
                }
            }
        }

        let target_names = target.name_set();

        let mut entries: Vec<CoverageEntry> = accumulators
            .into_iter()
            .map(|acc| CoverageEntry {
                missing: !target_names.contains(&acc.entity),
                count: acc.urls.len(),
                entity: acc.entity,
                urls: acc.urls,
                total_salience: acc.total_salience,
            })
            .collect();

        // Vec::sort_by is stable: equal keys keep first-seen order
        match self.tie_break {
            TieBreak::FirstSeen => entries.sort_by(|a, b| b.count.cmp(&a.count)),
            TieBreak::TotalSalience => entries.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| b.total_salience.total_cmp(&a.total_salience))
            }),
        }

        tracing::debug!(
            "Aggregated {} distinct entities from {} competitor pages",
            entries.len(),
            competitors.len()
        );

        entries
    }
}

impl Default for GapAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// At most `k` records of a table by descending salience
///
/// Ties keep table order.
pub fn top_entities(table: &PageEntityTable, k: usize) -> Vec<&EntityRecord> {
    let mut ranked: Vec<&EntityRecord> = table.records().iter().collect();
    ranked.sort_by(|a, b| b.salience.total_cmp(&a.salience));
    ranked.truncate(k);
    ranked
}

// ============================================================================
// Tests
// ============================================================================
