//! Per-page entity normalization
//!
//! Folds the analyzer's raw entity list for one page into a
//! `PageEntityTable`: names are lower-cased and repeated names have their
//! salience summed, so every entity appears once per page.

use std::collections::HashMap;

use cga_core::{EntityRecord, EntityResponse, PageEntityTable, RawEntity};

/// Normalize one page's analysis result
///
/// An error indicator or an empty entity list yields an empty table.
/// Records with a missing or empty name, or a missing, negative or
/// non-finite salience are dropped.
pub fn normalize_entities(
    url: impl Into<String>,
    rank: Option<u32>,
    response: &EntityResponse,
) -> PageEntityTable {
    let url = url.into();

    let raw = match response {
        EntityResponse::Error { error } => {
            tracing::warn!("Entity analysis returned an error for {}: {}", url, error);
            return PageEntityTable::empty(url, rank);
        }
        EntityResponse::Entities { entities } => entities,
    };

    let records = fold_entities(raw);
    if records.is_empty() {
        tracing::warn!("No entities found for {}", url);
    }

    PageEntityTable::new(url, rank, records)
}

/// Merge duplicate names, keeping first-occurrence order
fn fold_entities(raw: &[RawEntity]) -> Vec<EntityRecord> {
    let mut records: Vec<EntityRecord> = Vec::with_capacity(raw.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(raw.len());
    let mut dropped = 0usize;

    for entity in raw {
        let (Some(name), Some(salience)) = (entity.name.as_deref(), entity.salience) else {
            dropped += 1;
            continue;
        };
        if name.trim().is_empty() || !salience.is_finite() || salience < 0.0 {
            dropped += 1;
            continue;
        }

        let name = name.to_lowercase();
        match index.get(&name) {
            Some(&i) => records[i].salience += salience,
            None => {
                index.insert(name.clone(), records.len());
                records.push(EntityRecord::new(name, salience));
            }
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} malformed entity records", dropped);
    }

    records
}
