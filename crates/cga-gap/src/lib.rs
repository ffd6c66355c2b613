//! CGA Gap - Content gap analysis
//!
//! This crate implements the analysis itself:
//! - `aggregate`: the entity coverage aggregation and gap ranking
//! - `pipeline`: the orchestrator that drives retrieval, fetching, text
//!   extraction and entity analysis and feeds the aggregator
//! - `report`: the serializable result of a run
//!
//! The aggregator is a pure, synchronous function of its inputs. The
//! pipeline may process competitor pages concurrently but always hands the
//! aggregator the complete batch in search-result order.

pub mod aggregate;
pub mod pipeline;
pub mod report;

pub use aggregate::{top_entities, GapAggregator};
pub use pipeline::{GapAnalyzer, GapRequest};
pub use report::{GapReport, ReportSummary};
