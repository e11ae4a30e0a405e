//! Document retrieval for SupportDesk.
//!
//! A cheap lexical-overlap scorer over a small, static documentation set.
//! There is no index and no embedding model: every query is scored against
//! every document, which is fine at tens of entries.

pub mod catalog;
pub mod scorer;

pub use catalog::{builtin_catalog, general_docs, product_docs};
pub use scorer::{RelevanceScorer, ScoredDoc, ScoringWeights, score};
