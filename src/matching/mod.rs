//! Relevance matching
//!
//! This module decides which crawled records are worth surfacing:
//! - Span-based fuzzy similarity between criterion terms and titles
//! - The relevance scorer with an explainable breakdown
//! - The ranking filter applying a threshold and ordering matches

mod ranking;
mod scorer;
pub mod similarity;

pub use ranking::filter;
pub use scorer::{
    explain, is_location_match, score, ScoreBreakdown, TermMatch, Verdict, PRIMARY_WEIGHT,
    QUANT_BOOST, RELATED_WEIGHT,
};
