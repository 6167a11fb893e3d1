//! Top-N truncation and the report handed back to callers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Direction;

use super::{EngineError, Exclusion, Result, SizedCandidate};

/// Outcome of a successful selection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistReport {
    pub direction: Direction,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub take_profit_price: Decimal,

    /// Number of instruments handed to the engine
    pub evaluated: usize,

    /// Ranked candidates, at most `top_n`
    pub candidates: Vec<SizedCandidate>,

    /// Everything filtered or skipped, in evaluation order
    pub exclusions: Vec<Exclusion>,
}

impl ShortlistReport {
    /// The top-ranked candidate.
    pub fn best(&self) -> Option<&SizedCandidate> {
        self.candidates.first()
    }

    /// Exclusion counts grouped by reason label.
    pub fn exclusion_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for exclusion in &self.exclusions {
            *counts.entry(exclusion.reason.label()).or_insert(0) += 1;
        }
        counts
    }
}

/// Keep the first `top_n` ranked candidates.
///
/// Returns every candidate when fewer than `top_n` survived; fails with
/// [`EngineError::NoCandidates`] when none did.
pub fn take_top(
    mut ranked: Vec<SizedCandidate>,
    top_n: usize,
    evaluated: usize,
    excluded: usize,
) -> Result<Vec<SizedCandidate>> {
    if ranked.is_empty() {
        return Err(EngineError::NoCandidates { evaluated, excluded });
    }
    ranked.truncate(top_n.max(1));
    Ok(ranked)
}
