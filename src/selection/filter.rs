//! Drops instruments that cannot serve the plan.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::{Direction, Instrument};

/// Why an instrument did not make the shortlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExclusionReason {
    /// Instrument profits from the other direction
    SideMismatch,
    /// Knock-out would trigger at or before the plan's stop
    KnockOutBeyondStop,
    /// Sizing math had no meaningful answer
    DegenerateSizing(String),
    SpreadTooWide,
    LeverageOutOfRange,
    /// Loses money per unit even at the target
    Unprofitable,
}

impl ExclusionReason {
    /// Short stable label, used for grouping in the report.
    pub fn label(&self) -> &'static str {
        match self {
            ExclusionReason::SideMismatch => "side mismatch",
            ExclusionReason::KnockOutBeyondStop => "knock-out beyond stop",
            ExclusionReason::DegenerateSizing(_) => "degenerate sizing",
            ExclusionReason::SpreadTooWide => "spread too wide",
            ExclusionReason::LeverageOutOfRange => "leverage out of range",
            ExclusionReason::Unprofitable => "unprofitable",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::DegenerateSizing(msg) => write!(f, "degenerate sizing: {}", msg),
            other => f.write_str(other.label()),
        }
    }
}

/// An instrument left out of the shortlist, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub identifier: String,
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn new(identifier: impl Into<String>, reason: ExclusionReason) -> Self {
        Self {
            identifier: identifier.into(),
            reason,
        }
    }
}

/// Check a single instrument against the plan's direction and stop.
///
/// Long: side must be long and `finance_level < stop`.
/// Short: side must be short and `finance_level > stop`.
pub fn check(instrument: &Instrument, direction: Direction, stop_price: Decimal) -> Option<ExclusionReason> {
    if instrument.side != direction {
        return Some(ExclusionReason::SideMismatch);
    }
    let safe = stop_price
        .checked_sub(instrument.finance_level)
        .is_some_and(|gap| direction.sign() * gap > Decimal::ZERO);
    if !safe {
        return Some(ExclusionReason::KnockOutBeyondStop);
    }
    None
}

/// Split instruments into survivors (input order kept) and exclusions.
pub fn filter_instruments<'a>(
    instruments: &'a [Instrument],
    direction: Direction,
    stop_price: Decimal,
) -> (Vec<&'a Instrument>, Vec<Exclusion>) {
    let mut kept = Vec::with_capacity(instruments.len());
    let mut excluded = Vec::new();

    for instrument in instruments {
        match check(instrument, direction, stop_price) {
            None => kept.push(instrument),
            Some(reason) => {
                debug!(
                    identifier = %instrument.identifier,
                    finance_level = %instrument.finance_level,
                    reason = %reason,
                    "Instrument filtered out"
                );
                excluded.push(Exclusion::new(instrument.identifier.clone(), reason));
            }
        }
    }

    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inst(id: &str, side: Direction, finance: Decimal) -> Instrument {
        Instrument::new(id, "OMX", side, finance, dec!(10), dec!(5))
    }

    #[test]
    fn test_long_keeps_finance_strictly_below_stop() {
        let list = vec![
            inst("below", Direction::Long, dec!(90)),
            inst("at", Direction::Long, dec!(95)),
            inst("above", Direction::Long, dec!(96)),
            inst("short", Direction::Short, dec!(90)),
        ];

        let (kept, excluded) = filter_instruments(&list, Direction::Long, dec!(95));

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].identifier, "below");
        assert_eq!(excluded.len(), 3);
        assert_eq!(excluded[0].reason, ExclusionReason::KnockOutBeyondStop);
        assert_eq!(excluded[2].reason, ExclusionReason::SideMismatch);
    }

    #[test]
    fn test_short_keeps_finance_strictly_above_stop() {
        let list = vec![
            inst("s1", Direction::Short, dec!(110)),
            inst("s2", Direction::Short, dec!(105)),
            inst("s3", Direction::Short, dec!(104)),
        ];

        let (kept, _) = filter_instruments(&list, Direction::Short, dec!(105));

        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|i| i.finance_level > dec!(105)));
    }

    #[test]
    fn test_survivors_keep_input_order() {
        let list = vec![
            inst("c", Direction::Long, dec!(80)),
            inst("a", Direction::Long, dec!(94)),
            inst("b", Direction::Long, dec!(85)),
        ];

        let (kept, _) = filter_instruments(&list, Direction::Long, dec!(95));
        let ids: Vec<&str> = kept.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
