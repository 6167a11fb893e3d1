//! The selection pipeline: target, filter, size, rank, shortlist.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::models::{Instrument, RiskProfile};

use super::filter::{self, Exclusion, ExclusionReason};
use super::{
    ranker, shortlist, take_profit, EngineError, PositionSizer, Result, SelectionConfig,
    ShortlistReport, SizedCandidate,
};

/// Select the best `top_n` instruments for a plan with default constraints.
pub fn select(profile: &RiskProfile, instruments: &[Instrument], top_n: usize) -> Result<ShortlistReport> {
    select_with(profile, instruments, &SelectionConfig::top(top_n))
}

/// Select with explicit constraints.
///
/// Invalid plans fail before any instrument is looked at. Instruments whose
/// sizing is degenerate are excluded individually; the run only fails with
/// [`EngineError::NoCandidates`] when nothing is left.
pub fn select_with(
    profile: &RiskProfile,
    instruments: &[Instrument],
    config: &SelectionConfig,
) -> Result<ShortlistReport> {
    let target = take_profit::calculate(profile)?;
    config.validate()?;

    let (survivors, mut exclusions) =
        filter::filter_instruments(instruments, target.direction, profile.stop_price);

    let sizer = PositionSizer::new(profile, &target);
    let mut sized: Vec<SizedCandidate> = Vec::with_capacity(survivors.len());
    for instrument in survivors {
        match sizer.size(instrument) {
            Ok(candidate) => match constraint_violation(&candidate, config) {
                None => sized.push(candidate),
                Some(reason) => {
                    debug!(identifier = %instrument.identifier, reason = %reason, "Candidate rejected");
                    exclusions.push(Exclusion::new(instrument.identifier.clone(), reason));
                }
            },
            Err(EngineError::DegenerateSizing { identifier, reason }) => {
                warn!(identifier = %identifier, reason = %reason, "Skipping instrument");
                exclusions.push(Exclusion::new(identifier, ExclusionReason::DegenerateSizing(reason)));
            }
            Err(e) => return Err(e),
        }
    }

    ranker::rank(&mut sized);
    let candidates = shortlist::take_top(sized, config.top_n, instruments.len(), exclusions.len())?;

    info!(
        direction = %target.direction,
        take_profit = %target.take_profit_price,
        evaluated = instruments.len(),
        excluded = exclusions.len(),
        shortlisted = candidates.len(),
        "Selection complete"
    );

    Ok(ShortlistReport {
        direction: target.direction,
        entry_price: profile.entry_price,
        stop_price: profile.stop_price,
        take_profit_price: target.take_profit_price,
        evaluated: instruments.len(),
        candidates,
        exclusions,
    })
}

fn constraint_violation(candidate: &SizedCandidate, config: &SelectionConfig) -> Option<ExclusionReason> {
    if let (Some(max), Some(spread)) = (config.max_spread, candidate.instrument.spread()) {
        if spread > max {
            return Some(ExclusionReason::SpreadTooWide);
        }
    }
    if matches!(config.min_leverage, Some(min) if candidate.leverage < min)
        || matches!(config.max_leverage, Some(max) if candidate.leverage > max)
    {
        return Some(ExclusionReason::LeverageOutOfRange);
    }
    if config.require_profit && candidate.profit_per_unit <= Decimal::ZERO {
        return Some(ExclusionReason::Unprofitable);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use rust_decimal_macros::dec;

    fn profile() -> RiskProfile {
        RiskProfile::new("OMX", dec!(100), dec!(95), dec!(1000), dec!(2))
    }

    fn long(id: &str, finance: Decimal, parity: Decimal, last: Decimal) -> Instrument {
        Instrument::new(id, "OMX", Direction::Long, finance, parity, last)
    }

    fn catalog() -> Vec<Instrument> {
        vec![
            long("far", dec!(70), dec!(10), dec!(4.1)),
            long("near-low", dec!(93), dec!(5), dec!(0.4)),
            long("near-high", dec!(93), dec!(10), dec!(0.8)),
            long("ko-above", dec!(96), dec!(10), dec!(0.5)),
            Instrument::new("bear", "OMX", Direction::Short, dec!(110), dec!(10), dec!(1)),
            long("stale", dec!(90), dec!(10), dec!(0.3)),
            long("mid", dec!(85), dec!(10), dec!(1.6)),
        ]
    }

    #[test]
    fn test_full_pipeline() {
        let report = select(&profile(), &catalog(), 3).unwrap();

        let ids: Vec<&str> = report.candidates.iter().map(|c| c.instrument.identifier.as_str()).collect();
        assert_eq!(ids, vec!["near-high", "near-low", "mid"]);
        assert_eq!(report.direction, Direction::Long);
        assert_eq!(report.take_profit_price, dec!(110));
        assert_eq!(report.evaluated, 7);
        assert_eq!(report.best().unwrap().instrument.identifier, "near-high");

        let counts = report.exclusion_counts();
        assert_eq!(counts.get("knock-out beyond stop"), Some(&1));
        assert_eq!(counts.get("side mismatch"), Some(&1));
        assert_eq!(counts.get("degenerate sizing"), Some(&1));
    }

    #[test]
    fn test_top_n_larger_than_survivors() {
        let report = select(&profile(), &catalog(), 50).unwrap();
        assert_eq!(report.candidates.len(), 4);
    }

    #[test]
    fn test_empty_catalog_is_no_candidates() {
        let err = select(&profile(), &[], 3).unwrap_err();
        assert_eq!(err, EngineError::NoCandidates { evaluated: 0, excluded: 0 });
    }

    #[test]
    fn test_degenerate_only_catalog_escalates_to_no_candidates() {
        let list = vec![long("stale", dec!(90), dec!(10), dec!(0.3))];
        let err = select(&profile(), &list, 3).unwrap_err();
        assert_eq!(err, EngineError::NoCandidates { evaluated: 1, excluded: 1 });
    }

    #[test]
    fn test_invalid_plan_fails_before_filtering() {
        let mut p = profile();
        p.stop_price = p.entry_price;
        assert!(matches!(
            select(&p, &catalog(), 3),
            Err(EngineError::InvalidParameters { field: "stop", .. })
        ));
        assert!(matches!(
            select(&profile(), &catalog(), 0),
            Err(EngineError::InvalidParameters { field: "top_n", .. })
        ));
    }

    #[test]
    fn test_extreme_plan_levels_are_rejected_cleanly() {
        let p = RiskProfile::new("OMX", Decimal::MAX, Decimal::MIN, dec!(1000), dec!(2));
        assert!(matches!(
            select(&p, &[], 3),
            Err(EngineError::InvalidParameters { field: "stop", .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let list = catalog();
        let a = select(&profile(), &list, 3).unwrap();
        let b = select(&profile(), &list, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_reordering_input_only_moves_exact_ties() {
        let mut list = catalog();
        list.push(long("mid-twin", dec!(85), dec!(10), dec!(1.6)));
        list.reverse();

        let report = select(&profile(), &list, 10).unwrap();
        let ids: Vec<&str> = report.candidates.iter().map(|c| c.instrument.identifier.as_str()).collect();
        // Ties on both keys follow the (reversed) input order.
        assert_eq!(ids, vec!["near-high", "near-low", "mid-twin", "mid", "far"]);
    }

    #[test]
    fn test_constraints() {
        let mut list = catalog();
        list[2].bid = Some(dec!(0.70));
        list[2].ask = Some(dec!(0.80));

        let config = SelectionConfig {
            max_spread: Some(dec!(0.05)),
            min_leverage: Some(dec!(0.4)),
            require_profit: true,
            ..Default::default()
        };
        let report = select_with(&profile(), &list, &config).unwrap();
        let ids: Vec<&str> = report.candidates.iter().map(|c| c.instrument.identifier.as_str()).collect();
        // near-high: spread, near-low: leverage 0.35, far: target value 4.0 below last 4.1
        assert_eq!(ids, vec!["mid"]);
        let counts = report.exclusion_counts();
        assert_eq!(counts.get("spread too wide"), Some(&1));
        assert_eq!(counts.get("leverage out of range"), Some(&1));
        assert_eq!(counts.get("unprofitable"), Some(&1));
    }
}
