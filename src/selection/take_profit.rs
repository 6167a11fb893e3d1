//! Profit target derived from entry, stop and reward:risk ratio.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, RiskProfile};

use super::{EngineError, Result};

/// Direction and target derived once per run and shared by every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTarget {
    pub direction: Direction,
    pub take_profit_price: Decimal,
}

/// Validate a risk plan and compute its target.
///
/// `take_profit = entry + sign * rr * |entry - stop|`, unless the plan carries
/// an explicit target, which must then sit on the profit side of the entry.
pub fn calculate(profile: &RiskProfile) -> Result<TradeTarget> {
    let Some(direction) = Direction::from_levels(profile.entry_price, profile.stop_price) else {
        return Err(EngineError::invalid(
            "stop",
            format!("stop {} equals the entry price", profile.stop_price),
        ));
    };

    if profile.entry_price <= Decimal::ZERO {
        return Err(EngineError::invalid(
            "price",
            format!("entry price {} must be positive", profile.entry_price),
        ));
    }
    if profile.risk_amount <= Decimal::ZERO {
        return Err(EngineError::invalid(
            "risk",
            format!("risk amount {} must be positive", profile.risk_amount),
        ));
    }
    if profile.reward_risk_ratio <= Decimal::ZERO {
        return Err(EngineError::invalid(
            "rr",
            format!("reward:risk ratio {} must be positive", profile.reward_risk_ratio),
        ));
    }

    let take_profit_price = match profile.take_profit_override {
        Some(target) => {
            let gain = target
                .checked_sub(profile.entry_price)
                .ok_or_else(|| EngineError::invalid("take_profit", format!("target {} is out of range", target)))?;
            if direction.sign() * gain <= Decimal::ZERO {
                return Err(EngineError::invalid(
                    "take_profit",
                    format!(
                        "target {} is not on the {} side of entry {}",
                        target, direction, profile.entry_price
                    ),
                ));
            }
            target
        }
        None => profile
            .stop_distance()
            .and_then(|distance| profile.reward_risk_ratio.checked_mul(distance))
            .and_then(|move_size| {
                profile
                    .entry_price
                    .checked_add(direction.sign() * move_size)
            })
            .ok_or_else(|| {
                EngineError::invalid(
                    "stop",
                    format!(
                        "take-profit from entry {} and stop {} is out of range",
                        profile.entry_price, profile.stop_price
                    ),
                )
            })?,
    };

    Ok(TradeTarget {
        direction,
        take_profit_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(entry: Decimal, stop: Decimal, rr: Decimal) -> RiskProfile {
        RiskProfile::new("OMX", entry, stop, dec!(1000), rr)
    }

    #[test]
    fn test_long_target() {
        let target = calculate(&profile(dec!(100.50), dec!(95), dec!(2))).unwrap();
        assert_eq!(target.direction, Direction::Long);
        assert_eq!(target.take_profit_price, dec!(111.50));
    }

    #[test]
    fn test_short_target() {
        let target = calculate(&profile(dec!(100), dec!(104), dec!(1.5))).unwrap();
        assert_eq!(target.direction, Direction::Short);
        assert_eq!(target.take_profit_price, dec!(94));
    }

    #[test]
    fn test_target_always_beyond_entry() {
        for (entry, stop) in [(dec!(50), dec!(49.99)), (dec!(7.2), dec!(1)), (dec!(3), dec!(9))] {
            for rr in [dec!(0.1), dec!(1), dec!(3.7)] {
                let t = calculate(&profile(entry, stop, rr)).unwrap();
                match t.direction {
                    Direction::Long => assert!(t.take_profit_price > entry),
                    Direction::Short => assert!(t.take_profit_price < entry),
                }
            }
        }
    }

    #[test]
    fn test_equal_entry_and_stop_always_invalid() {
        // Even with every other field broken, the stop is reported.
        let mut p = profile(dec!(100), dec!(100), dec!(-1));
        p.risk_amount = dec!(-5);
        let err = calculate(&p).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { field: "stop", .. }));
    }

    #[test]
    fn test_non_positive_inputs_rejected() {
        let err = calculate(&profile(dec!(100), dec!(95), Decimal::ZERO)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { field: "rr", .. }));

        let mut p = profile(dec!(100), dec!(95), dec!(2));
        p.risk_amount = Decimal::ZERO;
        assert!(matches!(
            calculate(&p),
            Err(EngineError::InvalidParameters { field: "risk", .. })
        ));
    }

    #[test]
    fn test_out_of_range_levels_are_invalid_not_a_panic() {
        let err = calculate(&profile(Decimal::MAX, Decimal::MIN, dec!(2))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { field: "stop", .. }));

        let wild_target = profile(dec!(1), dec!(2), dec!(2)).with_take_profit(Decimal::MIN);
        assert!(matches!(
            calculate(&wild_target),
            Err(EngineError::InvalidParameters { field: "take_profit", .. })
        ));
    }

    #[test]
    fn test_explicit_target() {
        let p = profile(dec!(100), dec!(95), dec!(2)).with_take_profit(dec!(120));
        assert_eq!(calculate(&p).unwrap().take_profit_price, dec!(120));

        let wrong_side = profile(dec!(100), dec!(95), dec!(2)).with_take_profit(dec!(99));
        assert!(matches!(
            calculate(&wrong_side),
            Err(EngineError::InvalidParameters { field: "take_profit", .. })
        ));
    }
}
