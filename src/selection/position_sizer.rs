//! Position sizing for a single instrument against a risk plan.
//!
//! All instrument-price conversions use the same mirrored formula:
//! `sign * (underlying - finance_level) / 100 * parity`, so long and short
//! share one code path.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Instrument, RiskProfile};

use super::{EngineError, Result, TradeTarget};

/// Sizing figures for one instrument. Read-only once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizedCandidate {
    pub instrument: Instrument,

    /// Instrument value at the entry price, per the parity convention
    pub leverage: Decimal,

    /// Instrument value when the underlying hits the stop
    pub stop_in_instrument_terms: Decimal,

    /// Units that lose exactly the risk amount if the stop is hit
    pub units_affordable: Decimal,

    /// Value at the target minus cost basis, for all units
    pub projected_profit: Decimal,

    /// Target value minus last price, for one unit
    pub profit_per_unit: Decimal,

    /// |finance_level - stop|
    pub distance_to_stop: Decimal,
}

/// Calculator for unit counts and projected profit.
pub struct PositionSizer {
    entry_price: Decimal,
    stop_price: Decimal,
    take_profit_price: Decimal,
    risk_amount: Decimal,
}

impl PositionSizer {
    /// Create a sizer for a validated plan and its derived target.
    pub fn new(profile: &RiskProfile, target: &TradeTarget) -> Self {
        Self {
            entry_price: profile.entry_price,
            stop_price: profile.stop_price,
            take_profit_price: target.take_profit_price,
            risk_amount: profile.risk_amount,
        }
    }

    /// Size one instrument.
    ///
    /// Fails with [`EngineError::DegenerateSizing`] when the instrument's
    /// quotes are not positive, when the stop value is not below its last
    /// price, or when the arithmetic overflows.
    pub fn size(&self, instrument: &Instrument) -> Result<SizedCandidate> {
        let id = instrument.identifier.as_str();

        if instrument.parity_or_multiplier <= Decimal::ZERO {
            return Err(EngineError::degenerate(id, "parity must be positive"));
        }
        if instrument.last_price <= Decimal::ZERO {
            return Err(EngineError::degenerate(id, "last price must be positive"));
        }

        let overflow = || EngineError::degenerate(id, "arithmetic overflow");

        let leverage = instrument.value_at(self.entry_price).ok_or_else(overflow)?;
        if leverage <= Decimal::ZERO {
            return Err(EngineError::degenerate(
                id,
                format!("entry {} is not beyond finance level {}", self.entry_price, instrument.finance_level),
            ));
        }

        let stop_in_instrument_terms = instrument.value_at(self.stop_price).ok_or_else(overflow)?;
        let risk_per_unit = instrument
            .last_price
            .checked_sub(stop_in_instrument_terms)
            .ok_or_else(overflow)?;
        if risk_per_unit <= Decimal::ZERO {
            return Err(EngineError::degenerate(
                id,
                format!(
                    "stop value {} is not below last price {}",
                    stop_in_instrument_terms.round_dp(4),
                    instrument.last_price
                ),
            ));
        }

        let units_affordable = self
            .risk_amount
            .checked_div(risk_per_unit)
            .ok_or_else(overflow)?;

        let target_value = instrument
            .value_at(self.take_profit_price)
            .ok_or_else(overflow)?;
        let profit_per_unit = target_value.checked_sub(instrument.last_price).ok_or_else(overflow)?;
        let projected_profit = target_value
            .checked_mul(units_affordable)
            .zip(instrument.last_price.checked_mul(units_affordable))
            .and_then(|(value, cost)| value.checked_sub(cost))
            .ok_or_else(overflow)?;

        let distance_to_stop = instrument
            .finance_level
            .checked_sub(self.stop_price)
            .map(|d| d.abs())
            .ok_or_else(overflow)?;

        Ok(SizedCandidate {
            instrument: instrument.clone(),
            leverage,
            stop_in_instrument_terms,
            units_affordable,
            projected_profit,
            profit_per_unit,
            distance_to_stop,
        })
    }
}
