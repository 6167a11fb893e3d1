//! The trader's plan: where they enter, where they bail, and how much they accept to lose.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk plan for one selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Assumed current price of the underlying
    pub entry_price: Decimal,

    /// Name used to match the instrument catalog
    pub underlying_name: String,

    /// Currency amount the trader accepts to lose
    pub risk_amount: Decimal,

    /// Underlying price at which the trade is abandoned
    pub stop_price: Decimal,

    /// Multiple of the entry-to-stop distance used for the profit target
    pub reward_risk_ratio: Decimal,

    /// Explicit profit target that replaces the derived one
    #[serde(default)]
    pub take_profit_override: Option<Decimal>,
}

impl RiskProfile {
    pub fn new(
        underlying_name: impl Into<String>,
        entry_price: Decimal,
        stop_price: Decimal,
        risk_amount: Decimal,
        reward_risk_ratio: Decimal,
    ) -> Self {
        Self {
            entry_price,
            underlying_name: underlying_name.into(),
            risk_amount,
            stop_price,
            reward_risk_ratio,
            take_profit_override: None,
        }
    }

    /// Use a fixed target instead of deriving it from the ratio.
    pub fn with_take_profit(mut self, take_profit: Decimal) -> Self {
        self.take_profit_override = Some(take_profit);
        self
    }

    /// Absolute distance between entry and stop, `None` on overflow.
    pub fn stop_distance(&self) -> Option<Decimal> {
        self.entry_price.checked_sub(self.stop_price).map(|d| d.abs())
    }
}
