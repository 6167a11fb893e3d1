//! Normalized mini future as consumed by the selection engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// A candidate leveraged instrument on the plan's underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Vendor symbol or ISIN
    pub identifier: String,

    pub underlying_name: String,

    /// Direction of the underlying the instrument profits from
    pub side: Direction,

    /// Embedded knock-out / financing level in underlying terms
    pub finance_level: Decimal,

    /// Instrument price change per 100 units of underlying price change
    pub parity_or_multiplier: Decimal,

    /// Current price of the instrument itself
    pub last_price: Decimal,

    /// Stop-loss barrier published by the issuer, when it differs from the financing level
    #[serde(default)]
    pub knock_out: Option<Decimal>,

    // Display-only vendor details
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub isin: Option<String>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
}

impl Instrument {
    /// Create an instrument with only the fields the engine needs.
    pub fn new(
        identifier: impl Into<String>,
        underlying_name: impl Into<String>,
        side: Direction,
        finance_level: Decimal,
        parity_or_multiplier: Decimal,
        last_price: Decimal,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            underlying_name: underlying_name.into(),
            side,
            finance_level,
            parity_or_multiplier,
            last_price,
            knock_out: None,
            issuer: None,
            symbol: None,
            isin: None,
            bid: None,
            ask: None,
        }
    }

    /// Ask minus bid, when both quotes are known.
    pub fn spread(&self) -> Option<Decimal> {
        self.ask?.checked_sub(self.bid?)
    }

    /// Instrument-price value of an underlying price, using the instrument's side.
    ///
    /// `side.sign() * (underlying - finance_level) / 100 * parity`
    pub fn value_at(&self, underlying: Decimal) -> Option<Decimal> {
        self.side
            .sign()
            .checked_mul(underlying.checked_sub(self.finance_level)?)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .checked_mul(self.parity_or_multiplier)
    }
}
