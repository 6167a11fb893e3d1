//! Raw mini future row as delivered by a vendor catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Direction, Instrument};

/// Vendor catalog row. Every field is optional because exports differ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiniFuture {
    pub isin: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub side: Option<Direction>,
    pub underlying: Option<String>,

    /// Underlying units per certificate
    pub ratio: Option<Decimal>,
    pub financing_level: Option<Decimal>,
    /// Stop-loss barrier published by the issuer
    pub knock_out: Option<Decimal>,

    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub last: Option<Decimal>,
    pub currency: Option<String>,

    /// Which adapter produced the row
    #[serde(default)]
    pub source: String,
}

impl MiniFuture {
    /// Best identifier available: symbol, then ISIN, then product name.
    pub fn identifier(&self) -> Option<&str> {
        [&self.symbol, &self.isin, &self.name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Normalize into an [`Instrument`].
    ///
    /// Rows without a side take `default_side`. The price used for sizing is
    /// ask, else bid, else last, else the theoretical value at `entry_price`.
    /// Returns `None` when the row lacks a usable identifier, ratio,
    /// financing level or price.
    pub fn to_instrument(&self, entry_price: Decimal, default_side: Direction) -> Option<Instrument> {
        let Some(identifier) = self.identifier() else {
            debug!(source = %self.source, "Skipping row without identifier");
            return None;
        };

        let ratio = self.ratio.filter(|r| *r > Decimal::ZERO);
        let financing = self.financing_level.filter(|f| *f > Decimal::ZERO);
        let (Some(ratio), Some(financing)) = (ratio, financing) else {
            debug!(identifier = %identifier, "Skipping row without ratio or financing level");
            return None;
        };

        let parity = Decimal::ONE_HUNDRED.checked_div(ratio)?;
        let mut instrument = Instrument::new(
            identifier,
            self.underlying.clone().unwrap_or_default(),
            self.side.unwrap_or(default_side),
            financing,
            parity,
            Decimal::ZERO,
        );

        let quoted = [self.ask, self.bid, self.last]
            .into_iter()
            .flatten()
            .find(|p| *p > Decimal::ZERO);
        let price = match quoted {
            Some(p) => p,
            None => instrument.value_at(entry_price)?,
        };
        if price <= Decimal::ZERO {
            debug!(identifier = %identifier, "Skipping row without a positive price");
            return None;
        }

        instrument.last_price = price;
        instrument.knock_out = self.knock_out.filter(|k| *k > Decimal::ZERO);
        instrument.issuer = self.issuer.clone();
        instrument.symbol = self.symbol.clone();
        instrument.isin = self.isin.clone();
        instrument.bid = self.bid;
        instrument.ask = self.ask;
        Some(instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> MiniFuture {
        MiniFuture {
            symbol: Some("MINI L OMX VT12".to_string()),
            isin: Some("CH1234567890".to_string()),
            side: Some(Direction::Long),
            underlying: Some("OMX Stockholm 30".to_string()),
            ratio: Some(dec!(10)),
            financing_level: Some(dec!(2200)),
            bid: Some(dec!(9.9)),
            ask: Some(dec!(10.0)),
            source: "test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ratio_becomes_parity_per_hundred() {
        let inst = row().to_instrument(dec!(2300), Direction::Long).unwrap();
        assert_eq!(inst.parity_or_multiplier, dec!(10));
        assert_eq!(inst.identifier, "MINI L OMX VT12");
        assert_eq!(inst.last_price, dec!(10.0));
    }

    #[test]
    fn test_price_falls_back_to_theoretical() {
        let mut r = row();
        r.bid = None;
        r.ask = None;
        let inst = r.to_instrument(dec!(2300), Direction::Long).unwrap();
        // (2300 - 2200) / 100 * 10
        assert_eq!(inst.last_price, dec!(10));
    }

    #[test]
    fn test_missing_side_takes_default() {
        let mut r = row();
        r.side = None;
        r.financing_level = Some(dec!(2400));
        let inst = r.to_instrument(dec!(2300), Direction::Short).unwrap();
        assert_eq!(inst.side, Direction::Short);
    }

    #[test]
    fn test_unusable_rows_are_skipped() {
        let mut r = row();
        r.ratio = Some(Decimal::ZERO);
        assert!(r.to_instrument(dec!(2300), Direction::Long).is_none());

        let mut r = row();
        r.symbol = None;
        r.isin = Some("  ".to_string());
        assert!(r.to_instrument(dec!(2300), Direction::Long).is_none());
    }
}
