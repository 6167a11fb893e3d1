//! Chooses where the catalog comes from and narrows it to the plan's underlying.

use std::path::PathBuf;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::models::{Direction, Instrument, MiniFuture};

use super::vontobel::{self, VontobelProvider};
use super::vontobel_api::{VontobelApiConfig, VontobelApiProvider};
use super::SourceError;

/// One of the supported catalog origins.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Api(VontobelApiConfig),
    CsvFile(PathBuf),
    Download { url: String, cookie: Option<String> },
}

impl CatalogSource {
    /// API wins over a local file, which wins over a download URL.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.use_api {
            return Ok(Self::Api(config.api.clone()));
        }
        if let Some(path) = &config.csv_path {
            return Ok(Self::CsvFile(path.clone()));
        }
        if let Some(url) = &config.url {
            return Ok(Self::Download {
                url: url.clone(),
                cookie: config.cookie.clone(),
            });
        }
        Err(SourceError::MissingSource)
    }

    pub fn describe(&self) -> String {
        match self {
            CatalogSource::Api(api) => format!("Vontobel API ({})", api.culture),
            CatalogSource::CsvFile(path) => format!("CSV file {}", path.display()),
            CatalogSource::Download { url, .. } => format!("CSV download {}", url),
        }
    }

    pub async fn load(&self) -> Result<Vec<MiniFuture>, SourceError> {
        info!(source = %self.describe(), "Loading instrument catalog");
        match self {
            CatalogSource::Api(api) => VontobelApiProvider::new(api.clone())?.fetch_all().await,
            CatalogSource::CsvFile(path) => vontobel::load_csv_file(path),
            CatalogSource::Download { url, cookie } => {
                VontobelProvider::new(Some(url.clone()), cookie.clone())?
                    .fetch_all()
                    .await
            }
        }
    }
}

/// Every whitespace-separated token of `query` must occur in `target`, ignoring case.
pub fn matches_underlying(query: &str, target: &str) -> bool {
    let target = target.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|token| target.contains(token))
}

/// Keep rows on the requested underlying and, if given, from one of the issuers.
///
/// Rows that do not name their underlying are kept.
pub fn filter_rows(rows: &[MiniFuture], underlying: &str, issuers: &[String]) -> Vec<MiniFuture> {
    let issuers: Vec<String> = issuers.iter().map(|i| i.to_lowercase()).collect();

    rows.iter()
        .filter(|row| {
            row.underlying
                .as_deref()
                .map_or(true, |u| matches_underlying(underlying, u))
        })
        .filter(|row| {
            if issuers.is_empty() {
                return true;
            }
            let issuer = row.issuer.as_deref().unwrap_or("").to_lowercase();
            issuers.iter().any(|f| issuer.contains(f.as_str()))
        })
        .cloned()
        .collect()
}

/// Normalize rows for the engine.
///
/// Rows that cannot be normalized are dropped, and so are rows whose
/// published barrier is already breached at `entry_price` or would be hit
/// before `stop_price`.
pub fn to_instruments(
    rows: &[MiniFuture],
    entry_price: Decimal,
    stop_price: Decimal,
    default_side: Direction,
) -> Vec<Instrument> {
    let instruments: Vec<Instrument> = rows
        .iter()
        .filter_map(|row| row.to_instrument(entry_price, default_side))
        .filter(|instrument| match barrier_rejection(instrument, entry_price, stop_price) {
            None => true,
            Some(reason) => {
                debug!(
                    identifier = %instrument.identifier,
                    knock_out = ?instrument.knock_out,
                    reason,
                    "Dropping row on issuer barrier"
                );
                false
            }
        })
        .collect();
    debug!(rows = rows.len(), instruments = instruments.len(), "Normalized catalog rows");
    instruments
}

/// Check the issuer's stop-loss barrier against the plan.
///
/// Long: the barrier must sit below the entry and at or below the stop.
/// Short mirrors it. Rows without a barrier pass.
pub fn barrier_rejection(instrument: &Instrument, entry_price: Decimal, stop_price: Decimal) -> Option<&'static str> {
    let knock_out = instrument.knock_out?;
    let sign = instrument.side.sign();

    let breached = entry_price
        .checked_sub(knock_out)
        .map_or(true, |gap| sign * gap <= Decimal::ZERO);
    if breached {
        return Some("barrier already breached at entry");
    }

    let beyond_stop = stop_price
        .checked_sub(knock_out)
        .map_or(true, |gap| sign * gap < Decimal::ZERO);
    if beyond_stop {
        return Some("barrier beyond stop");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(underlying: Option<&str>, issuer: Option<&str>) -> MiniFuture {
        MiniFuture {
            symbol: Some("X".to_string()),
            underlying: underlying.map(str::to_string),
            issuer: issuer.map(str::to_string),
            ratio: Some(dec!(10)),
            financing_level: Some(dec!(90)),
            ask: Some(dec!(1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_matches_underlying_tokens() {
        assert!(matches_underlying("omx 30", "OMX Stockholm 30"));
        assert!(!matches_underlying("omx 25", "OMX Stockholm 30"));
        assert!(matches_underlying("", "anything"));
    }

    #[test]
    fn test_filter_rows() {
        let rows = vec![
            row(Some("OMX Stockholm 30"), Some("Vontobel")),
            row(Some("DAX"), Some("Vontobel")),
            row(None, Some("Societe Generale")),
            row(Some("OMXS30"), None),
        ];

        assert_eq!(filter_rows(&rows, "omx", &[]).len(), 3);
        assert_eq!(filter_rows(&rows, "omx", &["vonto".to_string()]).len(), 1);
    }

    #[test]
    fn test_source_precedence() {
        let mut config = SourceConfig::default();
        assert!(matches!(CatalogSource::from_config(&config), Err(SourceError::MissingSource)));

        config.url = Some("https://example.com/export.csv".to_string());
        assert!(matches!(CatalogSource::from_config(&config), Ok(CatalogSource::Download { .. })));

        config.csv_path = Some(PathBuf::from("export.csv"));
        assert!(matches!(CatalogSource::from_config(&config), Ok(CatalogSource::CsvFile(_))));

        config.use_api = true;
        assert!(matches!(CatalogSource::from_config(&config), Ok(CatalogSource::Api(_))));
    }

    #[test]
    fn test_to_instruments_drops_unusable() {
        let mut bad = row(Some("OMX"), None);
        bad.ratio = None;
        let instruments = to_instruments(&[row(Some("OMX"), None), bad], dec!(100), dec!(95), Direction::Long);
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].parity_or_multiplier, dec!(10));
    }

    fn with_barrier(id: &str, side: Direction, financing: Decimal, knock_out: Decimal) -> MiniFuture {
        MiniFuture {
            symbol: Some(id.to_string()),
            side: Some(side),
            ratio: Some(dec!(10)),
            financing_level: Some(financing),
            knock_out: Some(knock_out),
            ask: Some(dec!(1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_barrier_beyond_stop_is_dropped() {
        // Financing is safe but the issuer knocks out at 93, before the stop at 92.
        let rows = vec![
            with_barrier("KO93", Direction::Long, dec!(90), dec!(93)),
            with_barrier("KO91", Direction::Long, dec!(90), dec!(91)),
            with_barrier("KO92", Direction::Long, dec!(90), dec!(92)),
        ];

        let instruments = to_instruments(&rows, dec!(100), dec!(92), Direction::Long);
        let ids: Vec<&str> = instruments.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["KO91", "KO92"]);
        assert_eq!(instruments[0].knock_out, Some(dec!(91)));
    }

    #[test]
    fn test_breached_barrier_is_dropped() {
        let long = with_barrier("L", Direction::Long, dec!(90), dec!(101));
        let short = with_barrier("S", Direction::Short, dec!(120), dec!(99));
        let short_ok = with_barrier("S-OK", Direction::Short, dec!(120), dec!(115));

        assert!(to_instruments(&[long], dec!(100), dec!(95), Direction::Long).is_empty());

        let kept = to_instruments(&[short, short_ok], dec!(100), dec!(110), Direction::Short);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].identifier, "S-OK");
    }

    #[test]
    fn test_barrier_rejection_reasons() {
        let mut inst = Instrument::new("X", "OMX", Direction::Long, dec!(90), dec!(10), dec!(1));
        assert_eq!(barrier_rejection(&inst, dec!(100), dec!(95)), None);

        inst.knock_out = Some(dec!(100));
        assert_eq!(barrier_rejection(&inst, dec!(100), dec!(95)), Some("barrier already breached at entry"));

        inst.knock_out = Some(dec!(96));
        assert_eq!(barrier_rejection(&inst, dec!(100), dec!(95)), Some("barrier beyond stop"));
    }
}
