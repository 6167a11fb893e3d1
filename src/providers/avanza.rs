//! Underlying price lookup through Avanza, with a fallback endpoint.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::models::UnderlyingPrice;

use super::http::{self, ensure_ok, send_with_retry};
use super::types::{MarketGuideResponse, PriceChartResponse};
use super::SourceError;

const AVANZA_BASE: &str = "https://www.avanza.se/_api";

/// Anything that can quote an instrument by vendor id.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs and error details.
    fn name(&self) -> &'static str;

    async fn fetch_price(&self, instrument_id: &str) -> Result<UnderlyingPrice, SourceError>;
}

/// Last trade from the market-guide quote.
pub struct MarketGuideSource {
    client: Client,
    base_url: String,
}

impl MarketGuideSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(AVANZA_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client()?,
            base_url,
        })
    }
}

#[async_trait]
impl PriceSource for MarketGuideSource {
    fn name(&self) -> &'static str {
        "market-guide"
    }

    async fn fetch_price(&self, instrument_id: &str) -> Result<UnderlyingPrice, SourceError> {
        let url = format!("{}/market-guide/stock/{}", self.base_url, instrument_id);
        debug!(url = %url, "Fetching market-guide quote");

        let response = send_with_retry(&url, || self.client.get(&url).header(ACCEPT, "application/json")).await?;
        let body: MarketGuideResponse = ensure_ok(response, "Avanza market guide", "Check --avanza-id.")?
            .json()
            .await
            .map_err(|e| SourceError::parse("Avanza market guide", e.to_string()))?;

        let price = body
            .quote
            .and_then(|q| q.last)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| SourceError::parse("Avanza market guide", "quote has no last price"))?;

        Ok(UnderlyingPrice {
            name: body.name.unwrap_or_else(|| format!("Avanza:{}", instrument_id)),
            price,
            currency: body.listing.and_then(|l| l.currency),
            source: "avanza".to_string(),
            as_of: Utc::now(),
        })
    }
}

/// Latest close from today's price chart.
pub struct PriceChartSource {
    client: Client,
    base_url: String,
}

impl PriceChartSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(AVANZA_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client()?,
            base_url,
        })
    }
}

#[async_trait]
impl PriceSource for PriceChartSource {
    fn name(&self) -> &'static str {
        "price-chart"
    }

    async fn fetch_price(&self, instrument_id: &str) -> Result<UnderlyingPrice, SourceError> {
        let url = format!("{}/price-chart/stock/{}", self.base_url, instrument_id);
        debug!(url = %url, "Fetching price chart");

        let response = send_with_retry(&url, || {
            self.client
                .get(&url)
                .query(&[("timePeriod", "today")])
                .header(ACCEPT, "application/json")
        })
        .await?;
        let body: PriceChartResponse = ensure_ok(response, "Avanza price chart", "Check --avanza-id.")?
            .json()
            .await
            .map_err(|e| SourceError::parse("Avanza price chart", e.to_string()))?;

        let price = body
            .ohlc
            .last()
            .map(|c| c.close)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| SourceError::parse("Avanza price chart", "no candles today"))?;

        Ok(UnderlyingPrice {
            name: format!("Avanza:{}", instrument_id),
            price,
            currency: None,
            source: "avanza".to_string(),
            as_of: Utc::now(),
        })
    }
}

/// Tries each source in order and returns the first price.
pub struct PriceLookup {
    sources: Vec<Box<dyn PriceSource>>,
}

impl PriceLookup {
    pub fn new(sources: Vec<Box<dyn PriceSource>>) -> Self {
        Self { sources }
    }

    /// Market guide first, price chart as fallback.
    pub fn avanza() -> Result<Self, SourceError> {
        Ok(Self::new(vec![
            Box::new(MarketGuideSource::new()?),
            Box::new(PriceChartSource::new()?),
        ]))
    }

    pub async fn fetch(&self, instrument_id: &str) -> Result<UnderlyingPrice, SourceError> {
        let mut errors = Vec::new();

        for source in &self.sources {
            match source.fetch_price(instrument_id).await {
                Ok(price) => {
                    info!(source = source.name(), price = %price.price, name = %price.name, "Fetched underlying price");
                    return Ok(price);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Price source failed");
                    errors.push(format!("{} failed: {}", source.name(), e));
                }
            }
        }

        if errors.is_empty() {
            errors.push("no price sources configured".to_string());
        }
        Err(SourceError::PriceUnavailable(errors.join(" | ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Fixed(&'static str, Option<Decimal>);

    #[async_trait]
    impl PriceSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch_price(&self, id: &str) -> Result<UnderlyingPrice, SourceError> {
            match self.1 {
                Some(p) => Ok(UnderlyingPrice::manual(id, p)),
                None => Err(SourceError::parse("fixture", "down")),
            }
        }
    }

    #[test]
    fn test_falls_back_to_second_source() {
        let lookup = PriceLookup::new(vec![
            Box::new(Fixed("first", None)),
            Box::new(Fixed("second", Some(dec!(2301.5)))),
        ]);

        let price = tokio_test::block_on(lookup.fetch("5447")).unwrap();
        assert_eq!(price.price, dec!(2301.5));
    }

    #[test]
    fn test_all_sources_failing_reports_each() {
        let lookup = PriceLookup::new(vec![Box::new(Fixed("a", None)), Box::new(Fixed("b", None))]);

        let err = tokio_test::block_on(lookup.fetch("5447")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a failed"));
        assert!(message.contains("b failed"));
        assert!(message.contains("--price"));
    }

    #[test]
    fn test_market_guide_payload() {
        let body: MarketGuideResponse = serde_json::from_str(
            r#"{"name":"OMX Stockholm 30","listing":{"currency":"SEK"},"quote":{"last":2301.25}}"#,
        )
        .unwrap();
        assert_eq!(body.quote.and_then(|q| q.last), Some(dec!(2301.25)));
        assert_eq!(body.listing.and_then(|l| l.currency).as_deref(), Some("SEK"));
    }
}
