//! Wire types for the Vontobel product API and the Avanza market endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Envelope of every Vontobel API response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_true")]
    pub is_success: bool,
    #[serde(default)]
    pub error_code: Option<serde_json::Value>,
    pub payload: Option<T>,
}

fn default_true() -> bool {
    true
}

/// One page of the product search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    pub total_count: Option<usize>,
}

/// Product search item. Parsed leniently from a raw JSON value so one odd
/// item does not fail the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub isin: Option<String>,
    /// 1 = long, 2 = short
    pub direction: Option<i64>,
    #[serde(default)]
    pub underlyings: Vec<ProductUnderlying>,
    #[serde(default)]
    pub price: Option<ProductPrice>,
    pub currency: Option<String>,
    pub primary_identifier: Option<PrimaryIdentifier>,
    #[serde(default)]
    pub ratio: Option<Decimal>,
    #[serde(default)]
    pub strike_level: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUnderlying {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPrice {
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub latest: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimaryIdentifier {
    pub value: Option<String>,
}

/// Body of a product search request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub product_type: u32,
    pub page: u32,
    pub page_size: u32,
}

/// Avanza market-guide quote response.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketGuideResponse {
    pub name: Option<String>,
    pub listing: Option<Listing>,
    pub quote: Option<Quote>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub last: Option<Decimal>,
}

/// Avanza price-chart response.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceChartResponse {
    #[serde(default)]
    pub ohlc: Vec<Candle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candle {
    pub close: Decimal,
}
