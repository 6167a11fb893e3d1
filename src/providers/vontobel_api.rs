//! Vontobel product overview API, paginated.

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Direction, MiniFuture};

use super::http::{self, ensure_ok, send_with_retry};
use super::types::{ApiEnvelope, ProductItem, ProductPage, SearchRequest};
use super::SourceError;

pub const DEFAULT_API_BASE_URL: &str = "https://markets.vontobel.com/api";
pub const DEFAULT_CULTURE: &str = "en-se";
pub const DEFAULT_INVESTOR_TYPE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
const PRODUCT_TYPE_MINI_FUTURES: u32 = 2;

/// Connection settings for the product API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VontobelApiConfig {
    pub base_url: String,

    /// Culture code, e.g. "en-se" or "sv-se"
    pub culture: String,

    /// 1 = private, 2 = professional
    pub investor_type: u32,

    pub page_size: u32,
}

impl Default for VontobelApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            culture: DEFAULT_CULTURE.to_string(),
            investor_type: DEFAULT_INVESTOR_TYPE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Client for the product search endpoint.
pub struct VontobelApiProvider {
    client: Client,
    config: VontobelApiConfig,
}

impl VontobelApiProvider {
    pub fn new(config: VontobelApiConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client()?,
            config,
        })
    }

    /// Fetch every mini future page by page.
    pub async fn fetch_all(&self) -> Result<Vec<MiniFuture>, SourceError> {
        let page_size = self.config.page_size.max(1);
        let mut minis = Vec::new();
        let mut seen = 0usize;
        let mut total = None;
        let mut page = 0u32;

        loop {
            let payload = self.fetch_page(page, page_size).await?;
            total = payload.total_count.or(total);
            let count = payload.items.len();
            seen += count;

            minis.extend(payload.items.iter().filter_map(item_to_mini));
            debug!(page, items = count, seen, total = ?total, "Fetched product page");

            if is_last_page(count, seen, total, page_size) {
                break;
            }
            page += 1;
        }

        info!(products = minis.len(), pages = page + 1, "Loaded Vontobel API catalog");
        Ok(minis)
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ProductPage, SourceError> {
        let url = format!("{}/v1/products/search", self.config.base_url);
        let investor_type = self.config.investor_type.to_string();
        let body = SearchRequest {
            product_type: PRODUCT_TYPE_MINI_FUTURES,
            page,
            page_size,
        };

        let response = send_with_retry(&url, || {
            self.client
                .post(&url)
                .query(&[("c", self.config.culture.as_str()), ("it", investor_type.as_str())])
                .header(ACCEPT, "application/json")
                .json(&body)
        })
        .await?;
        let response = ensure_ok(
            response,
            "Vontobel API",
            "Check --vontobel-culture and --vontobel-investor-type, or use --vontobel-csv.",
        )?;

        let envelope: ApiEnvelope<ProductPage> = response
            .json()
            .await
            .map_err(|e| SourceError::parse("Vontobel API response", e.to_string()))?;
        if !envelope.is_success {
            let code = envelope
                .error_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(SourceError::parse("Vontobel API response", format!("error payload {}", code)));
        }
        Ok(envelope.payload.unwrap_or_default())
    }
}

/// Stop on an empty page, once `total` items were seen, or on a short page.
fn is_last_page(items: usize, seen: usize, total: Option<usize>, page_size: u32) -> bool {
    items == 0 || total.is_some_and(|t| seen >= t) || items < page_size as usize
}

/// Map one search item to a catalog row; malformed items are skipped.
pub fn item_to_mini(value: &serde_json::Value) -> Option<MiniFuture> {
    let item: ProductItem = match serde_json::from_value(value.clone()) {
        Ok(item) => item,
        Err(e) => {
            warn!(error = %e, "Skipping malformed product item");
            return None;
        }
    };

    let side = match item.direction {
        Some(1) => Some(Direction::Long),
        Some(2) => Some(Direction::Short),
        _ => None,
    };
    let price = item.price.unwrap_or_default();

    Some(MiniFuture {
        isin: item.isin,
        symbol: item.primary_identifier.and_then(|p| p.value),
        name: None,
        issuer: Some("Vontobel".to_string()),
        side,
        underlying: item.underlyings.into_iter().next().and_then(|u| u.name),
        ratio: item.ratio,
        financing_level: item.strike_level,
        knock_out: item.stop_loss,
        bid: price.bid,
        ask: price.ask,
        last: price.latest,
        currency: price.currency.or(item.currency),
        source: "vontobel_api".to_string(),
    })
}
