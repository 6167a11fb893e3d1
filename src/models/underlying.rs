//! Quote for the underlying asset.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price of the underlying with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingPrice {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    /// "manual" or the lookup that produced it
    pub source: String,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
}

impl UnderlyingPrice {
    /// A price typed in by the user.
    pub fn manual(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            currency: None,
            source: "manual".to_string(),
            as_of: Utc::now(),
        }
    }
}
