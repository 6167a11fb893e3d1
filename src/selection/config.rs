//! Selection configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EngineError, Result};

/// Tunables for one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// How many ranked candidates to keep
    pub top_n: usize,

    /// Drop instruments whose ask-bid spread is wider than this
    pub max_spread: Option<Decimal>,

    /// Drop instruments with leverage below this
    pub min_leverage: Option<Decimal>,

    /// Drop instruments with leverage above this
    pub max_leverage: Option<Decimal>,

    /// Drop instruments that lose money per unit even at the target
    pub require_profit: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            max_spread: None,
            min_leverage: None,
            max_leverage: None,
            require_profit: false,
        }
    }
}

impl SelectionConfig {
    /// Shorthand for the default config with a different shortlist length.
    pub fn top(top_n: usize) -> Self {
        Self {
            top_n,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(EngineError::invalid("top_n", "must be at least 1"));
        }
        if let (Some(min), Some(max)) = (self.min_leverage, self.max_leverage) {
            if min > max {
                return Err(EngineError::invalid(
                    "leverage band",
                    format!("min {} is above max {}", min, max),
                ));
            }
        }
        if matches!(self.max_spread, Some(s) if s < Decimal::ZERO) {
            return Err(EngineError::invalid("max_spread", "must not be negative"));
        }
        Ok(())
    }
}
