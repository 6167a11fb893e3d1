//! Trade direction shared by risk plans and instruments.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which way of the underlying a plan or an instrument profits from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Derive the direction of a plan from its entry and stop.
    ///
    /// Returns `None` when the two levels are equal.
    pub fn from_levels(entry: Decimal, stop: Decimal) -> Option<Self> {
        match entry.cmp(&stop) {
            std::cmp::Ordering::Greater => Some(Self::Long),
            std::cmp::Ordering::Less => Some(Self::Short),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// +1 for long, -1 for short. Every mirrored formula multiplies by this.
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Interpret vendor labels such as "Bull", "Mini Long" or "BEAR".
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.to_lowercase();
        if lowered.contains("bull") || lowered.contains("long") {
            Some(Self::Long)
        } else if lowered.contains("bear") || lowered.contains("short") {
            Some(Self::Short)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
