//! Selection engine: take-profit, filtering, ranking, sizing and shortlisting.
//!
//! Pure and synchronous. Callers hand in a validated-or-not [`RiskProfile`]
//! and a borrowed instrument list; nothing is retained after the call.
//!
//! [`RiskProfile`]: crate::models::RiskProfile

mod config;
mod engine;
mod error;
mod filter;
mod position_sizer;
mod ranker;
mod shortlist;
pub mod take_profit;

pub use config::SelectionConfig;
pub use engine::{select, select_with};
pub use error::{EngineError, Result};
pub use filter::{Exclusion, ExclusionReason};
pub use position_sizer::{PositionSizer, SizedCandidate};
pub use shortlist::ShortlistReport;
pub use take_profit::TradeTarget;
