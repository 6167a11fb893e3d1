//! Data models for risk plans, instruments and vendor rows.

mod direction;
mod instrument;
mod mini_future;
mod risk_profile;
mod underlying;

pub use direction::Direction;
pub use instrument::Instrument;
pub use mini_future::MiniFuture;
pub use risk_profile::RiskProfile;
pub use underlying::UnderlyingPrice;
