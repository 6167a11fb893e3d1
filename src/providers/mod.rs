//! Data-source adapters: underlying price lookup and instrument catalogs.
//!
//! Everything here runs before the selection engine and hands it plain values.

pub mod avanza;
pub mod catalog;
mod error;
mod http;
pub mod parse;
mod types;
pub mod vontobel;
pub mod vontobel_api;

pub use avanza::{PriceLookup, PriceSource};
pub use catalog::CatalogSource;
pub use error::SourceError;
