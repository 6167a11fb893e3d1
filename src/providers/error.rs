//! Failures of the data-source adapters, phrased so the user knows what to try next.

use thiserror::Error;

/// Errors raised while fetching prices or catalogs.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{what} returned status {status}. {hint}")]
    Status {
        what: &'static str,
        status: u16,
        hint: &'static str,
    },

    #[error(
        "Vontobel returned HTML instead of CSV. Accept the disclaimer in a browser and pass \
         --vontobel-cookie, or download the export manually and pass --vontobel-csv."
    )]
    NeedsInteractiveConsent,

    #[error("Could not parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Could not fetch the underlying price, pass --price instead. Details: {0}")]
    PriceUnavailable(String),

    #[error("No instrument source given. Provide --vontobel-api, --vontobel-csv or --vontobel-url.")]
    MissingSource,

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn parse(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            what,
            reason: reason.into(),
        }
    }
}
