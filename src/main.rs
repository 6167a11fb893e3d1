//! Strike Selector
//!
//! Picks the mini future whose knock-out sits closest to a planned stop,
//! and sizes the position so a stop-out loses the chosen risk amount.

mod config;
mod models;
mod providers;
mod report;
mod selection;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{EnvLayers, SourceArgs, SourceConfig};
use crate::models::{RiskProfile, UnderlyingPrice};
use crate::providers::catalog::{filter_rows, to_instruments};
use crate::providers::vontobel::DEFAULT_URL;
use crate::providers::vontobel_api::{
    VontobelApiConfig, DEFAULT_API_BASE_URL, DEFAULT_CULTURE, DEFAULT_INVESTOR_TYPE, DEFAULT_PAGE_SIZE,
};
use crate::providers::{CatalogSource, PriceLookup, SourceError};
use crate::report::{Shortlist, Summary};
use crate::selection::{select_with, take_profit, EngineError, SelectionConfig, TradeTarget};

const EXIT_INVALID_PARAMETERS: u8 = 2;
const EXIT_NO_CANDIDATES: u8 = 3;
const EXIT_SOURCE_FAILURE: u8 = 4;

/// Mini future strike selector CLI.
#[derive(Parser, Debug)]
#[command(name = "strike-selector")]
#[command(about = "Pick and size the mini future closest to your stop", long_about = None)]
struct Cli {
    /// Manual underlying price
    #[arg(long, required_unless_present = "avanza_id")]
    price: Option<Decimal>,

    /// Avanza instrument id used to look up the underlying price
    #[arg(long)]
    avanza_id: Option<String>,

    /// Underlying name filter
    #[arg(long)]
    underlying: String,

    /// Risk amount in account currency
    #[arg(long)]
    risk: Decimal,

    /// Underlying stop price
    #[arg(long)]
    stop: Decimal,

    /// Risk:reward multiple
    #[arg(long, default_value = "2")]
    rr: Decimal,

    /// Explicit take-profit price
    #[arg(long)]
    take_profit: Option<Decimal>,

    /// Issuer filter (repeatable)
    #[arg(long)]
    issuer: Vec<String>,

    /// Maximum rows to show
    #[arg(long, default_value = "3")]
    limit: usize,

    /// Filter out spreads above this
    #[arg(long)]
    max_spread: Option<Decimal>,

    /// Filter out leverage below this
    #[arg(long)]
    min_leverage: Option<Decimal>,

    /// Filter out leverage above this
    #[arg(long)]
    max_leverage: Option<Decimal>,

    /// Drop instruments that lose money even at the take-profit
    #[arg(long)]
    require_profit: bool,

    /// Fetch mini futures from Vontobel's product overview API
    #[arg(long)]
    vontobel_api: bool,

    /// Base URL of the Vontobel API
    #[arg(long, default_value = DEFAULT_API_BASE_URL, hide = true)]
    vontobel_api_url: String,

    /// Culture code for the Vontobel API (e.g. en-se, sv-se)
    #[arg(long, default_value = DEFAULT_CULTURE)]
    vontobel_culture: String,

    /// Investor type for the Vontobel API (1 = private, 2 = professional)
    #[arg(long, default_value_t = DEFAULT_INVESTOR_TYPE)]
    vontobel_investor_type: u32,

    /// Page size for the Vontobel API
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    vontobel_page_size: u32,

    /// Path to a Vontobel CSV export
    #[arg(long)]
    vontobel_csv: Option<PathBuf>,

    /// Download the Vontobel CSV (optionally from a specific URL)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_URL)]
    vontobel_url: Option<String>,

    /// Read the Vontobel CSV URL from a file
    #[arg(long)]
    vontobel_url_file: Option<PathBuf>,

    /// Cookie string for Vontobel (use if a disclaimer blocks the download)
    #[arg(long)]
    vontobel_cookie: Option<String>,

    /// Read the Vontobel cookie string from a file
    #[arg(long)]
    vontobel_cookie_file: Option<PathBuf>,

    /// Env file with VONTOBEL_URL / VONTOBEL_COOKIE
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STRIKE_SELECTOR_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn source_args(&self) -> SourceArgs {
        SourceArgs {
            use_api: self.vontobel_api,
            api: VontobelApiConfig {
                base_url: self.vontobel_api_url.clone(),
                culture: self.vontobel_culture.clone(),
                investor_type: self.vontobel_investor_type,
                page_size: self.vontobel_page_size,
            },
            csv_path: self.vontobel_csv.clone(),
            url: self.vontobel_url.clone(),
            url_file: self.vontobel_url_file.clone(),
            cookie: self.vontobel_cookie.clone(),
            cookie_file: self.vontobel_cookie_file.clone(),
        }
    }

    /// Build and check every engine parameter, before any catalog I/O.
    fn plan(&self, entry_price: Decimal) -> selection::Result<(RiskProfile, TradeTarget, SelectionConfig)> {
        let mut profile = RiskProfile::new(self.underlying.clone(), entry_price, self.stop, self.risk, self.rr);
        if let Some(take_profit) = self.take_profit {
            profile = profile.with_take_profit(take_profit);
        }
        let target = take_profit::calculate(&profile)?;

        let config = self.selection_config();
        config.validate()?;
        Ok((profile, target, config))
    }

    fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            top_n: self.limit,
            max_spread: self.max_spread,
            min_leverage: self.min_leverage,
            max_leverage: self.max_leverage,
            require_profit: self.require_profit,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays clean
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {}", e);
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let underlying = resolve_price(cli).await?;
    let (profile, target, selection_config) = cli.plan(underlying.price)?;

    let env = EnvLayers::load(&cli.env_file)?;
    let source = CatalogSource::from_config(&SourceConfig::resolve(cli.source_args(), &env)?)?;
    let rows = source
        .load()
        .await
        .with_context(|| format!("Failed to load catalog from {}", source.describe()))?;
    let matched = filter_rows(&rows, &cli.underlying, &cli.issuer);
    info!(
        loaded = rows.len(),
        matched = matched.len(),
        underlying = %cli.underlying,
        "Catalog narrowed to underlying"
    );

    let summary = Summary {
        underlying: &underlying,
        stop: profile.stop_price,
        take_profit: target.take_profit_price,
        direction: target.direction,
        loaded: rows.len(),
        matched: matched.len(),
    };
    println!("{}", summary);

    let instruments = to_instruments(&matched, profile.entry_price, profile.stop_price, target.direction);
    let report = match select_with(&profile, &instruments, &selection_config) {
        Ok(report) => report,
        Err(err @ EngineError::NoCandidates { .. }) => {
            println!("No candidates matched your filters.");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    print!("{}", Shortlist(&report));
    Ok(())
}

async fn resolve_price(cli: &Cli) -> Result<UnderlyingPrice> {
    if let Some(price) = cli.price {
        return Ok(UnderlyingPrice::manual(cli.underlying.clone(), price));
    }

    let Some(avanza_id) = &cli.avanza_id else {
        return Err(EngineError::invalid("price", "provide --price or --avanza-id").into());
    };

    let lookup = PriceLookup::avanza()?;
    let mut price = lookup.fetch(avanza_id).await?;
    if price.price <= dec!(0) {
        return Err(SourceError::PriceUnavailable(format!("{} returned {}", price.source, price.price)).into());
    }
    price.name = cli.underlying.clone();
    info!(price = %price.price, source = %price.source, "Underlying price resolved");
    Ok(price)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(engine) = err.downcast_ref::<EngineError>() {
        return match engine {
            EngineError::InvalidParameters { .. } => EXIT_INVALID_PARAMETERS,
            EngineError::NoCandidates { .. } => EXIT_NO_CANDIDATES,
            EngineError::DegenerateSizing { .. } => 1,
        };
    }
    if err.downcast_ref::<SourceError>().is_some() {
        return EXIT_SOURCE_FAILURE;
    }
    1
}
