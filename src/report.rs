//! Console rendering of a selection run.

use std::fmt;

use rust_decimal::Decimal;

use crate::models::{Direction, UnderlyingPrice};
use crate::selection::{ShortlistReport, SizedCandidate};

const HEADERS: [&str; 13] = [
    "Issuer", "Symbol", "ISIN", "Dir", "Parity", "Financing", "KO", "Ask", "Bid", "Leverage", "KO dist",
    "Units", "Profit",
];

/// Plan and catalog figures printed above the result.
pub struct Summary<'a> {
    pub underlying: &'a UnderlyingPrice,
    pub stop: Decimal,
    pub take_profit: Decimal,
    pub direction: Direction,
    pub loaded: usize,
    pub matched: usize,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Underlying price: {} {} ({}, {})",
            fmt4(self.underlying.price),
            self.underlying.currency.as_deref().unwrap_or(""),
            self.underlying.source,
            self.underlying.as_of.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Stop: {}", fmt4(self.stop))?;
        writeln!(f, "Take profit: {}", fmt4(self.take_profit))?;
        writeln!(f, "Direction: {}", self.direction)?;
        writeln!(f, "Mini futures loaded: {}", self.loaded)?;
        writeln!(f, "Mini futures after filter: {}", self.matched)?;
        Ok(())
    }
}

/// Best pick block followed by the shortlist table and exclusion counts.
pub struct Shortlist<'a>(pub &'a ShortlistReport);

impl fmt::Display for Shortlist<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        if let Some(best) = report.best() {
            let inst = &best.instrument;
            writeln!(f, "Best pick:")?;
            writeln!(f, "  Issuer: {}", inst.issuer.as_deref().unwrap_or(""))?;
            writeln!(f, "  Symbol: {}", inst.symbol.as_deref().unwrap_or(&inst.identifier))?;
            writeln!(f, "  ISIN: {}", inst.isin.as_deref().unwrap_or(""))?;
            writeln!(f, "  Financing level: {}", fmt4(inst.finance_level))?;
            writeln!(f, "  Knock-out: {}", fmt4(inst.knock_out.unwrap_or(inst.finance_level)))?;
            writeln!(f, "  Distance to stop: {}", fmt4(best.distance_to_stop))?;
            writeln!(f, "  Leverage: {}", fmt4(best.leverage))?;
            writeln!(f, "  Stop in instrument terms: {}", fmt4(best.stop_in_instrument_terms))?;
            writeln!(f, "  Units to buy: {}", fmt4(best.units_affordable))?;
            writeln!(f, "  Est. profit at target: {}", fmt4(best.projected_profit))?;
            writeln!(f)?;
        }

        writeln!(f, "Top {} closest to stop:", report.candidates.len())?;
        write!(f, "{}", Table(&report.candidates))?;

        let counts = report.exclusion_counts();
        if !counts.is_empty() {
            let parts: Vec<String> = counts.iter().map(|(label, n)| format!("{} {}", n, label)).collect();
            writeln!(f)?;
            writeln!(f, "Excluded: {}", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Left-aligned table sized to its widest cell per column.
pub struct Table<'a>(pub &'a [SizedCandidate]);

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<[String; 13]> = self.0.iter().map(row).collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for r in &rows {
            for (w, cell) in widths.iter_mut().zip(r.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[&str]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(f, "{}", line(&HEADERS))?;
        writeln!(f, "{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "))?;
        for r in &rows {
            let cells: Vec<&str> = r.iter().map(String::as_str).collect();
            writeln!(f, "{}", line(&cells))?;
        }
        Ok(())
    }
}

fn row(c: &SizedCandidate) -> [String; 13] {
    let inst = &c.instrument;
    [
        inst.issuer.clone().unwrap_or_default(),
        inst.symbol.clone().unwrap_or_else(|| inst.identifier.clone()),
        inst.isin.clone().unwrap_or_default(),
        inst.side.to_string(),
        fmt4(inst.parity_or_multiplier),
        fmt4(inst.finance_level),
        fmt_opt(inst.knock_out),
        fmt_opt(inst.ask),
        fmt_opt(inst.bid),
        fmt4(c.leverage),
        fmt4(c.distance_to_stop),
        fmt4(c.units_affordable),
        fmt4(c.projected_profit),
    ]
}

fn fmt4(value: Decimal) -> String {
    format!("{:.4}", value)
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map(fmt4).unwrap_or_default()
}
