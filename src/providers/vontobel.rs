//! Vontobel product-download CSV: fetching past the disclaimer page and parsing the export.

use std::path::Path;
use std::sync::OnceLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::models::{Direction, MiniFuture};

use super::http::{self, ensure_ok, read_text, send_with_retry};
use super::parse::{parse_number, pick_column};
use super::SourceError;

pub const DEFAULT_URL: &str = "https://markets.vontobel.com/en-ch/product-download";
pub const DEFAULT_CSV_URL: &str = "https://markets.vontobel.com/cms/productdownload/export_en-ch-csv";
const DEFAULT_REFERER: &str = "https://markets.vontobel.com/en-ch/product-download";

const STATUS_HINT: &str = "Try a different --vontobel-url or pass --vontobel-cookie.";

fn csv_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)href=["']([^"']*csv[^"']*)["']"#).expect("csv link pattern is valid")
    })
}

/// Result of parsing a downloaded or local catalog body.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogParse {
    /// Mini future rows; non-mini products already dropped
    Rows(Vec<MiniFuture>),
    /// The body is a disclaimer page, not an export
    NeedsInteractiveConsent,
    ParseError(String),
}

impl CatalogParse {
    pub fn into_rows(self) -> Result<Vec<MiniFuture>, SourceError> {
        match self {
            CatalogParse::Rows(rows) => Ok(rows),
            CatalogParse::NeedsInteractiveConsent => Err(SourceError::NeedsInteractiveConsent),
            CatalogParse::ParseError(reason) => Err(SourceError::parse("Vontobel CSV", reason)),
        }
    }
}

/// A CSV body with the URL it finally came from.
#[derive(Debug, Clone)]
pub struct CsvDownload {
    pub csv_text: String,
    pub source_url: String,
}

/// Client for the Vontobel CSV export.
pub struct VontobelProvider {
    client: Client,
    url: String,
    referer: String,
    cookie: Option<String>,
}

impl VontobelProvider {
    pub fn new(url: Option<String>, cookie: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client()?,
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            referer: DEFAULT_REFERER.to_string(),
            cookie,
        })
    }

    /// Download the export, following a CSV link if the URL is an HTML page.
    pub async fn download_csv(&self) -> Result<CsvDownload, SourceError> {
        info!(url = %self.url, "Downloading Vontobel catalog");

        let response = send_with_retry(&self.url, || self.get(&self.url, &self.referer)).await?;
        let body = read_text(ensure_ok(response, "Vontobel download", STATUS_HINT)?).await?;

        if !looks_like_html(&body) {
            return Ok(CsvDownload {
                csv_text: body,
                source_url: self.url.clone(),
            });
        }

        match extract_csv_link(&body, &self.url) {
            Some(link) => {
                debug!(link = %link, "Following CSV link from download page");
                let response = send_with_retry(&link, || self.get(&link, &self.url)).await?;
                let text = read_text(ensure_ok(response, "Vontobel CSV download", STATUS_HINT)?).await?;
                if looks_like_html(&text) {
                    return Err(SourceError::NeedsInteractiveConsent);
                }
                Ok(CsvDownload {
                    csv_text: text,
                    source_url: link,
                })
            }
            None => {
                debug!("No CSV link on download page, trying default export");
                let response =
                    send_with_retry(DEFAULT_CSV_URL, || self.get(DEFAULT_CSV_URL, &self.referer)).await?;
                if !response.status().is_success() {
                    return Err(SourceError::NeedsInteractiveConsent);
                }
                let text = read_text(response).await?;
                if looks_like_html(&text) {
                    return Err(SourceError::NeedsInteractiveConsent);
                }
                Ok(CsvDownload {
                    csv_text: text,
                    source_url: DEFAULT_CSV_URL.to_string(),
                })
            }
        }
    }

    /// Download and parse in one go.
    pub async fn fetch_all(&self) -> Result<Vec<MiniFuture>, SourceError> {
        let download = self.download_csv().await?;
        let rows = parse_csv(&download.csv_text).into_rows()?;
        info!(rows = rows.len(), source = %download.source_url, "Loaded Vontobel CSV");
        Ok(rows)
    }

    fn get(&self, url: &str, referer: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "text/csv,application/csv,text/plain,*/*")
            .header(ACCEPT_LANGUAGE, "en-CH,en;q=0.8")
            .header(REFERER, referer);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        request
    }
}

/// Read and parse a locally saved export.
pub fn load_csv_file(path: &Path) -> Result<Vec<MiniFuture>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_csv(&text).into_rows()?;
    info!(rows = rows.len(), path = %path.display(), "Loaded Vontobel CSV file");
    Ok(rows)
}

/// Parse an export body.
pub fn parse_csv(text: &str) -> CatalogParse {
    let text = text.trim_start_matches('\u{feff}');
    if looks_like_html(text) {
        return CatalogParse::NeedsInteractiveConsent;
    }

    let (delimiter, body) = split_sep_prefix(text);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(body));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_string).collect(),
        Err(e) => return CatalogParse::ParseError(format!("unreadable header row: {}", e)),
    };
    if headers.len() < 3 {
        return CatalogParse::ParseError(
            "too few header columns; if you used --vontobel-url, download the CSV manually and pass --vontobel-csv"
                .to_string(),
        );
    }

    let columns = ColumnMap::from_headers(&headers);
    let mut rows = Vec::new();
    let mut data_rows = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => return CatalogParse::ParseError(format!("bad row {}: {}", data_rows + 1, e)),
        };
        data_rows += 1;
        if let Some(mini) = columns.row_to_mini(&record) {
            rows.push(mini);
        }
    }

    if data_rows == 0 {
        return CatalogParse::ParseError(
            "no data rows; the download may be blocked by a disclaimer, try --vontobel-cookie or --vontobel-csv"
                .to_string(),
        );
    }
    CatalogParse::Rows(rows)
}

struct ColumnMap {
    isin: Option<usize>,
    symbol: Option<usize>,
    name: Option<usize>,
    issuer: Option<usize>,
    product_type: Option<usize>,
    direction: Option<usize>,
    underlying: Option<usize>,
    ratio: Option<usize>,
    financing_level: Option<usize>,
    knock_out: Option<usize>,
    bid: Option<usize>,
    ask: Option<usize>,
    currency: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        Self {
            isin: pick_column(headers, &["ISIN"]),
            symbol: pick_column(headers, &["Symbol", "Ticker", "Trading Symbol"]),
            name: pick_column(headers, &["Product Name", "Name"]),
            issuer: pick_column(headers, &["Issuer", "Issuer Name", "Emitter"]),
            product_type: pick_column(headers, &["Product Type", "Type", "Product Category"]),
            direction: pick_column(headers, &["Direction", "Long/Short"]),
            underlying: pick_column(headers, &["Underlying", "Underlying Name", "Underlying Description"]),
            ratio: pick_column(headers, &["Ratio", "Conversion Ratio", "Multiplier"]),
            financing_level: pick_column(headers, &["Financing Level", "Financing", "Strike", "Strike Level"]),
            knock_out: pick_column(headers, &["Knock-Out", "Knock Out", "Stop Loss", "Barrier"]),
            bid: pick_column(headers, &["Bid", "Bid Price"]),
            ask: pick_column(headers, &["Ask", "Ask Price", "Offer"]),
            currency: pick_column(headers, &["Currency", "Product Currency"]),
        }
    }

    fn row_to_mini(&self, record: &StringRecord) -> Option<MiniFuture> {
        let text = |col: Option<usize>| -> Option<String> {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |col: Option<usize>| text(col).and_then(|s| parse_number(&s));

        let product_type = text(self.product_type);
        if let Some(pt) = &product_type {
            if !pt.to_lowercase().contains("mini") {
                return None;
            }
        }

        let side = text(self.direction)
            .and_then(|d| Direction::from_label(&d))
            .or_else(|| product_type.as_deref().and_then(Direction::from_label));

        Some(MiniFuture {
            isin: text(self.isin),
            symbol: text(self.symbol),
            name: text(self.name),
            issuer: text(self.issuer),
            side,
            underlying: text(self.underlying),
            ratio: number(self.ratio),
            financing_level: number(self.financing_level),
            knock_out: number(self.knock_out),
            bid: number(self.bid),
            ask: number(self.ask),
            last: None,
            currency: text(self.currency),
            source: "vontobel".to_string(),
        })
    }
}

/// Excel-style exports may start with a `sep=;` line naming the delimiter.
fn split_sep_prefix(text: &str) -> (Option<u8>, &str) {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let first = first.trim();
    if first.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("sep=")) {
        return (first.bytes().nth(4), rest);
    }
    (None, text)
}

/// Pick the most frequent delimiter in the header line.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    [b';', b'\t', b',', b'|']
        .into_iter()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(u8, usize)>, (d, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((d, count)),
        })
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

pub fn looks_like_html(text: &str) -> bool {
    let snippet: String = text.trim_start().chars().take(200).collect::<String>().to_lowercase();
    snippet.starts_with("<!doctype") || snippet.contains("<html")
}

/// First `href` mentioning "csv", resolved against `base_url`.
pub fn extract_csv_link(html: &str, base_url: &str) -> Option<String> {
    let href = csv_link_re().captures(html)?.get(1)?.as_str();
    if href.starts_with("//") {
        return Some(format!("https:{}", href));
    }
    match Url::parse(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Url::parse(base_url).ok()?.join(href).ok().map(|u| u.to_string()),
    }
}
