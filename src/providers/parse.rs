//! Tolerant header and number parsing for vendor exports.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Lowercase and drop everything but letters and digits.
pub fn normalize_header(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first header matching any of the aliases, in alias order.
pub fn pick_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    aliases.iter().find_map(|alias| {
        let key = normalize_header(alias);
        normalized.iter().position(|h| *h == key)
    })
}

/// Parse a number in any of the common European or US notations.
///
/// Accepts `1'234.5`, `1 234,5`, `1.234,5` and `1,234.5`. The separator that
/// appears last is taken as the decimal point.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\'' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        }
        (Some(_), Some(_)) => {
            cleaned = cleaned.replace(',', "");
        }
        (Some(_), None) => {
            cleaned = cleaned.replace(',', ".");
        }
        _ => {}
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Knock-Out Level "), "knockoutlevel");
        assert_eq!(normalize_header("Long/Short"), "longshort");
    }

    #[test]
    fn test_pick_column_uses_alias_order() {
        let headers = vec!["Strike".to_string(), "Financing Level".to_string()];
        assert_eq!(pick_column(&headers, &["Financing Level", "Strike"]), Some(1));
        assert_eq!(pick_column(&headers, &["Bid"]), None);
    }

    #[test]
    fn test_parse_number_notations() {
        assert_eq!(parse_number("1'234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("8,34"), Some(dec!(8.34)));
        assert_eq!(parse_number(" 10 "), Some(dec!(10)));
        assert_eq!(parse_number("1e-2"), Some(dec!(0.01)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }
}
