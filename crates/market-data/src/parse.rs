//! Parsers for the market's locale-formatted strings.
//!
//! Prices come back formatted for the requested currency and country
//! ("$1,234.56", "1.234,56€", "12,50 pуб."), volumes with thousands
//! separators, and history dates in the `"Jul 02 2014 01: +0"` shape.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// Currency markers mapped to ISO 4217 codes.
///
/// Ordered so that multi-character markers are matched before any marker
/// they contain ("CDN$" before "$", "R$" before "R").
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("CDN$", "CAD"),
    ("HK$", "HKD"),
    ("R$", "BRL"),
    ("A$", "AUD"),
    ("S$", "SGD"),
    ("pуб.", "RUB"),
    ("CHF", "CHF"),
    ("zł", "PLN"),
    ("kr", "SEK"),
    ("₽", "RUB"),
    ("₩", "KRW"),
    ("₴", "UAH"),
    ("฿", "THB"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("$", "USD"),
    ("R", "ZAR"),
];

/// Map the currency marker in a formatted price to its ISO code.
pub fn extract_currency(price: &str) -> Option<&'static str> {
    if price.is_empty() {
        return None;
    }
    CURRENCY_MARKERS
        .iter()
        .find(|(marker, _)| price.contains(marker))
        .map(|(_, code)| *code)
}

/// Parse a formatted price into a decimal.
///
/// Handles both separator conventions. When only a comma is present it is
/// read as a decimal separator if exactly two digits follow it, otherwise as
/// a thousands separator.
pub fn parse_steam_price(price: &str) -> Option<Decimal> {
    let numeric: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    let numeric = numeric.trim_matches(|c| c == ',' || c == '.');
    if numeric.is_empty() {
        return None;
    }

    let normalized = match (numeric.rfind(','), numeric.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => numeric.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => numeric.replace(',', ""),
        (Some(_), None) => {
            let decimals = numeric.rsplit(',').next().map(str::len).unwrap_or(0);
            if decimals == 2 {
                numeric.replace(',', ".")
            } else {
                numeric.replace(',', "")
            }
        }
        (None, _) => numeric.to_string(),
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse a formatted volume ("1,234") into an integer.
pub fn parse_volume(volume: &str) -> Option<i64> {
    let cleaned: String = volume
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.'))
        .collect();
    cleaned.parse().ok()
}

/// Parse a history date such as `"Jul 02 2014 01: +0"` into UTC.
///
/// The trailing offset is always `+0` in practice and is ignored.
pub fn parse_steam_datetime(date: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }

    let hour = parts[3].trim_end_matches(':');
    let clean = format!("{} {} {} {}:00", parts[0], parts[1], parts[2], hour);
    NaiveDateTime::parse_from_str(&clean, "%b %d %Y %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Split a formatted price into its value and ISO currency.
pub fn parse_price_and_currency(price: &str) -> (Option<Decimal>, Option<&'static str>) {
    let price = price.trim();
    if price.is_empty() {
        return (None, None);
    }
    match parse_steam_price(price) {
        Some(value) => (Some(value), extract_currency(price)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_us_prices() {
        assert_eq!(parse_steam_price("$5.00"), Some(dec!(5.00)));
        assert_eq!(parse_steam_price("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_steam_price("CDN$ 0.42"), Some(dec!(0.42)));
    }

    #[test]
    fn test_parse_european_prices() {
        assert_eq!(parse_steam_price("0,03€"), Some(dec!(0.03)));
        assert_eq!(parse_steam_price("1.234,56€"), Some(dec!(1234.56)));
        assert_eq!(parse_steam_price("12,50 pуб."), Some(dec!(12.50)));
    }

    #[test]
    fn test_parse_comma_thousands() {
        assert_eq!(parse_steam_price("1,000"), Some(dec!(1000)));
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert_eq!(parse_steam_price(""), None);
        assert_eq!(parse_steam_price("--"), None);
        assert_eq!(parse_steam_price("€"), None);
    }

    #[test]
    fn test_extract_currency() {
        assert_eq!(extract_currency("$5.00"), Some("USD"));
        assert_eq!(extract_currency("R$ 5,00"), Some("BRL"));
        assert_eq!(extract_currency("CDN$ 5.00"), Some("CAD"));
        assert_eq!(extract_currency("0,03€"), Some("EUR"));
        assert_eq!(extract_currency("12,50 pуб."), Some("RUB"));
        assert_eq!(extract_currency("12.50"), None);
        assert_eq!(extract_currency(""), None);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume("435"), Some(435));
        assert_eq!(parse_volume("1,234"), Some(1234));
        assert_eq!(parse_volume(" 12 "), Some(12));
        assert_eq!(parse_volume("many"), None);
    }

    #[test]
    fn test_parse_steam_datetime() {
        assert_eq!(
            parse_steam_datetime("Jul 02 2014 01: +0"),
            Some(Utc.with_ymd_and_hms(2014, 7, 2, 1, 0, 0).unwrap())
        );
        assert_eq!(
            parse_steam_datetime("Dec 25 2023 14: +0"),
            Some(Utc.with_ymd_and_hms(2023, 12, 25, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_steam_datetime_rejects_malformed() {
        assert_eq!(parse_steam_datetime(""), None);
        assert_eq!(parse_steam_datetime("Jul 02 2014"), None);
        assert_eq!(parse_steam_datetime("Foo 02 2014 01: +0"), None);
        assert_eq!(parse_steam_datetime("Jul 32 2014 01: +0"), None);
    }

    #[test]
    fn test_parse_price_and_currency() {
        assert_eq!(
            parse_price_and_currency("  0,85€ "),
            (Some(dec!(0.85)), Some("EUR"))
        );
        assert_eq!(parse_price_and_currency("£5.99"), (Some(dec!(5.99)), Some("GBP")));
        assert_eq!(parse_price_and_currency(""), (None, None));
    }
}
