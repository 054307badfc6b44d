//! Parser for the HTML fragments in `itemordersactivity` responses.
//!
//! Each activity line is a small `<div>` with several
//! `market_activity_price` cells (usually only one is filled) and a
//! `market_activity_action` span ("Purchased", "Listed", ...).

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{ActivityEntry, OrdersActivity};
use crate::parse::parse_price_and_currency;

lazy_static! {
    /// Contents of every price cell, whitespace trimmed
    static ref PRICE_CELL_REGEX: Regex =
        Regex::new(r#"<span class="market_activity_cell market_activity_price[^"]*">\s*([^<]*?)\s*</span>"#)
            .expect("Invalid regex pattern");

    /// Contents of the action span
    static ref ACTION_REGEX: Regex =
        Regex::new(r#"<span class="market_activity_action">([^<]+)</span>"#)
            .expect("Invalid regex pattern");
}

/// Parse one activity line.
///
/// The first price cell that parses supplies price and currency. Missing
/// parts are left as `None`; the raw HTML is always kept.
pub fn parse_activity_html(html: &str, timestamp: Option<DateTime<Utc>>) -> ActivityEntry {
    let (price, currency) = PRICE_CELL_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|text| !text.is_empty())
        .map(parse_price_and_currency)
        .find(|(price, _)| price.is_some())
        .unwrap_or((None, None));

    let action = ACTION_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    ActivityEntry {
        price,
        currency: currency.map(str::to_string),
        action,
        timestamp,
        raw_html: html.to_string(),
    }
}

/// Parse every line of an activity response.
///
/// Returns nothing for a response that reported failure. All entries share
/// the response timestamp.
pub fn parse_activity_response(response: &OrdersActivity) -> Vec<ActivityEntry> {
    if !response.success {
        return Vec::new();
    }

    let timestamp = DateTime::from_timestamp(response.timestamp, 0);
    response
        .activity
        .iter()
        .map(|line| parse_activity_html(line, timestamp))
        .collect()
}
