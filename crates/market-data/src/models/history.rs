use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::parse::{parse_steam_datetime, parse_volume};

/// Volume as sent by the market: usually a string, occasionally a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVolume {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct RawHistoryTuple(String, f64, RawVolume);

/// One unparsed `[date, price, volume]` entry of a price history response.
///
/// Dates look like `"Jul 02 2014 01: +0"`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawHistoryTuple")]
pub struct RawHistoryPoint {
    pub date: String,
    pub price: f64,
    pub volume: String,
}

impl From<RawHistoryTuple> for RawHistoryPoint {
    fn from(RawHistoryTuple(date, price, volume): RawHistoryTuple) -> Self {
        let volume = match volume {
            RawVolume::Text(text) => text,
            RawVolume::Number(n) => n.to_string(),
        };
        Self {
            date,
            price,
            volume,
        }
    }
}

impl RawHistoryPoint {
    pub fn new(date: impl Into<String>, price: f64, volume: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            price,
            volume: volume.into(),
        }
    }

    /// The point's timestamp, or `None` when the date string is malformed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_steam_datetime(&self.date)
    }

    /// Parse into a typed point.
    ///
    /// Returns `None` if the date or price is unusable. An unparseable
    /// volume becomes 0.
    pub fn parse(&self) -> Option<HistoryPoint> {
        let timestamp = self.timestamp()?;
        let price = Decimal::try_from(self.price).ok()?;
        let volume = parse_volume(&self.volume).unwrap_or(0);
        Some(HistoryPoint {
            timestamp,
            price,
            volume,
        })
    }
}

/// A parsed hourly price history point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_from_array() {
        let raw: Vec<RawHistoryPoint> =
            serde_json::from_str(r#"[["Jul 02 2014 01: +0", 5.123, "435"], ["Jul 02 2014 02: +0", 4.5, 12]]"#)
                .unwrap();

        assert_eq!(raw[0], RawHistoryPoint::new("Jul 02 2014 01: +0", 5.123, "435"));
        assert_eq!(raw[1].volume, "12");
    }

    #[test]
    fn test_parse_point() {
        let point = RawHistoryPoint::new("Dec 25 2023 14: +0", 1.25, "1,234")
            .parse()
            .unwrap();

        assert_eq!(
            point.timestamp,
            Utc.with_ymd_and_hms(2023, 12, 25, 14, 0, 0).unwrap()
        );
        assert_eq!(point.price, dec!(1.25));
        assert_eq!(point.volume, 1234);
    }

    #[test]
    fn test_bad_volume_defaults_to_zero() {
        let point = RawHistoryPoint::new("Dec 25 2023 14: +0", 1.0, "n/a")
            .parse()
            .unwrap();
        assert_eq!(point.volume, 0);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(RawHistoryPoint::new("garbage", 1.0, "1").parse().is_none());
        assert!(RawHistoryPoint::new("Dec 25 2023 14: +0", f64::NAN, "1")
            .parse()
            .is_none());
    }
}
