//! Hour-of-day extraction from order timestamps.
//!
//! Both the aggregator and the chart renderer bucket orders by the local
//! hour written in the timestamp. Orders whose timestamp is missing or
//! cannot be parsed are left out of hourly buckets, with a typed reason.

use crate::models::OrderRecord;
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::borrow::Cow;
use tracing::debug;

/// Why an order was left out of the hourly buckets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("timestamp is missing")]
    Missing,
    #[error("timestamp {0:?} is not an ISO-8601 datetime")]
    Malformed(String),
}

const DATE_FORMAT: &str = "%Y-%m-%d";

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%H%M%S%.f", "%H%M"];

/// Hour of day (0-23) the order was placed in.
pub fn order_hour(record: &OrderRecord) -> Result<u32, SkipReason> {
    let raw = record.timestamp.as_deref().ok_or(SkipReason::Missing)?;
    local_hour(raw).ok_or_else(|| SkipReason::Malformed(raw.to_string()))
}

/// Parse an ISO-8601 timestamp and return its wall-clock hour.
///
/// Accepts the extended (`2024-01-01T05:30:00`) and basic
/// (`20240101T053000`) forms, `T` or a space between date and time, hour,
/// minute or second precision with an optional fraction, and an optional
/// `Z`/`+HH[:MM]` offset. The offset is not applied: the hour is the one
/// written in the timestamp. A bare date is midnight.
pub fn local_hour(raw: &str) -> Option<u32> {
    let text = normalize_separator(raw.trim());
    let (date, time) = match text.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (&*text, None),
    };

    parse_date(date)?;

    match time {
        None => Some(0),
        Some(time) => parse_hour(strip_offset(time)?),
    }
}

fn normalize_separator(text: &str) -> Cow<'_, str> {
    if text.len() > 10 && text.as_bytes()[10] == b' ' {
        Cow::Owned(format!("{}T{}", &text[..10], &text[11..]))
    } else {
        Cow::Borrowed(text)
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() == 8 && is_digits(text) {
        let number = |range: std::ops::Range<usize>| text[range].parse::<u32>().ok();
        let year = i32::try_from(number(0..4)?).ok()?;
        return NaiveDate::from_ymd_opt(year, number(4..6)?, number(6..8)?);
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn parse_hour(time: &str) -> Option<u32> {
    if time.len() == 2 && is_digits(time) {
        return time.parse::<u32>().ok().filter(|hour| *hour < 24);
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time, format).ok())
        .map(|t| t.hour())
}

/// Drop a trailing `Z`, `+HH`, `+HHMM` or `+HH:MM` offset. `None` if the offset is malformed.
fn strip_offset(time: &str) -> Option<&str> {
    if let Some(rest) = time.strip_suffix(|c| c == 'Z' || c == 'z') {
        return Some(rest);
    }

    let Some(sign) = time.find(|c| c == '+' || c == '-') else {
        return Some(time);
    };

    let offset = &time[sign + 1..];
    let well_formed = match offset.len() {
        2 | 4 => is_digits(offset),
        5 => offset.as_bytes()[2] == b':' && is_digits(&offset[..2]) && is_digits(&offset[3..]),
        _ => false,
    };
    well_formed.then_some(&time[..sign])
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Orders paired with their hour, skipping those without a usable timestamp.
pub fn hourly_orders(records: &[OrderRecord]) -> impl Iterator<Item = (u32, &OrderRecord)> + '_ {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match order_hour(record) {
            Ok(hour) => Some((hour, record)),
            Err(reason) => {
                debug!(index, %reason, "Order left out of hourly buckets");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order_at(timestamp: Option<&str>) -> OrderRecord {
        OrderRecord {
            amount: Decimal::ONE,
            timestamp: timestamp.map(String::from),
            items: Vec::new(),
        }
    }

    #[test]
    fn test_local_hour_formats() {
        assert_eq!(local_hour("2024-01-01T05:00:00"), Some(5));
        assert_eq!(local_hour("2024-01-01T05:30:12.123456"), Some(5));
        assert_eq!(local_hour("2024-01-01 17:45:00"), Some(17));
        assert_eq!(local_hour("2024-01-01T23:59"), Some(23));
        assert_eq!(local_hour("2024-01-01"), Some(0));
        assert_eq!(local_hour("  2024-01-01T08:00:00  "), Some(8));
        assert_eq!(local_hour("2024-01-01T05"), Some(5));
    }

    #[test]
    fn test_local_hour_basic_format() {
        assert_eq!(local_hour("20240101T050000"), Some(5));
        assert_eq!(local_hour("20240101T053012.75"), Some(5));
        assert_eq!(local_hour("20240101T1730"), Some(17));
        assert_eq!(local_hour("20240101T05"), Some(5));
        assert_eq!(local_hour("20240101"), Some(0));
    }

    #[test]
    fn test_offset_is_not_applied() {
        assert_eq!(local_hour("2024-01-01T05:00:00Z"), Some(5));
        assert_eq!(local_hour("2024-01-01T05:00:00+09:00"), Some(5));
        assert_eq!(local_hour("2024-01-01T22:15:00.5-0700"), Some(22));
        assert_eq!(local_hour("2024-01-01T05Z"), Some(5));
        assert_eq!(local_hour("2024-01-01T05+09:00"), Some(5));
        assert_eq!(local_hour("20240101T050000+0900"), Some(5));
        assert_eq!(local_hour("20240101T050000-07"), Some(5));
    }

    #[test]
    fn test_malformed_timestamps() {
        assert_eq!(local_hour("not a date"), None);
        assert_eq!(local_hour("2024-01-01T25:00:00"), None);
        assert_eq!(local_hour("2024-13-01T05:00:00"), None);
        assert_eq!(local_hour(""), None);
        assert_eq!(local_hour("1704085200"), None);
        assert_eq!(local_hour("2024-01-01T24"), None);
        assert_eq!(local_hour("20241301T050000"), None);
        assert_eq!(local_hour("2024-01-01T05:00:00+9"), None);
        assert_eq!(local_hour("2024-01-01T05:00:00+09:0x"), None);
    }

    #[test]
    fn test_order_hour_skip_reasons() {
        assert_eq!(order_hour(&order_at(Some("2024-01-01T09:10:00"))), Ok(9));
        assert_eq!(order_hour(&order_at(None)), Err(SkipReason::Missing));
        assert_eq!(
            order_hour(&order_at(Some("yesterday"))),
            Err(SkipReason::Malformed("yesterday".to_string()))
        );
    }

    #[test]
    fn test_hourly_orders_skips_unparseable() {
        let records = vec![
            order_at(Some("2024-01-01T01:00:00")),
            order_at(Some("garbage")),
            order_at(None),
            order_at(Some("2024-01-01T13:00:00")),
        ];

        let hours: Vec<u32> = hourly_orders(&records).map(|(hour, _)| hour).collect();
        assert_eq!(hours, vec![1, 13]);
    }
}
