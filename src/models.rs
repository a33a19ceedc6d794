//! Data models for the sales report job.
//!
//! This module contains the order records read from the orders source,
//! the report document produced by the aggregator, and the run summary
//! printed when the job finishes.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// Number of hour-of-day buckets.
pub const HOURS_PER_DAY: usize = 24;

/// Product identifier used when a line item has none.
pub const UNKNOWN_PRODUCT: &str = "unknown";

/// A single line item of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Product identifier (`"unknown"` when absent).
    pub product_id: String,
    /// Quantity sold (0 when absent or not an integer).
    pub quantity: i64,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Builds a line item from a loosely shaped JSON object.
    pub fn from_value(value: &Value) -> Self {
        let product_id = match value.get("product_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => UNKNOWN_PRODUCT.to_string(),
        };

        let quantity = value.get("quantity").map(coerce_quantity).unwrap_or(0);
        Self::new(product_id, quantity)
    }
}

/// One purchase event, with every field already coerced to a usable value.
///
/// Records are deserialized leniently: a bad `amount` becomes zero, a
/// non-string `timestamp` is kept as text so it is later reported as
/// malformed, and non-object entries in `items` are dropped. A record
/// never fails to deserialize because of its field shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Order amount in the store currency.
    pub amount: Decimal,
    /// ISO-8601 timestamp as stored, if any.
    pub timestamp: Option<String>,
    /// Line items in the order they were recorded.
    pub items: Vec<LineItem>,
}

impl OrderRecord {
    /// Creates an order record with a timestamp.
    #[cfg(test)]
    pub fn new(amount: Decimal, timestamp: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            amount,
            timestamp: Some(timestamp.into()),
            items,
        }
    }

    /// Builds an order record from a loosely shaped JSON value.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name);

        let timestamp = match field("timestamp") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        };

        let items = match field("items") {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .map(LineItem::from_value)
                .collect(),
            _ => Vec::new(),
        };

        Self {
            amount: field("amount").map(coerce_amount).unwrap_or(Decimal::ZERO),
            timestamp,
            items,
        }
    }
}

impl<'de> Deserialize<'de> for OrderRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Coerce a JSON amount (number or numeric string) to a decimal, 0 otherwise.
///
/// Numbers outside the decimal range also count as 0 and are logged.
pub fn coerce_amount(value: &Value) -> Decimal {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Decimal::ZERO,
    };

    parse_decimal(&text).unwrap_or_else(|| {
        if value.is_number() || text.parse::<f64>().is_ok_and(f64::is_finite) {
            debug!(amount = %text, "Amount out of decimal range, counted as 0");
        } else {
            debug!(amount = %text, "Amount is not numeric, counted as 0");
        }
        Decimal::ZERO
    })
}

/// Coerce a JSON quantity to an integer, 0 when absent, fractional or out of range.
pub fn coerce_quantity(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    parse_decimal(s)
                        .filter(|d| d.fract().is_zero())
                        .and_then(|d| d.to_i64())
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Fixed set of 24 hour-of-day buckets.
///
/// Serializes as a map keyed `"0"` through `"23"`, every key always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourBuckets<T>([T; HOURS_PER_DAY]);

impl<T: Default + Copy> Default for HourBuckets<T> {
    fn default() -> Self {
        Self([T::default(); HOURS_PER_DAY])
    }
}

impl<T> HourBuckets<T> {
    /// Value of the bucket for `hour` (0-23).
    pub fn get(&self, hour: u32) -> &T {
        &self.0[hour as usize % HOURS_PER_DAY]
    }

    /// Mutable bucket for `hour` (0-23).
    pub fn get_mut(&mut self, hour: u32) -> &mut T {
        &mut self.0[hour as usize % HOURS_PER_DAY]
    }

    /// Iterate `(hour, value)` pairs in hour order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.0.iter().enumerate().map(|(hour, v)| (hour as u32, v))
    }
}

impl<T: Serialize> Serialize for HourBuckets<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(HOURS_PER_DAY))?;
        for (hour, value) in self.iter() {
            map.serialize_entry(&hour.to_string(), value)?;
        }
        map.end()
    }
}

/// Total quantity sold for one product.
///
/// Serialized as a `[product_id, quantity]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTotal(pub String, pub i64);

impl ProductTotal {
    pub fn product_id(&self) -> &str {
        &self.0
    }

    pub fn quantity(&self) -> i64 {
        self.1
    }
}

/// The daily analytics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    /// Date the report is generated for.
    pub date: NaiveDate,
    /// Number of orders in the input.
    pub total_orders: u64,
    /// Sum of all order amounts, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    /// Unrounded revenue divided by order count, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    /// Up to five best-selling products by quantity.
    pub top_products: Vec<ProductTotal>,
    /// Order count per hour of day.
    pub hourly_trends: HourBuckets<u64>,
}

impl ReportDocument {
    /// The report for a day without orders.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_orders: 0,
            total_revenue: Decimal::ZERO,
            average_order_value: Decimal::ZERO,
            top_products: Vec::new(),
            hourly_trends: HourBuckets::default(),
        }
    }
}

/// Outcome of a job run, printed as JSON on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub message: String,
    pub date: NaiveDate,
    pub order_count: u64,
    pub report_key: String,
    pub chart_keys: Vec<String>,
    pub report_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_order_from_value() {
        let order: OrderRecord = serde_json::from_value(json!({
            "order_id": "o-1",
            "amount": 12.5,
            "timestamp": "2024-01-01T05:00:00",
            "items": [{"product_id": "A", "quantity": 2}]
        }))
        .unwrap();

        assert_eq!(order.amount, dec!(12.5));
        assert_eq!(order.timestamp.as_deref(), Some("2024-01-01T05:00:00"));
        assert_eq!(order.items, vec![LineItem::new("A", 2)]);
    }

    #[test]
    fn test_order_defaults() {
        let order = OrderRecord::from_value(&json!({
            "items": [{"quantity": 3}, {"product_id": "B"}, "garbage"]
        }));

        assert_eq!(order.amount, Decimal::ZERO);
        assert_eq!(order.timestamp, None);
        assert_eq!(
            order.items,
            vec![LineItem::new(UNKNOWN_PRODUCT, 3), LineItem::new("B", 0)]
        );
    }

    #[test]
    fn test_non_object_order_is_empty() {
        let order = OrderRecord::from_value(&json!(42));
        assert_eq!(order.amount, Decimal::ZERO);
        assert!(order.timestamp.is_none());
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_non_string_timestamp_is_kept_as_text() {
        let order = OrderRecord::from_value(&json!({"timestamp": 1704085200}));
        assert_eq!(order.timestamp.as_deref(), Some("1704085200"));
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&json!(10)), dec!(10));
        assert_eq!(coerce_amount(&json!(0.1)), dec!(0.1));
        assert_eq!(coerce_amount(&json!(" 19.99 ")), dec!(19.99));
        assert_eq!(coerce_amount(&json!("1.5e2")), dec!(150));
        assert_eq!(coerce_amount(&json!("$5")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(null)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!({"value": 3})), Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_amount_is_zero() {
        assert_eq!(coerce_amount(&json!(1e30)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!("-1e40")), Decimal::ZERO);

        let order = OrderRecord::from_value(&json!({"amount": 1e30, "items": []}));
        assert_eq!(order.amount, Decimal::ZERO);
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&json!(4)), 4);
        assert_eq!(coerce_quantity(&json!(4.0)), 4);
        assert_eq!(coerce_quantity(&json!("7")), 7);
        assert_eq!(coerce_quantity(&json!("7.0")), 7);
        assert_eq!(coerce_quantity(&json!(2.5)), 0);
        assert_eq!(coerce_quantity(&json!("two")), 0);
        assert_eq!(coerce_quantity(&json!(true)), 0);
    }

    #[test]
    fn test_numeric_product_id() {
        let item = LineItem::from_value(&json!({"product_id": 1001, "quantity": 1}));
        assert_eq!(item.product_id, "1001");
    }

    #[test]
    fn test_hour_buckets_serialize_all_hours() {
        let mut buckets: HourBuckets<u64> = HourBuckets::default();
        *buckets.get_mut(5) += 2;

        let value = serde_json::to_value(&buckets).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), HOURS_PER_DAY);
        assert_eq!(map["5"], json!(2));
        assert_eq!(map["23"], json!(0));
    }

    #[test]
    fn test_empty_report_serialization() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let value = serde_json::to_value(ReportDocument::empty(date)).unwrap();

        assert_eq!(value["date"], json!("2024-01-02"));
        assert_eq!(value["total_orders"], json!(0));
        assert_eq!(value["total_revenue"], json!(0.0));
        assert_eq!(value["average_order_value"], json!(0.0));
        assert_eq!(value["top_products"], json!([]));
        assert_eq!(value["hourly_trends"].as_object().unwrap().len(), 24);
    }
}
