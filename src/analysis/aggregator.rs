//! Order aggregation and report statistics.
//!
//! This module turns a day's order records into the report document:
//! totals, average order value, best-selling products and the hourly
//! order distribution.

use crate::analysis::hours::hourly_orders;
use crate::models::{HourBuckets, OrderRecord, ProductTotal, ReportDocument};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of entries in `top_products`.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// Decimal places kept for money values.
pub const MONEY_SCALE: u32 = 2;

/// Failure while aggregating orders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("revenue overflowed while adding order #{index}")]
    RevenueOverflow { index: usize },
    #[error("quantity overflowed for product {product_id:?}")]
    QuantityOverflow { product_id: String },
}

/// Round a money value to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Build the report document for `records`.
///
/// An empty input is a valid zero-order day, not an error. Errors only
/// come from arithmetic overflow on absurd inputs.
pub fn aggregate(
    records: &[OrderRecord],
    report_date: NaiveDate,
) -> Result<ReportDocument, AggregateError> {
    if records.is_empty() {
        return Ok(ReportDocument::empty(report_date));
    }

    let total_orders = records.len() as u64;
    let revenue = total_revenue(records)?;
    let average = revenue / Decimal::from(total_orders);

    let report = ReportDocument {
        date: report_date,
        total_orders,
        total_revenue: round_money(revenue),
        average_order_value: round_money(average),
        top_products: top_products(records, TOP_PRODUCTS_LIMIT)?,
        hourly_trends: hourly_order_counts(records),
    };

    debug!(
        orders = report.total_orders,
        products = report.top_products.len(),
        best_seller = ?report.top_products.first().map(ProductTotal::product_id),
        "Aggregated orders"
    );

    Ok(report)
}

/// Unrounded sum of all order amounts.
pub fn total_revenue(records: &[OrderRecord]) -> Result<Decimal, AggregateError> {
    records
        .iter()
        .enumerate()
        .try_fold(Decimal::ZERO, |total, (index, record)| {
            total
                .checked_add(record.amount)
                .ok_or(AggregateError::RevenueOverflow { index })
        })
}

/// Best-selling products by summed quantity, ties in first-seen order.
pub fn top_products(
    records: &[OrderRecord],
    limit: usize,
) -> Result<Vec<ProductTotal>, AggregateError> {
    let mut totals: Vec<ProductTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for item in records.iter().flat_map(|r| &r.items) {
        match positions.get(item.product_id.as_str()) {
            Some(&pos) => {
                let entry = &mut totals[pos];
                entry.1 = entry.1.checked_add(item.quantity).ok_or_else(|| {
                    AggregateError::QuantityOverflow {
                        product_id: item.product_id.clone(),
                    }
                })?;
            }
            None => {
                positions.insert(&item.product_id, totals.len());
                totals.push(ProductTotal(item.product_id.clone(), item.quantity));
            }
        }
    }

    // sort_by_key is stable, so equal quantities keep first-seen order
    totals.sort_by_key(|p| Reverse(p.quantity()));
    totals.truncate(limit);

    Ok(totals)
}

/// Number of orders per hour of day.
pub fn hourly_order_counts(records: &[OrderRecord]) -> HourBuckets<u64> {
    let mut counts = HourBuckets::default();
    for (hour, _) in hourly_orders(records) {
        *counts.get_mut(hour) += 1;
    }
    counts
}
