//! Order analytics.
//!
//! This module provides the pure aggregation from order records to the report document.

pub mod aggregator;
pub mod hours;

pub use aggregator::{aggregate, AggregateError};
pub use hours::hourly_orders;
