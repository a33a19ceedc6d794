//! Report document and notification text generation.
//!
//! This module serializes the report document and builds the plain-text
//! notification that points readers at the stored report.

use crate::models::{ProductTotal, ReportDocument};

/// Default subject prefix for notifications.
pub const DEFAULT_SUBJECT_PREFIX: &str = "Daily Sales Report";

/// Generate the pretty-printed JSON report document.
pub fn generate_json_report(report: &ReportDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Notification subject line, e.g. `Daily Sales Report - 2024-01-02`.
pub fn notification_subject(report: &ReportDocument, prefix: &str) -> String {
    format!("{} - {}", prefix, report.date.format("%Y-%m-%d"))
}

/// Generate the plain-text notification body.
pub fn notification_message(report: &ReportDocument, prefix: &str, report_url: &str) -> String {
    let mut message = String::new();

    message.push_str(&notification_subject(report, prefix));
    message.push_str("\n\n");

    message.push_str(&generate_totals_section(report));
    message.push_str(&generate_top_products_section(&report.top_products));

    message.push_str(&format!("View full report: {}\n", report_url));

    message
}

/// Generate the totals lines.
fn generate_totals_section(report: &ReportDocument) -> String {
    let mut section = String::new();

    section.push_str(&format!("Total Orders: {}\n", report.total_orders));
    section.push_str(&format!("Total Revenue: ${:.2}\n", report.total_revenue));
    section.push_str(&format!(
        "Average Order Value: ${:.2}\n",
        report.average_order_value
    ));
    section.push('\n');

    section
}

/// Generate the top products listing as indented JSON pairs.
fn generate_top_products_section(top_products: &[ProductTotal]) -> String {
    let mut section = String::new();

    section.push_str("Top Products:\n");
    let listing = serde_json::to_string_pretty(top_products).unwrap_or_else(|_| "[]".to_string());
    section.push_str(&listing);
    section.push_str("\n\n");

    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HourBuckets;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn create_test_report() -> ReportDocument {
        ReportDocument {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            total_orders: 2,
            total_revenue: dec!(30),
            average_order_value: dec!(15),
            top_products: vec![ProductTotal("B".into(), 5), ProductTotal("A".into(), 3)],
            hourly_trends: HourBuckets::default(),
        }
    }

    #[test]
    fn test_notification_subject() {
        let report = create_test_report();
        assert_eq!(
            notification_subject(&report, DEFAULT_SUBJECT_PREFIX),
            "Daily Sales Report - 2024-01-02"
        );
    }

    #[test]
    fn test_notification_message() {
        let report = create_test_report();
        let message = notification_message(
            &report,
            DEFAULT_SUBJECT_PREFIX,
            "https://reports.example.com/reports/daily/2024-01-02.json",
        );

        let expected = "Daily Sales Report - 2024-01-02\n\
\n\
Total Orders: 2\n\
Total Revenue: $30.00\n\
Average Order Value: $15.00\n\
\n\
Top Products:\n\
[\n  [\n    \"B\",\n    5\n  ],\n  [\n    \"A\",\n    3\n  ]\n]\n\
\n\
View full report: https://reports.example.com/reports/daily/2024-01-02.json\n";

        assert_eq!(message, expected);
    }

    #[test]
    fn test_notification_message_empty_day() {
        let report = ReportDocument::empty(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let message = notification_message(&report, DEFAULT_SUBJECT_PREFIX, "file:///tmp/r.json");

        assert!(message.contains("Total Orders: 0\n"));
        assert!(message.contains("Total Revenue: $0.00\n"));
        assert!(message.contains("Top Products:\n[]\n"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"date\": \"2024-01-02\""));
        assert!(json.contains("\"total_revenue\": 30.0"));
        assert!(json.contains("\"top_products\""));
        assert!(json.contains("\"hourly_trends\""));
        assert!(json.contains("\"23\": 0"));
    }
}
