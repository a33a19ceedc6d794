//! The daily report run.
//!
//! A run is planned from the CLI and config, then executed in two steps:
//! [`prepare`] reads the orders, aggregates them and renders the chart;
//! [`publish`] stores the artifacts and sends the notification. Dry runs
//! stop after the first step.

use crate::analysis::aggregate;
use crate::chart::{render_hourly_sales, ChartArtifact, ChartOptions};
use crate::cli::Args;
use crate::config::Config;
use crate::error::JobError;
use crate::models::{ReportDocument, RunSummary};
use crate::publish::{Notifier, ObjectStore, ReportPublisher};
use crate::source::{OrderSource, TimeWindow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::PathBuf;
use tracing::{debug, info};

pub const SUCCESS_MESSAGE: &str = "Daily report generated successfully";

/// What a single run will do, resolved before any I/O happens.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub input: PathBuf,
    pub report_date: NaiveDate,
    /// `None` takes every record in the input.
    pub window: Option<TimeWindow>,
    /// `None` skips the chart.
    pub chart: Option<ChartOptions>,
    pub dry_run: bool,
}

impl JobPlan {
    /// Resolve the plan. `now` is the local clock, read once by the caller.
    pub fn resolve(args: &Args, config: &Config, now: NaiveDateTime) -> Result<Self, JobError> {
        config.validate().map_err(JobError::Config)?;

        let input = config.source.path.clone().ok_or_else(|| {
            JobError::Config(
                "no orders input; pass --input or set [source] path in the config file"
                    .to_string(),
            )
        })?;

        let report_date = args.report_date.unwrap_or_else(|| now.date());

        let window = if args.all_records {
            None
        } else {
            let end = args
                .window_end
                .or_else(|| args.report_date.map(|date| date.and_time(NaiveTime::MIN)))
                .unwrap_or(now);
            let window = TimeWindow::ending_at(end, config.source.window_hours).ok_or_else(|| {
                JobError::Config(format!(
                    "a {} hour window ending at {} is out of range",
                    config.source.window_hours, end
                ))
            })?;
            Some(window)
        };

        let chart = config
            .chart
            .enabled
            .then(|| ChartOptions::from(&config.chart));

        Ok(Self {
            input,
            report_date,
            window,
            chart,
            dry_run: args.dry_run,
        })
    }
}

/// The report and its charts, ready to publish.
#[derive(Debug, Clone)]
pub struct PreparedReport {
    pub report: ReportDocument,
    pub charts: Vec<ChartArtifact>,
}

/// Fetch the orders of the plan's window, aggregate them and render charts.
pub fn prepare<S: OrderSource>(source: &S, plan: &JobPlan) -> Result<PreparedReport, JobError> {
    let records = source.fetch(plan.window.as_ref())?;
    let report = aggregate(&records, plan.report_date)?;

    let charts = match plan.chart {
        Some(ref options) => render_hourly_sales(&records, options)?.into_iter().collect(),
        None => {
            debug!("Chart rendering disabled");
            Vec::new()
        }
    };

    info!(
        "Report for {}: {} orders, revenue {}, {} chart(s)",
        report.date,
        report.total_orders,
        report.total_revenue,
        charts.len()
    );

    Ok(PreparedReport { report, charts })
}

/// Store the prepared report and send the notification.
pub async fn publish<S: ObjectStore, N: Notifier>(
    publisher: &ReportPublisher<S, N>,
    prepared: &PreparedReport,
) -> Result<RunSummary, JobError> {
    let outcome = publisher
        .publish(&prepared.report, &prepared.charts)
        .await?;

    Ok(RunSummary {
        message: SUCCESS_MESSAGE.to_string(),
        date: prepared.report.date,
        order_count: prepared.report.total_orders,
        report_key: outcome.report_key,
        chart_keys: outcome.chart_keys,
        report_url: outcome.report_url,
    })
}
