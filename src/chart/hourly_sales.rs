//! Hourly sales bar chart.
//!
//! Renders summed order revenue per hour of day as a PNG bar chart with
//! all 24 hours on the x-axis and dashed horizontal gridlines.

use super::glyphs::{draw_text, text_height, text_width};
use super::{ChartArtifact, ChartError, HOURLY_SALES_CHART};
use crate::analysis::hourly_orders;
use crate::models::{HourBuckets, OrderRecord, HOURS_PER_DAY};
use image::{ImageFormat, Rgb, RgbImage};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io::Cursor;
use tracing::debug;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([190, 190, 190]);
const TEXT: Rgb<u8> = Rgb([40, 40, 40]);

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 60;
const MARGIN_BOTTOM: u32 = 70;

/// Largest accepted canvas side in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

const GRID_DIVISIONS: u32 = 5;
const DASH: u32 = 6;
const LABEL_SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;

/// Chart canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl From<&crate::config::ChartConfig> for ChartOptions {
    fn from(config: &crate::config::ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// Pixel rectangle, half-open on the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    fn width(&self) -> u32 {
        self.right - self.left
    }

    fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Summed order amount per hour of day.
pub fn hourly_revenue(records: &[OrderRecord]) -> Result<HourBuckets<Decimal>, ChartError> {
    let mut buckets: HourBuckets<Decimal> = HourBuckets::default();
    for (hour, record) in hourly_orders(records) {
        let slot = buckets.get_mut(hour);
        *slot = slot
            .checked_add(record.amount)
            .ok_or(ChartError::RevenueOverflow { hour })?;
    }
    Ok(buckets)
}

/// Render the hourly sales chart.
///
/// Returns `Ok(None)` when there are no orders, so nothing is published.
pub fn render_hourly_sales(
    records: &[OrderRecord],
    options: &ChartOptions,
) -> Result<Option<ChartArtifact>, ChartError> {
    if records.is_empty() {
        debug!("No orders, skipping hourly sales chart");
        return Ok(None);
    }

    let buckets = hourly_revenue(records)?;
    let image = draw_chart(&buckets, options)?;
    let png = encode_png(&image)?;

    debug!(bytes = png.len(), "Rendered hourly sales chart");

    Ok(Some(ChartArtifact {
        name: HOURLY_SALES_CHART.to_string(),
        png,
    }))
}

/// Plot area inside the canvas margins.
pub(crate) fn plot_area(options: &ChartOptions) -> Result<Rect, ChartError> {
    let min_width = MARGIN_LEFT + MARGIN_RIGHT + HOURS_PER_DAY as u32 * 4;
    let min_height = MARGIN_TOP + MARGIN_BOTTOM + GRID_DIVISIONS * 10;

    if options.width > MAX_CANVAS_SIDE || options.height > MAX_CANVAS_SIDE {
        return Err(ChartError::CanvasTooLarge {
            width: options.width,
            height: options.height,
        });
    }

    if options.width < min_width || options.height < min_height {
        return Err(ChartError::CanvasTooSmall {
            width: options.width,
            height: options.height,
        });
    }

    Ok(Rect {
        left: MARGIN_LEFT,
        top: MARGIN_TOP,
        right: options.width - MARGIN_RIGHT,
        bottom: options.height - MARGIN_BOTTOM,
    })
}

/// Upper bound of the y-axis: the smallest 1/2/2.5/5 x 10^k at or above `max`.
pub(crate) fn axis_max(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(max.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|step| step * magnitude)
        .find(|candidate| *candidate >= max)
        .unwrap_or(10.0 * magnitude)
}

/// Horizontal extent of the slot for `hour`.
pub(crate) fn slot_span(plot: &Rect, hour: u32) -> (u32, u32) {
    let slot = f64::from(plot.width()) / HOURS_PER_DAY as f64;
    let start = plot.left + (slot * f64::from(hour)).round() as u32;
    let end = plot.left + (slot * f64::from(hour + 1)).round() as u32;
    (start, end)
}

/// Rectangle of the bar for `hour` with `value` on an axis topping out at `max`.
///
/// Zero and negative values produce an empty bar on the baseline.
pub(crate) fn bar_rect(plot: &Rect, hour: u32, value: f64, max: f64) -> Rect {
    let (slot_start, slot_end) = slot_span(plot, hour);
    let inset = (slot_end - slot_start) / 10;

    let height = if value > 0.0 {
        let scaled = (value / max * f64::from(plot.height())).round() as u32;
        scaled.clamp(1, plot.height())
    } else {
        0
    };

    Rect {
        left: slot_start + inset,
        top: plot.bottom - height,
        right: slot_end - inset,
        bottom: plot.bottom,
    }
}

fn draw_chart(buckets: &HourBuckets<Decimal>, options: &ChartOptions) -> Result<RgbImage, ChartError> {
    let plot = plot_area(options)?;
    let values: Vec<f64> = buckets
        .iter()
        .map(|(_, v)| v.to_f64().unwrap_or(0.0))
        .collect();
    let max = axis_max(values.iter().cloned().fold(0.0, f64::max));

    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);

    draw_gridlines(&mut image, &plot, max);

    for (hour, value) in values.iter().enumerate() {
        let bar = bar_rect(&plot, hour as u32, *value, max);
        fill_rect(&mut image, &bar, BAR);
    }

    draw_axes(&mut image, &plot);
    draw_hour_labels(&mut image, &plot);
    draw_titles(&mut image, &plot, options);

    Ok(image)
}

fn draw_gridlines(image: &mut RgbImage, plot: &Rect, max: f64) {
    let label_height = text_height(LABEL_SCALE);

    for step in 0..=GRID_DIVISIONS {
        let y = plot.bottom - 1 - plot.height() * step / GRID_DIVISIONS;
        if step > 0 {
            for x in plot.left..plot.right {
                if (x - plot.left) / DASH % 2 == 0 {
                    image.put_pixel(x, y, GRID);
                }
            }
        }

        let label = format_tick(max * f64::from(step) / f64::from(GRID_DIVISIONS));
        let x = i64::from(plot.left) - 10 - i64::from(text_width(&label, LABEL_SCALE));
        let y = i64::from(y) - i64::from(label_height / 2);
        draw_text(image, x, y, &label, LABEL_SCALE, TEXT);
    }
}

fn draw_axes(image: &mut RgbImage, plot: &Rect) {
    for x in plot.left..plot.right {
        image.put_pixel(x, plot.bottom - 1, AXIS);
    }
    for y in plot.top..plot.bottom {
        image.put_pixel(plot.left, y, AXIS);
    }
}

fn draw_hour_labels(image: &mut RgbImage, plot: &Rect) {
    for hour in 0..HOURS_PER_DAY as u32 {
        let (start, end) = slot_span(plot, hour);
        let center = (start + end) / 2;

        for y in plot.bottom..plot.bottom + 5 {
            image.put_pixel(center, y, AXIS);
        }

        let label = hour.to_string();
        let x = i64::from(center) - i64::from(text_width(&label, LABEL_SCALE) / 2);
        draw_text(image, x, i64::from(plot.bottom) + 10, &label, LABEL_SCALE, TEXT);
    }
}

fn draw_titles(image: &mut RgbImage, plot: &Rect, options: &ChartOptions) {
    let title = "HOURLY SALES TREND";
    let x = (options.width / 2).saturating_sub(text_width(title, TITLE_SCALE) / 2);
    draw_text(image, i64::from(x), 15, title, TITLE_SCALE, TEXT);

    let x_title = "HOUR OF DAY";
    let x = (plot.left + plot.width() / 2).saturating_sub(text_width(x_title, LABEL_SCALE) / 2);
    let y = plot.bottom + 10 + text_height(LABEL_SCALE) + 15;
    draw_text(image, i64::from(x), i64::from(y), x_title, LABEL_SCALE, TEXT);

    let y_title = "TOTAL SALES ($)";
    let y = plot.top.saturating_sub(text_height(LABEL_SCALE) + 10);
    draw_text(image, 10, i64::from(y), y_title, LABEL_SCALE, TEXT);
}

fn fill_rect(image: &mut RgbImage, rect: &Rect, color: Rgb<u8>) {
    for y in rect.top..rect.bottom.min(image.height()) {
        for x in rect.left..rect.right.min(image.width()) {
            image.put_pixel(x, y, color);
        }
    }
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ChartError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
